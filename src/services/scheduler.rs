//! Background jobs
//!
//! Interval loops for the scheduled-message sweep, the auto-close sweep and
//! rate limiter pruning.
//! A failed iteration is logged and the loop keeps going; every loop exits
//! when the shutdown channel flips.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::utils::errors::{Result, TeachersPetError};

use super::AppServices;

/// How often idle rate limiter keys are pruned
pub const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Handles to the running job loops
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the loops enabled in `settings`
    pub fn start(services: AppServices, settings: &Settings) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::new();

        if !settings.scheduler.enabled {
            info!("Scheduler disabled");
            return Self { shutdown, tasks };
        }

        if settings.features.scheduled_messages {
            let messaging = services.messaging.clone();
            tasks.push(spawn_loop(
                "message_sweep",
                Duration::from_secs(settings.scheduler.message_sweep_interval_seconds),
                shutdown.subscribe(),
                move || {
                    let messaging = messaging.clone();
                    async move {
                        let summary = messaging.sweep().await?;
                        debug!(processed = summary.processed, "Message sweep tick");
                        Ok::<(), TeachersPetError>(())
                    }
                },
            ));
        }

        if settings.features.auto_close {
            let passes = services.passes.clone();
            tasks.push(spawn_loop(
                "auto_close",
                Duration::from_secs(settings.scheduler.auto_close_interval_seconds),
                shutdown.subscribe(),
                move || {
                    let passes = passes.clone();
                    async move {
                        let closed = passes.auto_close_stale().await?;
                        debug!(closed = closed.len(), "Auto-close tick");
                        Ok::<(), TeachersPetError>(())
                    }
                },
            ));
        }

        let auth = services.auth.clone();
        tasks.push(spawn_loop(
            "limiter_cleanup",
            LIMITER_CLEANUP_INTERVAL,
            shutdown.subscribe(),
            move || {
                let auth = auth.clone();
                async move {
                    auth.cleanup_limiters();
                    Ok::<(), TeachersPetError>(())
                }
            },
        ));

        info!(jobs = tasks.len(), "Scheduler started");
        Self { shutdown, tasks }
    }

    pub fn job_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every loop to stop and wait for them
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Scheduler task panicked");
            }
        }
        info!("Scheduler stopped");
    }
}

fn spawn_loop<F, Fut>(name: &'static str, every: Duration, mut shutdown: watch::Receiver<bool>, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match job().await {
                        Ok(()) => {}
                        Err(e) if e.is_recoverable() => {
                            warn!(job = name, error = %e, "Scheduled job failed, retrying next tick");
                        }
                        Err(e) => error!(job = name, error = %e, "Scheduled job failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(job = name, "Job loop stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::database::MemoryStore;
    use crate::utils::clock::SystemClock;

    fn services(settings: &Settings) -> AppServices {
        AppServices::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), settings).unwrap()
    }

    #[tokio::test]
    async fn test_limiter_cleanup_runs_without_feature_loops() {
        let mut settings = Settings::default();
        settings.scheduler.enabled = true;
        settings.features.scheduled_messages = false;
        settings.features.auto_close = false;

        let scheduler = Scheduler::start(services(&settings), &settings);
        assert_eq!(scheduler.job_count(), 1);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_scheduler_starts_nothing() {
        let mut settings = Settings::default();
        settings.scheduler.enabled = false;

        let scheduler = Scheduler::start(services(&settings), &settings);
        assert_eq!(scheduler.job_count(), 0);
        scheduler.shutdown().await;
    }
}
