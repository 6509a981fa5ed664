//! Teacher's Pet server
//!
//! Main application entry point

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use TeachersPet::{
    build_router,
    config::Settings,
    database::open_store,
    services::{AppServices, Scheduler},
    utils::{clock::SystemClock, logging},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading configuration")?;
    settings.validate().context("validating configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;
    info!("Starting {}...", TeachersPet::info());

    info!("Opening store...");
    let store = open_store(&settings.database).await.context("opening store")?;

    let services = AppServices::new(store, Arc::new(SystemClock), &settings)?;
    for issue in services.health_check().await.get_issues() {
        warn!(issue = %issue, "Startup health check");
    }
    let restored = services.passes.restore_active_passes().await?;
    if restored > 0 {
        info!(restored, "Resumed monitoring of open passes");
    }

    let scheduler = Scheduler::start(services.clone(), &settings);
    info!(jobs = scheduler.job_count(), "Scheduler started");
    let state = AppState::new(services);
    let app = build_router(state.clone());

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!(address = %address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("serving HTTP")?;

    scheduler.shutdown().await;
    info!("Teacher's Pet has been shut down.");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    state.close_streams();
}
