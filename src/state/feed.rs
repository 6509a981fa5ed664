//! Live pass feed
//!
//! Pass events are fanned out to teacher dashboards over a bounded
//! broadcast channel. A subscriber that falls more than `capacity` events
//! behind loses the oldest ones and receives [`FeedMessage::Resync`] so it
//! knows to refetch the open pass list.

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::PassSession;

/// Something that happened to a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PassEvent {
    Started { session: PassSession },
    Ended { session: PassSession },
    TimeWarning { session_id: Uuid, student_name: String, elapsed_seconds: i64 },
    Overtime { session_id: Uuid, student_name: String, elapsed_seconds: i64 },
    AutoClosed { session: PassSession },
}

impl PassEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            PassEvent::Started { .. } => "started",
            PassEvent::Ended { .. } => "ended",
            PassEvent::TimeWarning { .. } => "time_warning",
            PassEvent::Overtime { .. } => "overtime",
            PassEvent::AutoClosed { .. } => "auto_closed",
        }
    }
}

/// What a feed subscriber receives
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Event(PassEvent),
    /// `missed` events were dropped; refetch state
    Resync { missed: u64 },
}

#[derive(Debug, Clone)]
pub struct PassFeed {
    sender: broadcast::Sender<PassEvent>,
}

impl PassFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers; with none listening the event is dropped
    pub fn publish(&self, event: PassEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Published pass event"),
            Err(_) => debug!(event = name, "No feed subscribers"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PassEvent> {
        self.sender.subscribe()
    }

    /// Subscribe as a stream that reports lag instead of failing
    pub fn stream(&self) -> impl Stream<Item = FeedMessage> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => yield FeedMessage::Event(event),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Feed subscriber lagged");
                        yield FeedMessage::Resync { missed };
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn warning(n: i64) -> PassEvent {
        PassEvent::TimeWarning {
            session_id: Uuid::nil(),
            student_name: "Ava".to_string(),
            elapsed_seconds: n,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let feed = PassFeed::new(8);
        let stream = feed.stream();
        tokio::pin!(stream);
        feed.publish(warning(1));
        feed.publish(warning(2));

        assert_eq!(stream.next().await, Some(FeedMessage::Event(warning(1))));
        assert_eq!(stream.next().await, Some(FeedMessage::Event(warning(2))));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let feed = PassFeed::new(2);
        let stream = feed.stream();
        tokio::pin!(stream);
        for n in 1..=5 {
            feed.publish(warning(n));
        }

        assert_eq!(stream.next().await, Some(FeedMessage::Resync { missed: 3 }));
        assert_eq!(stream.next().await, Some(FeedMessage::Event(warning(4))));
        assert_eq!(stream.next().await, Some(FeedMessage::Event(warning(5))));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let feed = PassFeed::new(4);
        feed.publish(warning(1));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(warning(480)).unwrap();
        assert_eq!(json["type"], "time_warning");
        assert_eq!(json["elapsed_seconds"], 480);
    }
}
