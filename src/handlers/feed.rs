//! Live pass feed over Server-Sent Events
//!
//! Each pass event is sent as an SSE event named after its kind with the
//! event as JSON data. A `resync` event carries the number of dropped
//! events; clients refetch the open pass list when they see it.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tracing::{debug, error};

use crate::middleware::TeacherContext;
use crate::state::FeedMessage;

use super::AppState;

pub async fn pass_feed(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(teacher = %teacher.email, "Feed subscriber connected");
    let mut shutdown = state.shutdown_receiver();
    let stop = async move {
        let _ = shutdown.wait_for(|closed| *closed).await;
    };
    let stream = state
        .services
        .feed
        .stream()
        .map(|message| Ok(to_event(message)))
        .take_until(stop);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn to_event(message: FeedMessage) -> Event {
    match message {
        FeedMessage::Event(event) => match Event::default().event(event.name()).json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                error!(error = %e, "Failed to encode feed event");
                Event::default().event("resync").data("0")
            }
        },
        FeedMessage::Resync { missed } => Event::default().event("resync").data(missed.to_string()),
    }
}
