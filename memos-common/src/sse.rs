//! Server-Sent Events (SSE) utilities
//!
//! Encodes [`JobEvent`]s as SSE frames: `event:` is the event kind, `id:` is the
//! per-job sequence number and `data:` is the JSON-serialized event.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;

use crate::events::JobEvent;

/// Interval between keep-alive comments on idle streams
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Encode one job event as an SSE frame
pub fn job_event_frame(event: &JobEvent) -> Event {
    let frame = Event::default()
        .event(event.kind.as_str())
        .id(event.seq.to_string());

    match serde_json::to_string(event) {
        Ok(json) => frame.data(json),
        Err(e) => {
            warn!(seq = event.seq, error = %e, "SSE: Failed to serialize job event");
            frame.data("{}")
        }
    }
}

/// Keep-alive policy shared by all event streams
pub fn keep_alive() -> KeepAlive {
    KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat")
}

/// Wrap a stream of job events into an SSE response body
pub fn job_event_sse<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = JobEvent> + Send + 'static,
{
    Sse::new(events.map(|event| Ok(job_event_frame(&event)))).keep_alive(keep_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_sse_response_content_type() {
        let events = futures::stream::iter(vec![JobEvent::stamp(1, Notification::log("hello"))]);
        let response = job_event_sse(events).into_response();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/event-stream"));
    }
}
