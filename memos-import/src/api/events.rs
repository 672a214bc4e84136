//! Server-Sent Events (SSE) for job progress
//!
//! A new subscriber first receives every event already in the job's log, then
//! live events as they are appended. The stream stays open after the terminal
//! event until the client disconnects or the server shuts down; dropping it
//! detaches the subscriber.

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tracing::info;

use super::jobs::lookup_job;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/jobs/:id/events
pub async fn job_event_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let job = lookup_job(&state, &id)?;
    let live = job.events().live();

    info!(
        job_id = %job.id(),
        subscriber = live.id(),
        replayed = job.events().len(),
        "SSE client attached"
    );

    let shutdown = state.shutdown.clone();
    let events = live.take_until(async move { shutdown.cancelled().await });

    Ok(memos_common::sse::job_event_sse(events))
}
