//! HTTP API handlers for memos-import

pub mod events;
pub mod health;
pub mod jobs;
pub mod session;
pub mod uploads;

pub use events::job_event_stream;
pub use health::health_routes;
pub use jobs::job_routes;
pub use session::session_routes;
pub use uploads::upload_routes;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// Parse a JSON request body, treating an empty body as the default value
pub(crate) fn parse_json_body<T>(body: &Bytes) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Request body is not valid JSON: {}", e)))
}
