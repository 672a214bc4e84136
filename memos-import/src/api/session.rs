//! Remote session endpoint

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::parse_json_body;
use crate::error::{ApiError, ApiResult};
use crate::models::Session;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest {
    #[serde(default)]
    open_api: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// POST /api/session
///
/// Replace the saved remote endpoint and token. Jobs started later use it.
pub async fn save_session(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let request: SessionRequest = parse_json_body(&body)?;
    let session = Session {
        open_api: request.open_api.unwrap_or_default().trim().to_string(),
        access_token: request.access_token.unwrap_or_default().trim().to_string(),
    };
    session
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    info!(open_api = %session.open_api, "Session saved");
    *state.session.write().await = Some(session);

    Ok(Json(json!({ "ok": true })))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/session", post(save_session))
}
