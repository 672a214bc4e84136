//! Multipart upload endpoint
//!
//! The form carries a `kind` text field and one file field per file, whose
//! filename is the file's path relative to the export root. Files are streamed
//! chunk by chunk into the staging area; any failure drops the staging session,
//! which deletes whatever was written.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::UploadReceipt;
use crate::services::StagingError;
use crate::AppState;

/// POST /api/uploads
pub async fn stage_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadReceipt>)> {
    let mut session = state.staging.begin().await?;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let file_name = field.file_name().map(str::to_string);
        match file_name {
            Some(name) => {
                let mut sink = session.begin_file(&name).await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    sink.write_chunk(&chunk).await?;
                }
                sink.finish().await?;
            }
            None if field.name() == Some("kind") => {
                let value = field.text().await.map_err(multipart_error)?;
                session.set_kind(&value)?;
            }
            None => {
                tracing::debug!(field = ?field.name(), "Ignoring unknown form field");
            }
        }
    }

    let receipt = session.finish().await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> StagingError {
    StagingError::Multipart(err.to_string())
}

/// Upload routes; the default body limit is replaced by the staging limits
pub fn upload_routes() -> Router<crate::AppState> {
    Router::new()
        .route("/api/uploads", post(stage_upload))
        .layer(DefaultBodyLimit::disable())
}
