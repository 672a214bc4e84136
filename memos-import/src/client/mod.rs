//! Remote notes-service client
//!
//! Engines talk to the remote service only through [`NotesApi`], so tests can
//! substitute an in-memory fake. [`ClientFactory`] turns the saved session into
//! a client when a job starts.

pub mod memos;

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::models::Session;

pub use memos::{MemosClient, MemosClientFactory};

/// Remote client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid openApi endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cannot read resource file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Operations the import engines need from the remote notes service
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// Upload a local file as a resource; returns the service's resource object
    async fn upload_resource(&self, path: &Path) -> Result<Value, ClientError>;

    /// Create a note; returns the service's response body
    async fn create_note(&self, content: &str) -> Result<Value, ClientError>;

    /// Backdate a note's creation time (RFC 3339)
    async fn update_create_time(&self, name: &str, create_time: &str) -> Result<(), ClientError>;

    /// Attach previously uploaded resources to a note
    async fn set_resources(&self, name: &str, resources: &[Value]) -> Result<(), ClientError>;

    async fn delete_note(&self, name: &str) -> Result<(), ClientError>;
}

/// Builds a client for the saved session
pub trait ClientFactory: Send + Sync {
    fn connect(&self, session: &Session) -> Result<Arc<dyn NotesApi>, ClientError>;
}

/// Pull the note name out of a create response
///
/// Accepts both `{ "name": .. }` and `{ "data": { "name": .. } }` shapes.
pub fn extract_note_name(response: &Value) -> Option<String> {
    response
        .get("name")
        .or_else(|| response.get("data").and_then(|d| d.get("name")))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_note_name_shapes() {
        assert_eq!(
            extract_note_name(&json!({ "name": "memos/1" })).as_deref(),
            Some("memos/1")
        );
        assert_eq!(
            extract_note_name(&json!({ "data": { "name": "memos/2" } })).as_deref(),
            Some("memos/2")
        );
        assert_eq!(extract_note_name(&json!({ "id": 3 })), None);
        assert_eq!(extract_note_name(&json!({ "name": "" })), None);
    }
}
