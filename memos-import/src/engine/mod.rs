//! Import and delete engines
//!
//! An engine does the actual work of a job: parse the input, talk to the
//! remote notes service, persist artifacts. It reports progress through a
//! synchronous `emit` callback and returns a [`RunSummary`] or an
//! [`EngineError`]. The job runner owns status transitions and the terminal
//! event; engines never emit `finished` or `error` themselves.

pub mod artifacts;
pub mod delete;
pub mod flomo;
pub mod weixin;

use async_trait::async_trait;
use memos_common::Notification;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::client::{ClientError, NotesApi};
use crate::models::JobKind;

pub use artifacts::ArtifactStore;
pub use delete::DeleteImported;
pub use flomo::FlomoImport;
pub use weixin::WeixinImport;

/// Progress callback handed to engines
pub type Emit<'a> = &'a (dyn Fn(Notification) + Send + Sync);

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact file not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Artifact I/O failed on {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {path} is not valid JSON: {source}")]
    ArtifactFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot resolve memo name from response")]
    MissingNoteName,

    #[error("Remote request failed: {0}")]
    Client(#[from] ClientError),

    #[error("Job input is missing")]
    MissingInput,
}

impl EngineError {
    /// Full cause chain, outermost first
    pub fn detail(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        chain.join(": caused by: ")
    }
}

/// Outcome of a completed engine run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_ids_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_json_path: Option<PathBuf>,
}

/// A unit of import or delete work
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short label used in logs and the terminal event message
    fn name(&self) -> &'static str;

    /// Run to completion
    ///
    /// # Arguments
    /// * `emit` - Progress callback; each call becomes one job event
    ///
    /// # Returns
    /// * `Ok(RunSummary)` - Counts and artifact paths for the job result
    /// * `Err(EngineError)` - The job fails with this error
    async fn run(&self, emit: Emit<'_>) -> Result<RunSummary, EngineError>;
}

/// Build the engine for a job kind
///
/// `input` is the entry file for import kinds and ignored for delete.
pub fn build_engine(
    kind: JobKind,
    input: Option<PathBuf>,
    client: Arc<dyn NotesApi>,
    artifacts: ArtifactStore,
) -> Result<Box<dyn Engine>, EngineError> {
    let engine: Box<dyn Engine> = match kind {
        JobKind::Flomo => Box::new(FlomoImport::new(
            input.ok_or(EngineError::MissingInput)?,
            client,
            artifacts,
        )),
        JobKind::Weixin => Box::new(WeixinImport::new(
            input.ok_or(EngineError::MissingInput)?,
            client,
            artifacts,
        )),
        JobKind::Delete => Box::new(DeleteImported::new(client, artifacts)),
    };
    Ok(engine)
}
