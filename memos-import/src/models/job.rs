//! Import job value types
//!
//! A job moves through exactly one transition: `running` to either `finished`
//! or `failed`. Terminal states never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::upload::UploadKind;

/// Job identifier
pub type JobId = Uuid;

/// Kind of import engine a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Flomo HTML export
    Flomo,
    /// WeChat Reading plain-text highlights
    Weixin,
    /// Delete every note recorded by the last import
    Delete,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Flomo => "flomo",
            JobKind::Weixin => "weixin",
            JobKind::Delete => "delete",
        }
    }

    /// Upload kind this job consumes, if it reads an input file at all
    pub fn upload_kind(&self) -> Option<UploadKind> {
        match self {
            JobKind::Flomo => Some(UploadKind::Flomo),
            JobKind::Weixin => Some(UploadKind::Weixin),
            JobKind::Delete => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested job kind is not one of the known engines
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown job type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for JobKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flomo" => Ok(JobKind::Flomo),
            "weixin" => Ok(JobKind::Weixin),
            "delete" => Ok(JobKind::Delete),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Failure recorded on a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Short human-readable message
    pub message: String,

    /// Full cause chain, when one is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Point-in-time view of a job, as returned by the result endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub event_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}
