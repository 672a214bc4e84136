//! Staged upload value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque handle naming one staged upload
pub type UploadHandle = Uuid;

/// Kind of export an upload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Flomo HTML export folder (entry HTML plus referenced resources)
    Flomo,
    /// Single WeChat Reading `.txt` file
    Weixin,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Flomo => "flomo",
            UploadKind::Weixin => "weixin",
        }
    }

    /// Whether an upload of this kind must contain exactly one file
    pub fn requires_single_file(&self) -> bool {
        matches!(self, UploadKind::Weixin)
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "flomo" => Ok(UploadKind::Flomo),
            "weixin" => Ok(UploadKind::Weixin),
            other => Err(other.to_string()),
        }
    }
}

/// Response body for a committed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: UploadHandle,
    pub kind: UploadKind,
    /// Relative path of the entry file as uploaded
    pub original_name: String,
    pub file_count: usize,
    /// Total bytes across all files
    pub size: u64,
}
