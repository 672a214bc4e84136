//! Data models for the import control plane

pub mod job;
pub mod session;
pub mod upload;

pub use job::{JobError, JobId, JobKind, JobSnapshot, JobStatus, UnknownKind};
pub use session::Session;
pub use upload::{UploadHandle, UploadKind, UploadReceipt};
