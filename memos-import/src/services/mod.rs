//! Control-plane services: upload staging, job admission, event fan-out and
//! background execution

pub mod event_broadcaster;
pub mod job_registry;
pub mod job_runner;
pub mod upload_rules;
pub mod upload_staging;

pub use event_broadcaster::{EventBroadcaster, LiveEvents, Subscription};
pub use job_registry::{AdmitError, Job, JobRegistry};
pub use job_runner::JobRunner;
pub use upload_staging::{StagedUpload, StagingError, StagingLimits, StagingSession, UploadStaging};
