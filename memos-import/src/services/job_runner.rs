//! Background execution of admitted jobs
//!
//! The runner drives one engine per job and owns everything that happens when
//! the engine returns: the status transition, the terminal event, releasing the
//! consumed upload and clearing the active-job marker. Cleanup runs on every
//! path, including an engine panic.

use futures::FutureExt;
use memos_common::Notification;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::job_registry::{Job, JobRegistry};
use super::upload_staging::UploadStaging;
use crate::engine::{Engine, RunSummary};
use crate::models::JobError;

/// Spawns engines and finalizes their jobs
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    staging: Arc<UploadStaging>,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>, staging: Arc<UploadStaging>) -> Self {
        Self { registry, staging }
    }

    /// Run a job on the tokio runtime
    pub fn spawn(&self, job: Arc<Job>, engine: Box<dyn Engine>) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(job, engine).await })
    }

    /// Run a job to completion on the current task
    pub async fn run(&self, job: Arc<Job>, engine: Box<dyn Engine>) {
        let job_id = job.id();
        info!(job_id = %job_id, kind = %job.kind(), engine = engine.name(), "Job started");

        let events = Arc::clone(job.events());
        let emit = move |notification: Notification| {
            events.append(notification);
        };

        let outcome = AssertUnwindSafe(engine.run(&emit)).catch_unwind().await;

        match outcome {
            Ok(Ok(summary)) => {
                let result = summary_value(&summary);
                job.finish(result.clone());
                job.events().append(Notification::finished(
                    format!("{} finished", engine.name()),
                    result,
                ));
                info!(
                    job_id = %job_id,
                    total = summary.total,
                    success = summary.success,
                    "Job finished"
                );
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                job.fail(JobError::new(message.clone()).with_detail(e.detail()));
                job.events().append(Notification::error(message));
                error!(job_id = %job_id, error = %e.detail(), "Job failed");
            }
            Err(panic) => {
                let message = format!("{} panicked: {}", engine.name(), panic_message(panic.as_ref()));
                job.fail(JobError::new(message.clone()));
                job.events().append(Notification::error(message.clone()));
                error!(job_id = %job_id, "{}", message);
            }
        }

        if let Some(handle) = job.upload() {
            self.staging.release(handle).await;
        }
        self.registry.release_active(job_id);
    }
}

fn summary_value(summary: &RunSummary) -> Value {
    serde_json::to_value(summary).unwrap_or_else(|_| {
        json!({
            "total": summary.total,
            "success": summary.success,
            "failed": summary.failed,
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
