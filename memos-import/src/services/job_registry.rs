//! Job records and single-active-job admission
//!
//! At most one job runs at a time. Admission checks and sets the active marker
//! under one lock, so two concurrent start requests cannot both succeed.
//! Finished jobs stay queryable for the life of the process.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::event_broadcaster::EventBroadcaster;
use crate::models::{JobError, JobId, JobKind, JobSnapshot, JobStatus, UploadHandle};

/// Admission errors
#[derive(Debug, Error)]
pub enum AdmitError {
    #[error("Another job is already running: {active}")]
    AlreadyRunning { active: JobId },
}

#[derive(Debug)]
struct Outcome {
    status: JobStatus,
    result: Option<Value>,
    error: Option<JobError>,
}

/// One import or delete job
pub struct Job {
    id: JobId,
    kind: JobKind,
    created_at: DateTime<Utc>,
    upload: Option<UploadHandle>,
    outcome: RwLock<Outcome>,
    events: Arc<EventBroadcaster>,
}

impl Job {
    fn new(kind: JobKind, upload: Option<UploadHandle>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            created_at: Utc::now(),
            upload,
            outcome: RwLock::new(Outcome {
                status: JobStatus::Running,
                result: None,
                error: None,
            }),
            events: Arc::new(EventBroadcaster::new()),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Upload this job consumes, if any
    pub fn upload(&self) -> Option<UploadHandle> {
        self.upload
    }

    pub fn status(&self) -> JobStatus {
        self.read_outcome().status
    }

    pub fn events(&self) -> &Arc<EventBroadcaster> {
        &self.events
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let outcome = self.read_outcome();
        JobSnapshot {
            id: self.id,
            kind: self.kind,
            status: outcome.status,
            created_at: self.created_at,
            event_count: self.events.len(),
            result: outcome.result.clone(),
            error: outcome.error.clone(),
        }
    }

    /// Transition running -> finished; returns false if already terminal
    pub(crate) fn finish(&self, result: Value) -> bool {
        self.transition(JobStatus::Finished, Some(result), None)
    }

    /// Transition running -> failed; returns false if already terminal
    pub(crate) fn fail(&self, error: JobError) -> bool {
        self.transition(JobStatus::Failed, None, Some(error))
    }

    fn transition(&self, to: JobStatus, result: Option<Value>, error: Option<JobError>) -> bool {
        let mut outcome = self.outcome.write().unwrap_or_else(PoisonError::into_inner);
        if outcome.status.is_terminal() {
            warn!(
                job_id = %self.id,
                from = ?outcome.status,
                to = ?to,
                "Ignoring transition of a terminal job"
            );
            return false;
        }
        outcome.status = to;
        outcome.result = result;
        outcome.error = error;
        true
    }

    fn read_outcome(&self) -> std::sync::RwLockReadGuard<'_, Outcome> {
        self.outcome.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Table of all jobs plus the active-job marker
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
    active: Mutex<Option<JobId>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a running job and mark it active, unless another job is active
    pub fn admit(
        &self,
        kind: JobKind,
        upload: Option<UploadHandle>,
    ) -> Result<Arc<Job>, AdmitError> {
        let mut active = self.lock_active();
        if let Some(active) = *active {
            return Err(AdmitError::AlreadyRunning { active });
        }

        let job = Arc::new(Job::new(kind, upload));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id, Arc::clone(&job));
        *active = Some(job.id);

        info!(job_id = %job.id, kind = %kind, "Job admitted");
        Ok(job)
    }

    pub fn get(&self, id: JobId) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Currently running job, if any
    pub fn active_job(&self) -> Option<JobId> {
        *self.lock_active()
    }

    /// Clear the active marker if it still names `id`
    pub fn release_active(&self, id: JobId) -> bool {
        let mut active = self.lock_active();
        if *active == Some(id) {
            *active = None;
            true
        } else {
            false
        }
    }

    /// Undo an admission whose job never started
    pub fn discard(&self, id: JobId) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        self.release_active(id);
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<JobId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
