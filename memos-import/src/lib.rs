//! memos-import library interface
//!
//! Local control plane for importing Flomo and WeChat Reading exports into a
//! Memos server: staged uploads, one job at a time, progress over SSE.

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod parsers;
pub mod services;

pub use crate::config::ServiceConfig;
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::ClientFactory;
use crate::models::Session;
use crate::services::{JobRegistry, JobRunner, StagingError, UploadStaging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    /// Remote endpoint and token; replaced wholesale by `POST /api/session`
    pub session: Arc<RwLock<Option<Session>>>,
    pub staging: Arc<UploadStaging>,
    pub registry: Arc<JobRegistry>,
    pub runner: JobRunner,
    pub clients: Arc<dyn ClientFactory>,
    /// Cancelled on shutdown; ends open event streams and the upload sweeper
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, clients: Arc<dyn ClientFactory>) -> Result<Self, StagingError> {
        let staging = Arc::new(UploadStaging::new(
            config.upload_root.clone(),
            config.staging_limits(),
        )?);
        let registry = Arc::new(JobRegistry::new());
        let runner = JobRunner::new(Arc::clone(&registry), Arc::clone(&staging));

        Ok(Self {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
            staging,
            registry,
            runner,
            clients,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api::session_routes())
        .merge(api::upload_routes())
        .merge(api::job_routes())
        .merge(api::health_routes());

    if let Some(web_root) = &state.config.web_root {
        info!(web_root = %web_root.display(), "Serving static UI");
        router = router.fallback_service(ServeDir::new(web_root));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
