//! Shared fixtures for memos-import integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use memos_import::client::{ClientError, ClientFactory, NotesApi};
use memos_import::config::{CliOverrides, ClientSettings, FileConfig};
use memos_import::models::{JobId, JobStatus, Session};
use memos_import::{AppState, ServiceConfig};

pub const BOUNDARY: &str = "memos-import-test-boundary";

/// One call observed by [`FakeNotesApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UploadResource(PathBuf),
    CreateNote(String),
    UpdateCreateTime(String, String),
    SetResources(String, usize),
    DeleteNote(String),
}

/// In-memory notes service; names notes `memos/1`, `memos/2`, ...
#[derive(Default)]
pub struct FakeNotesApi {
    calls: Mutex<Vec<Call>>,
    next_note: AtomicUsize,
    next_resource: AtomicUsize,
}

impl FakeNotesApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_contents(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateNote(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl NotesApi for FakeNotesApi {
    async fn upload_resource(&self, path: &Path) -> Result<Value, ClientError> {
        self.record(Call::UploadResource(path.to_path_buf()));
        let n = self.next_resource.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({ "name": format!("resources/{}", n) }))
    }

    async fn create_note(&self, content: &str) -> Result<Value, ClientError> {
        self.record(Call::CreateNote(content.to_string()));
        let n = self.next_note.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({ "name": format!("memos/{}", n) }))
    }

    async fn update_create_time(&self, name: &str, create_time: &str) -> Result<(), ClientError> {
        self.record(Call::UpdateCreateTime(name.to_string(), create_time.to_string()));
        Ok(())
    }

    async fn set_resources(&self, name: &str, resources: &[Value]) -> Result<(), ClientError> {
        self.record(Call::SetResources(name.to_string(), resources.len()));
        Ok(())
    }

    async fn delete_note(&self, name: &str) -> Result<(), ClientError> {
        self.record(Call::DeleteNote(name.to_string()));
        Ok(())
    }
}

/// Hands out the same fake for every session
pub struct FakeClientFactory {
    pub api: Arc<FakeNotesApi>,
}

impl ClientFactory for FakeClientFactory {
    fn connect(&self, _session: &Session) -> Result<Arc<dyn NotesApi>, ClientError> {
        Ok(self.api.clone())
    }
}

/// App state rooted in a temp dir, backed by a fresh [`FakeNotesApi`]
pub fn test_state(temp: &TempDir) -> (AppState, Arc<FakeNotesApi>) {
    test_state_with(temp, |_| {})
}

/// Like [`test_state`], with a hook to adjust the config first
pub fn test_state_with(
    temp: &TempDir,
    adjust: impl FnOnce(&mut ServiceConfig),
) -> (AppState, Arc<FakeNotesApi>) {
    let cli = CliOverrides {
        upload_root: Some(temp.path().join("uploads")),
        artifact_dir: Some(temp.path().join("artifacts")),
        ..CliOverrides::default()
    };
    let file = FileConfig {
        client: ClientSettings { send_delay_ms: 0 },
        ..FileConfig::default()
    };
    let mut config = ServiceConfig::resolve(cli, file);
    adjust(&mut config);

    let api = Arc::new(FakeNotesApi::default());
    let clients = Arc::new(FakeClientFactory { api: api.clone() });
    let state = AppState::new(config, clients).expect("Failed to create app state");
    (state, api)
}

pub async fn save_session(state: &AppState) {
    *state.session.write().await = Some(Session {
        open_api: "http://memos.test/api/v1/memos?openId=x".to_string(),
        access_token: "token".to_string(),
    });
}

/// A multipart form with a `kind` field and one file part per `(path, bytes)`
pub fn multipart_body(kind: Option<&str>, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(kind) = kind {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"kind\"\r\n\r\n{}\r\n",
                BOUNDARY, kind
            )
            .as_bytes(),
        );
    }
    for (path, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, path
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(kind: Option<&str>, files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(kind, files)))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll until the job is terminal and the runner has finished its cleanup
///
/// Clearing the active marker is the runner's last step.
pub async fn wait_for_terminal(state: &AppState, id: JobId) -> JobStatus {
    let poll = async {
        loop {
            let status = state.registry.get(id).expect("job is registered").status();
            if status.is_terminal() && state.registry.active_job() != Some(id) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .expect("job did not finish in time")
}

/// Number of entries directly under the upload root
pub fn staged_dir_count(state: &AppState) -> usize {
    std::fs::read_dir(state.staging.root())
        .map(|entries| entries.count())
        .unwrap_or(0)
}
