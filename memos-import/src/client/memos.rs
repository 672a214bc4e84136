//! HTTP client for a Memos server
//!
//! The API root is derived from the session's `openApi` URL: its origin plus
//! `/api/v2` when the URL mentions `/v2`, otherwise `/api/v1`. Every request
//! carries the access token as a bearer credential.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ClientError, ClientFactory, NotesApi};
use crate::models::Session;

const USER_AGENT: &str = concat!("memos-import/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Memos REST client bound to one server and token
pub struct MemosClient {
    http: reqwest::Client,
    api_root: String,
    access_token: String,
    send_delay: Duration,
}

impl MemosClient {
    /// Build a client for a session
    ///
    /// `send_delay` is slept after each note creation to throttle bulk imports.
    pub fn new(session: &Session, send_delay: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_root: api_root(&session.open_api)?,
            access_token: session.access_token.clone(),
            send_delay,
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}/{}", self.api_root, path.trim_start_matches('/'));
        debug!(method = %method, url = %url, "Memos request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl NotesApi for MemosClient {
    async fn upload_resource(&self, path: &Path) -> Result<Value, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut body = json!({
            "content": BASE64.encode(&bytes),
            "filename": filename,
        });
        if let Some(mime) = mime_guess::from_path(path).first() {
            body["type"] = Value::String(mime.essence_str().to_string());
        }

        let response = self.send(Method::POST, "resources", Some(body)).await?;
        Ok(response.json().await?)
    }

    async fn create_note(&self, content: &str) -> Result<Value, ClientError> {
        let response = self
            .send(Method::POST, "memos", Some(json!({ "content": content })))
            .await?;
        let created: Value = response.json().await?;

        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        Ok(created)
    }

    async fn update_create_time(&self, name: &str, create_time: &str) -> Result<(), ClientError> {
        self.send(
            Method::PATCH,
            name,
            Some(json!({ "createTime": create_time })),
        )
        .await?;
        Ok(())
    }

    async fn set_resources(&self, name: &str, resources: &[Value]) -> Result<(), ClientError> {
        self.send(
            Method::PATCH,
            &format!("{}/resources", name),
            Some(json!({ "resources": resources })),
        )
        .await?;
        Ok(())
    }

    async fn delete_note(&self, name: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, name, None).await?;
        Ok(())
    }
}

/// Derive the versioned API root from any URL on the server
pub fn api_root(open_api: &str) -> Result<String, ClientError> {
    let url = Url::parse(open_api.trim())
        .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", open_api, e)))?;
    if url.host_str().is_none() {
        return Err(ClientError::InvalidEndpoint(open_api.to_string()));
    }

    let origin = url.origin().ascii_serialization();
    let version = if open_api.contains("/v2") { "v2" } else { "v1" };
    Ok(format!("{}/api/{}", origin, version))
}

/// Builds [`MemosClient`]s with a shared send delay
pub struct MemosClientFactory {
    send_delay: Duration,
}

impl MemosClientFactory {
    pub fn new(send_delay: Duration) -> Self {
        Self { send_delay }
    }
}

impl ClientFactory for MemosClientFactory {
    fn connect(&self, session: &Session) -> Result<Arc<dyn NotesApi>, ClientError> {
        Ok(Arc::new(MemosClient::new(session, self.send_delay)?))
    }
}
