//! Flomo export import
//!
//! Resources are uploaded first for every memo, then memos are sent oldest
//! first so the remote timeline keeps export order. Each created note is
//! backdated to the export time and linked to its resources.

use async_trait::async_trait;
use chrono::SecondsFormat;
use memos_common::Notification;
use serde::Serialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::{ArtifactStore, Emit, Engine, EngineError, RunSummary};
use crate::client::{extract_note_name, NotesApi};
use crate::parsers::{parse_flomo_html, FlomoNote};

/// Memo plus the remote resource objects uploaded for it
#[derive(Debug, Serialize)]
struct PreparedNote {
    #[serde(flatten)]
    note: FlomoNote,
    resources: Vec<Value>,
}

pub struct FlomoImport {
    entry: PathBuf,
    client: Arc<dyn NotesApi>,
    artifacts: ArtifactStore,
}

impl FlomoImport {
    pub fn new(entry: PathBuf, client: Arc<dyn NotesApi>, artifacts: ArtifactStore) -> Self {
        Self {
            entry,
            client,
            artifacts,
        }
    }

    async fn upload_resources(&self, note: &FlomoNote, emit: Emit<'_>) -> Result<Vec<Value>, EngineError> {
        let base = self.entry.parent().unwrap_or_else(|| Path::new("."));
        let mut resources = Vec::with_capacity(note.files.len());

        for file in &note.files {
            let Some(path) = resolve_resource(base, file) else {
                emit(Notification::log(format!(
                    "Resource path outside the export, skipped: {}",
                    file
                )));
                continue;
            };

            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                emit(Notification::log(format!(
                    "Resource file missing, skipped: {}",
                    file
                )));
                continue;
            }

            emit(Notification::log(format!("Uploading file: {}", file)));
            resources.push(self.client.upload_resource(&path).await?);
        }

        Ok(resources)
    }
}

#[async_trait]
impl Engine for FlomoImport {
    fn name(&self) -> &'static str {
        "Flomo import"
    }

    async fn run(&self, emit: Emit<'_>) -> Result<RunSummary, EngineError> {
        let notes_json_path = self.artifacts.notes_json_path();
        let sent_ids_path = self.artifacts.sent_ids_path();
        self.artifacts.clear(&notes_json_path).await?;
        self.artifacts.clear(&sent_ids_path).await?;

        let html = tokio::fs::read_to_string(&self.entry)
            .await
            .map_err(|source| EngineError::ReadInput {
                path: self.entry.clone(),
                source,
            })?;
        let notes = parse_flomo_html(&html);
        let total = notes.len();

        info!(entry = %self.entry.display(), total, "Flomo export parsed");
        emit(Notification::started("Flomo import started", total));
        emit(Notification::log("Uploading resources"));

        let mut prepared = Vec::with_capacity(total);
        for note in notes {
            let resources = self.upload_resources(&note, emit).await?;
            prepared.push(PreparedNote { note, resources });
        }
        self.artifacts.write_json(&notes_json_path, &prepared).await?;

        let mut sent: Vec<String> = Vec::with_capacity(total);
        for (index, item) in prepared.iter().rev().enumerate() {
            let current = index + 1;
            emit(Notification::progress(
                format!("Sending memo {}/{}", current, total),
                current,
                total,
            ));

            let response = self.client.create_note(&item.note.content).await?;
            let name = extract_note_name(&response).ok_or(EngineError::MissingNoteName)?;
            sent.push(name.clone());

            match item.note.created_at() {
                Some(created_at) => {
                    let stamp = created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
                    self.client.update_create_time(&name, &stamp).await?;
                }
                None => emit(Notification::log(format!(
                    "Unrecognized time '{}', kept server time for {}",
                    item.note.time, name
                ))),
            }
            self.client.set_resources(&name, &item.resources).await?;

            self.artifacts.write_json(&sent_ids_path, &sent).await?;
            debug!(note = %name, "Memo sent");
            emit(Notification::success(format!("Memo sent: {}", name)));
        }

        Ok(RunSummary {
            total,
            success: sent.len(),
            failed: 0,
            sent_ids_path: Some(sent_ids_path),
            notes_json_path: Some(notes_json_path),
        })
    }
}

/// Resolve a resource reference against the export directory
///
/// Absolute references and references climbing out of `base` yield `None`.
fn resolve_resource(base: &Path, reference: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(reference).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(base.join(relative))
    }
}
