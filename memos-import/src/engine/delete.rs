//! Delete every note recorded by the last import

use async_trait::async_trait;
use memos_common::Notification;
use std::sync::Arc;
use tracing::info;

use super::{ArtifactStore, Emit, Engine, EngineError, RunSummary};
use crate::client::NotesApi;

pub struct DeleteImported {
    client: Arc<dyn NotesApi>,
    artifacts: ArtifactStore,
}

impl DeleteImported {
    pub fn new(client: Arc<dyn NotesApi>, artifacts: ArtifactStore) -> Self {
        Self { client, artifacts }
    }
}

#[async_trait]
impl Engine for DeleteImported {
    fn name(&self) -> &'static str {
        "Delete"
    }

    async fn run(&self, emit: Emit<'_>) -> Result<RunSummary, EngineError> {
        let names: Vec<String> = self
            .artifacts
            .read_json(&self.artifacts.sent_ids_path())
            .await?;
        let total = names.len();

        info!(total, "Deleting imported notes");
        emit(Notification::started("Delete started", total));

        for (index, name) in names.iter().enumerate() {
            let current = index + 1;
            emit(Notification::progress(
                format!("Deleting {}/{}", current, total),
                current,
                total,
            ));
            self.client.delete_note(name).await?;
            emit(Notification::success(format!("Deleted: {}", name)));
        }

        Ok(RunSummary {
            total,
            success: total,
            failed: 0,
            sent_ids_path: None,
            notes_json_path: None,
        })
    }
}
