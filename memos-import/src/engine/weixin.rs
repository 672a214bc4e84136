//! WeChat Reading highlights import

use async_trait::async_trait;
use memos_common::Notification;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{ArtifactStore, Emit, Engine, EngineError, RunSummary};
use crate::client::{extract_note_name, NotesApi};
use crate::parsers::parse_weixin_text;

pub struct WeixinImport {
    txt_path: PathBuf,
    client: Arc<dyn NotesApi>,
    artifacts: ArtifactStore,
}

impl WeixinImport {
    pub fn new(txt_path: PathBuf, client: Arc<dyn NotesApi>, artifacts: ArtifactStore) -> Self {
        Self {
            txt_path,
            client,
            artifacts,
        }
    }
}

#[async_trait]
impl Engine for WeixinImport {
    fn name(&self) -> &'static str {
        "Weixin import"
    }

    async fn run(&self, emit: Emit<'_>) -> Result<RunSummary, EngineError> {
        let sent_ids_path = self.artifacts.sent_ids_path();
        self.artifacts.clear(&sent_ids_path).await?;

        let text = tokio::fs::read_to_string(&self.txt_path)
            .await
            .map_err(|source| EngineError::ReadInput {
                path: self.txt_path.clone(),
                source,
            })?;
        let book = parse_weixin_text(&text);
        let total = book.notes.len();

        info!(book = %book.book_name, total, "Weixin export parsed");
        emit(Notification::started("Weixin import started", total));

        let mut sent: Vec<String> = Vec::with_capacity(total);
        for (index, note) in book.notes.iter().enumerate() {
            let current = index + 1;
            emit(Notification::progress(
                format!("Sending memo {}/{}", current, total),
                current,
                total,
            ));

            let response = self.client.create_note(&note.render(&book.tag)).await?;
            let name = extract_note_name(&response).ok_or(EngineError::MissingNoteName)?;
            sent.push(name.clone());
            self.artifacts.write_json(&sent_ids_path, &sent).await?;

            emit(Notification::success(format!("Memo sent: {}", name)));
        }

        Ok(RunSummary {
            total,
            success: sent.len(),
            failed: 0,
            sent_ids_path: Some(sent_ids_path),
            notes_json_path: None,
        })
    }
}
