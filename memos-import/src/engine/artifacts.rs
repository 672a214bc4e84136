//! Artifact files written by the import engines
//!
//! `sendedIds.json` lists the remote names of notes created by the most recent
//! import and is what the delete engine reads. `memo.json` is the parsed Flomo
//! export with uploaded resource references.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::EngineError;

const SENT_IDS_FILE: &str = "sendedIds.json";
const NOTES_JSON_FILE: &str = "memo.json";

/// Directory holding the artifact files
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sent_ids_path(&self) -> PathBuf {
        self.dir.join(SENT_IDS_FILE)
    }

    pub fn notes_json_path(&self) -> PathBuf {
        self.dir.join(NOTES_JSON_FILE)
    }

    /// Remove an artifact if present
    pub async fn clear(&self, path: &Path) -> Result<(), EngineError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(EngineError::Artifact {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write pretty-printed JSON, replacing the file atomically
    pub async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), EngineError> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| EngineError::ArtifactFormat {
            path: path.to_path_buf(),
            source,
        })?;

        let io_err = |source| EngineError::Artifact {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_err)?;
        fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }

    /// Read a JSON artifact; a missing file is [`EngineError::MissingArtifact`]
    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, EngineError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EngineError::MissingArtifact(path.to_path_buf()))
            }
            Err(source) => {
                return Err(EngineError::Artifact {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| EngineError::ArtifactFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}
