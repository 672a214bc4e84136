//! Upload staging area
//!
//! Each multipart upload is streamed into its own directory under the staging
//! root. Nothing is visible through [`UploadStaging::get`] until the upload is
//! fully written and validated. A [`StagingSession`] that is dropped before
//! [`StagingSession::finish`] succeeds removes its directory.
//!
//! Staged uploads expire after a TTL and are swept by a background task. A job
//! claims the upload it consumes; the runner releases it when the job ends.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::upload_rules::{
    confine, is_supported_file_for_kind, resolve_entry_html, sanitize_relative_path,
};
use crate::models::{JobId, UploadHandle, UploadKind, UploadReceipt};

/// Upload staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("kind must be one of: flomo, weixin (got '{0}')")]
    UnsupportedKind(String),

    #[error("kind field is required")]
    MissingKind,

    #[error("No files uploaded")]
    NoFiles,

    #[error("File '{name}' exceeds the {} MiB limit", .limit / (1024 * 1024))]
    FileTooLarge { name: String, limit: u64 },

    #[error("Upload exceeds the {} MiB total limit", .limit / (1024 * 1024))]
    UploadTooLarge { limit: u64 },

    #[error("Upload exceeds the {limit} file limit")]
    TooManyFiles { limit: usize },

    #[error("Illegal file path: {0}")]
    InvalidPath(String),

    #[error("Duplicate file path: {0}")]
    DuplicatePath(String),

    #[error("File path {path} collides with {existing}")]
    PathConflict { path: String, existing: String },

    #[error("File type not supported for {kind}: {path}")]
    UnsupportedFileType { kind: UploadKind, path: String },

    #[error("{kind} uploads must contain exactly one file (got {count})")]
    ExpectedSingleFile { kind: UploadKind, count: usize },

    #[error("No .html/.htm entry file found in upload")]
    NoEntryFile,

    #[error("uploadId invalid or expired: {0}")]
    UnknownUpload(UploadHandle),

    #[error("Upload {handle} is a {actual} upload, expected {expected}")]
    KindMismatch {
        handle: UploadHandle,
        expected: UploadKind,
        actual: UploadKind,
    },

    #[error("Upload {0} is already in use by another job")]
    AlreadyClaimed(UploadHandle),

    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StagingError {
    /// Whether this error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StagingError::Io { .. })
    }

    fn io(path: &Path, source: io::Error) -> Self {
        StagingError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Resource limits applied while staging
#[derive(Debug, Clone, Copy)]
pub struct StagingLimits {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
    pub max_files: usize,
    pub ttl: Duration,
}

impl Default for StagingLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024,
            max_total_bytes: 1024 * 1024 * 1024,
            max_files: 5000,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Committed upload record
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub handle: UploadHandle,
    pub kind: UploadKind,
    pub original_name: String,
    pub file_count: usize,
    pub total_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Job currently consuming this upload
    pub claimed_by: Option<JobId>,
    dir: PathBuf,
    entry_path: PathBuf,
}

impl StagedUpload {
    /// Directory holding the upload's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn receipt(&self) -> UploadReceipt {
        UploadReceipt {
            upload_id: self.handle,
            kind: self.kind,
            original_name: self.original_name.clone(),
            file_count: self.file_count,
            size: self.total_bytes,
        }
    }
}

/// Registry of staged uploads plus the directory they live in
pub struct UploadStaging {
    root: PathBuf,
    limits: StagingLimits,
    uploads: RwLock<HashMap<UploadHandle, StagedUpload>>,
}

impl UploadStaging {
    /// Create the staging root if needed
    pub fn new(root: impl Into<PathBuf>, limits: StagingLimits) -> Result<Self, StagingError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StagingError::io(&root, e))?;
        Ok(Self {
            root,
            limits,
            uploads: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> &StagingLimits {
        &self.limits
    }

    /// Open a new staging session backed by a fresh directory
    pub async fn begin(self: &Arc<Self>) -> Result<StagingSession, StagingError> {
        let handle = Uuid::new_v4();
        let dir = self.root.join(handle.to_string());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StagingError::io(&dir, e))?;

        debug!(upload_id = %handle, "Staging session opened");

        Ok(StagingSession {
            staging: Arc::clone(self),
            handle,
            dir,
            kind: None,
            files: Vec::new(),
            seen: HashSet::new(),
            total_bytes: 0,
            committed: false,
        })
    }

    /// Look up a committed upload
    pub fn get(&self, handle: UploadHandle) -> Option<StagedUpload> {
        self.read().get(&handle).cloned()
    }

    /// Number of committed uploads currently held
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark an upload as consumed by a job and return its entry file
    ///
    /// An upload can be claimed once. The claim is dropped together with the
    /// upload when the job releases it.
    pub fn claim(
        &self,
        handle: UploadHandle,
        expected: UploadKind,
        job_id: JobId,
    ) -> Result<PathBuf, StagingError> {
        let mut uploads = self.write();
        let upload = uploads
            .get_mut(&handle)
            .ok_or(StagingError::UnknownUpload(handle))?;

        if upload.kind != expected {
            return Err(StagingError::KindMismatch {
                handle,
                expected,
                actual: upload.kind,
            });
        }
        if upload.claimed_by.is_some() {
            return Err(StagingError::AlreadyClaimed(handle));
        }

        upload.claimed_by = Some(job_id);
        Ok(upload.entry_path.clone())
    }

    /// Remove an upload and its files
    ///
    /// Releasing an unknown or already released handle is a no-op. Returns
    /// whether a record was removed.
    pub async fn release(&self, handle: UploadHandle) -> bool {
        let removed = self.write().remove(&handle);
        let dir = match &removed {
            Some(upload) => upload.dir.clone(),
            None => self.root.join(handle.to_string()),
        };

        remove_dir_quietly(&dir).await;
        if removed.is_some() {
            debug!(upload_id = %handle, "Staged upload released");
        }
        removed.is_some()
    }

    /// Release every upload older than the TTL
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Release every upload older than the TTL as of `at`
    pub async fn sweep_expired_at(&self, at: DateTime<Utc>) -> usize {
        let expired: Vec<(UploadHandle, Option<JobId>)> = self
            .read()
            .values()
            .filter(|u| memos_common::time::is_expired(u.created_at, self.limits.ttl, at))
            .map(|u| (u.handle, u.claimed_by))
            .collect();

        let mut swept = 0;
        for (handle, claimed_by) in expired {
            if let Some(job_id) = claimed_by {
                warn!(upload_id = %handle, job_id = %job_id, "Sweeping expired upload still claimed by a job");
            }
            if self.release(handle).await {
                swept += 1;
            }
        }
        swept
    }

    /// Remove leftover upload directories from a previous process
    ///
    /// Only directories named like an upload handle and not held in memory
    /// are touched.
    pub async fn purge_stale_dirs(&self) -> usize {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Cannot list staging root");
                return 0;
            }
        };

        let mut purged = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Some(handle) = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
            else {
                continue;
            };
            let known = self.read().contains_key(&handle);
            if known {
                continue;
            }
            remove_dir_quietly(&entry.path()).await;
            purged += 1;
        }

        if purged > 0 {
            info!(count = purged, "Purged stale upload directories");
        }
        purged
    }

    /// Sweep expired uploads every `every` until cancelled
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Upload sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let swept = self.sweep_expired().await;
                        if swept > 0 {
                            info!(count = swept, "Swept expired uploads");
                        }
                    }
                }
            }
        })
    }

    fn commit(&self, upload: StagedUpload) {
        self.write().insert(upload.handle, upload);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<UploadHandle, StagedUpload>> {
        self.uploads.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UploadHandle, StagedUpload>> {
        self.uploads.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One in-flight multipart upload
pub struct StagingSession {
    staging: Arc<UploadStaging>,
    handle: UploadHandle,
    dir: PathBuf,
    kind: Option<UploadKind>,
    files: Vec<String>,
    seen: HashSet<String>,
    total_bytes: u64,
    committed: bool,
}

impl StagingSession {
    pub fn handle(&self) -> UploadHandle {
        self.handle
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record the declared upload kind
    pub fn set_kind(&mut self, raw: &str) -> Result<(), StagingError> {
        let kind = raw
            .parse::<UploadKind>()
            .map_err(StagingError::UnsupportedKind)?;
        self.kind = Some(kind);
        Ok(())
    }

    /// Start writing one file of the upload
    pub async fn begin_file(&mut self, incoming_name: &str) -> Result<FileSink<'_>, StagingError> {
        if self.files.len() >= self.staging.limits.max_files {
            return Err(StagingError::TooManyFiles {
                limit: self.staging.limits.max_files,
            });
        }

        let relative = sanitize_relative_path(incoming_name)
            .ok_or_else(|| StagingError::InvalidPath(incoming_name.to_string()))?;
        let target = confine(&self.dir, &relative)
            .ok_or_else(|| StagingError::InvalidPath(incoming_name.to_string()))?;
        if self.seen.contains(&relative) {
            return Err(StagingError::DuplicatePath(relative));
        }
        // A staged file cannot also be a directory of another staged file
        if let Some(existing) = self
            .files
            .iter()
            .find(|f| nests(f, &relative) || nests(&relative, f))
        {
            return Err(StagingError::PathConflict {
                path: relative,
                existing: existing.clone(),
            });
        }
        self.seen.insert(relative.clone());

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StagingError::io(parent, e))?;
        }
        let file = fs::File::create(&target)
            .await
            .map_err(|e| StagingError::io(&target, e))?;

        self.files.push(relative.clone());

        Ok(FileSink {
            session: self,
            relative,
            target,
            file,
            written: 0,
        })
    }

    /// Validate the staged files and make the upload visible
    pub async fn finish(mut self) -> Result<UploadReceipt, StagingError> {
        let kind = self.kind.ok_or(StagingError::MissingKind)?;

        if self.files.is_empty() {
            return Err(StagingError::NoFiles);
        }

        if let Some(path) = self
            .files
            .iter()
            .find(|p| !is_supported_file_for_kind(kind, p))
        {
            return Err(StagingError::UnsupportedFileType {
                kind,
                path: path.clone(),
            });
        }

        if kind.requires_single_file() && self.files.len() != 1 {
            return Err(StagingError::ExpectedSingleFile {
                kind,
                count: self.files.len(),
            });
        }

        let entry = match kind {
            UploadKind::Flomo => resolve_entry_html(&self.files).ok_or(StagingError::NoEntryFile)?,
            UploadKind::Weixin => self.files[0].clone(),
        };
        let entry_path =
            confine(&self.dir, &entry).ok_or_else(|| StagingError::InvalidPath(entry.clone()))?;

        let original_name = self.files[0]
            .rsplit('/')
            .next()
            .unwrap_or(&self.files[0])
            .to_string();

        let upload = StagedUpload {
            handle: self.handle,
            kind,
            original_name,
            file_count: self.files.len(),
            total_bytes: self.total_bytes,
            created_at: Utc::now(),
            claimed_by: None,
            dir: self.dir.clone(),
            entry_path,
        };
        let receipt = upload.receipt();

        self.staging.commit(upload);
        self.committed = true;

        info!(
            upload_id = %receipt.upload_id,
            kind = %receipt.kind,
            files = receipt.file_count,
            bytes = receipt.size,
            "Upload staged"
        );
        Ok(receipt)
    }
}

impl Drop for StagingSession {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(upload_id = %self.handle, "Partial upload purged"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                upload_id = %self.handle,
                error = %e,
                "Failed to purge partial upload"
            ),
        }
    }
}

/// Writer for one file of a staging session, enforcing size limits
pub struct FileSink<'a> {
    session: &'a mut StagingSession,
    relative: String,
    target: PathBuf,
    file: fs::File,
    written: u64,
}

impl FileSink<'_> {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        let len = chunk.len() as u64;
        let limits = self.session.staging.limits;

        if self.written + len > limits.max_file_bytes {
            return Err(StagingError::FileTooLarge {
                name: self.relative.clone(),
                limit: limits.max_file_bytes,
            });
        }
        if self.session.total_bytes + len > limits.max_total_bytes {
            return Err(StagingError::UploadTooLarge {
                limit: limits.max_total_bytes,
            });
        }

        self.file
            .write_all(chunk)
            .await
            .map_err(|e| StagingError::io(&self.target, e))?;
        self.written += len;
        self.session.total_bytes += len;
        Ok(())
    }

    /// Flush the file to disk
    pub async fn finish(mut self) -> Result<u64, StagingError> {
        self.file
            .flush()
            .await
            .map_err(|e| StagingError::io(&self.target, e))?;
        Ok(self.written)
    }
}

/// Whether `inner` lies below `outer` in the upload's directory tree
fn nests(outer: &str, inner: &str) -> bool {
    inner.len() > outer.len()
        && inner.starts_with(outer)
        && inner.as_bytes()[outer.len()] == b'/'
}

async fn remove_dir_quietly(dir: &Path) {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove upload directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staging(temp: &TempDir, limits: StagingLimits) -> Arc<UploadStaging> {
        Arc::new(UploadStaging::new(temp.path().join("uploads"), limits).unwrap())
    }

    async fn write_file(session: &mut StagingSession, name: &str, body: &[u8]) {
        let mut sink = session.begin_file(name).await.unwrap();
        sink.write_chunk(body).await.unwrap();
        sink.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_weixin_upload_commits() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "book.txt", b"hello").await;
        let receipt = session.finish().await.unwrap();

        assert_eq!(receipt.kind, UploadKind::Weixin);
        assert_eq!(receipt.original_name, "book.txt");
        assert_eq!(receipt.file_count, 1);
        assert_eq!(receipt.size, 5);
        assert!(staging.get(receipt.upload_id).is_some());
    }

    #[tokio::test]
    async fn test_flomo_upload_resolves_index_entry() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("flomo").unwrap();
        write_file(&mut session, "export/file/a.png", b"png").await;
        write_file(&mut session, "export/other.html", b"<html/>").await;
        write_file(&mut session, "export/index.html", b"<html/>").await;
        let receipt = session.finish().await.unwrap();

        // Named after the first file received; the entry is resolved separately
        assert_eq!(receipt.original_name, "a.png");
        assert_eq!(receipt.file_count, 3);
        let entry = staging
            .claim(receipt.upload_id, UploadKind::Flomo, Uuid::new_v4())
            .unwrap();
        assert!(entry.ends_with("export/index.html"));
    }

    #[tokio::test]
    async fn test_unsupported_kind_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        let dir = session.dir().to_path_buf();
        assert!(matches!(
            session.set_kind("evernote"),
            Err(StagingError::UnsupportedKind(_))
        ));
        drop(session);

        assert!(!dir.exists());
        assert!(staging.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_file_purges_directory() {
        let temp = TempDir::new().unwrap();
        let limits = StagingLimits {
            max_file_bytes: 4,
            ..StagingLimits::default()
        };
        let staging = staging(&temp, limits);

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        let dir = session.dir().to_path_buf();
        {
            let mut sink = session.begin_file("book.txt").await.unwrap();
            sink.write_chunk(b"abc").await.unwrap();
            let err = sink.write_chunk(b"de").await.unwrap_err();
            assert!(matches!(err, StagingError::FileTooLarge { .. }));
        }
        drop(session);

        assert!(!dir.exists());
        assert!(staging.is_empty());
    }

    #[tokio::test]
    async fn test_too_many_files_rejected() {
        let temp = TempDir::new().unwrap();
        let limits = StagingLimits {
            max_files: 1,
            ..StagingLimits::default()
        };
        let staging = staging(&temp, limits);

        let mut session = staging.begin().await.unwrap();
        write_file(&mut session, "a.html", b"x").await;
        assert!(matches!(
            session.begin_file("b.html").await,
            Err(StagingError::TooManyFiles { limit: 1 })
        ));
    }

    #[tokio::test]
    async fn test_weixin_rejects_wrong_extension_and_count() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "book.md", b"x").await;
        assert!(matches!(
            session.finish().await,
            Err(StagingError::UnsupportedFileType { .. })
        ));

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "a.txt", b"x").await;
        write_file(&mut session, "b.txt", b"y").await;
        assert!(matches!(
            session.finish().await,
            Err(StagingError::ExpectedSingleFile { count: 2, .. })
        ));
        assert!(staging.is_empty());
    }

    #[tokio::test]
    async fn test_claim_once_and_kind_checked() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "book.txt", b"hello").await;
        let receipt = session.finish().await.unwrap();
        let handle = receipt.upload_id;

        assert!(matches!(
            staging.claim(handle, UploadKind::Flomo, Uuid::new_v4()),
            Err(StagingError::KindMismatch { .. })
        ));

        let entry = staging
            .claim(handle, UploadKind::Weixin, Uuid::new_v4())
            .unwrap();
        assert!(entry.ends_with("book.txt"));
        assert!(entry.starts_with(staging.root()));

        assert!(matches!(
            staging.claim(handle, UploadKind::Weixin, Uuid::new_v4()),
            Err(StagingError::AlreadyClaimed(_))
        ));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "book.txt", b"hello").await;
        let receipt = session.finish().await.unwrap();
        let dir = staging.get(receipt.upload_id).unwrap().dir().to_path_buf();

        assert!(staging.release(receipt.upload_id).await);
        assert!(!dir.exists());
        assert!(!staging.release(receipt.upload_id).await);
        assert!(!staging.release(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let temp = TempDir::new().unwrap();
        let limits = StagingLimits {
            ttl: Duration::from_secs(60),
            ..StagingLimits::default()
        };
        let staging = staging(&temp, limits);

        let mut session = staging.begin().await.unwrap();
        session.set_kind("weixin").unwrap();
        write_file(&mut session, "book.txt", b"hello").await;
        let receipt = session.finish().await.unwrap();

        assert_eq!(staging.sweep_expired_at(Utc::now()).await, 0);
        assert!(staging.get(receipt.upload_id).is_some());

        let later = Utc::now() + chrono::Duration::seconds(61);
        let dir = staging.get(receipt.upload_id).unwrap().dir().to_path_buf();
        assert_eq!(staging.sweep_expired_at(later).await, 1);
        assert!(staging.get(receipt.upload_id).is_none());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_file_and_directory_with_same_path_conflict() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        write_file(&mut session, "a", b"x").await;
        let err = session.begin_file("a/index.html").await.err().unwrap();
        assert!(matches!(err, StagingError::PathConflict { .. }));
        assert!(err.is_client_error());

        let mut session = staging.begin().await.unwrap();
        write_file(&mut session, "a/index.html", b"x").await;
        let err = session.begin_file("a").await.err().unwrap();
        assert!(matches!(err, StagingError::PathConflict { .. }));
        assert!(err.is_client_error());

        // Sibling names sharing a prefix are fine
        write_file(&mut session, "ab/index.html", b"y").await;
    }

    #[tokio::test]
    async fn test_names_with_no_usable_segment_are_rejected() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        for name in ["", "..", "/", "./../", "C:\\"] {
            let err = session.begin_file(name).await.err().unwrap();
            assert!(matches!(err, StagingError::InvalidPath(_)), "{:?}", name);
            assert!(err.is_client_error());
        }
    }

    #[tokio::test]
    async fn test_traversal_names_stay_inside_session_dir() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let mut session = staging.begin().await.unwrap();
        session.set_kind("flomo").unwrap();
        let dir = session.dir().to_path_buf();
        write_file(&mut session, "../../x.html", b"1").await;
        write_file(&mut session, "/etc/y.html", b"2").await;
        write_file(&mut session, "..\\..\\z.html", b"3").await;
        write_file(&mut session, "C:\\tmp\\w.html", b"4").await;
        session.finish().await.unwrap();

        assert!(dir.join("x.html").is_file());
        assert!(dir.join("etc/y.html").is_file());
        assert!(dir.join("z.html").is_file());
        assert!(dir.join("tmp/w.html").is_file());
        assert!(!temp.path().join("x.html").exists());
        assert!(!staging.root().join("x.html").exists());
        assert!(!temp.path().join("z.html").exists());
    }

    #[tokio::test]
    async fn test_purge_stale_dirs_skips_foreign_entries() {
        let temp = TempDir::new().unwrap();
        let staging = staging(&temp, StagingLimits::default());

        let stale = staging.root().join(Uuid::new_v4().to_string());
        let foreign = staging.root().join("keep-me");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::create_dir_all(&foreign).unwrap();

        assert_eq!(staging.purge_stale_dirs().await, 1);
        assert!(!stale.exists());
        assert!(foreign.exists());
    }
}
