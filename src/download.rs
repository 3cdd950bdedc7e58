//! Delivering the decoded PDF to the user.
//!
//! A [`DownloadSink`] receives the payload and a suggested file name.
//! [`DirectoryDownloads`] is the file-system implementation: bytes are staged
//! in a [`tempfile::NamedTempFile`] next to the target and renamed into place
//! without overwriting anything. The temp file is deleted on every failure
//! path, so an interrupted download never leaves a partial PDF behind.
//!
//! [`MemoryDownloads`] keeps payloads in memory, for embedding and tests.

use crate::error::ClientError;
use crate::payload::PdfPayload;
use crate::schedule::lock;
use futures::future::BoxFuture;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Give up after this many `-N` suffixes collide.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `converted-<unix-millis>.pdf` for the given instant.
pub fn download_name(unix_millis: i64) -> String {
    format!("converted-{unix_millis}.pdf")
}

/// [`download_name`] for the current time.
pub fn timestamped_download_name() -> String {
    download_name(chrono::Utc::now().timestamp_millis())
}

/// Where a finished conversion goes.
pub trait DownloadSink: Send + Sync {
    /// Store `payload` under a name derived from `file_name` and return
    /// where it ended up.
    fn save<'a>(
        &'a self,
        file_name: &'a str,
        payload: &'a PdfPayload,
    ) -> BoxFuture<'a, Result<PathBuf, ClientError>>;
}

/// Writes downloads into a directory, never overwriting existing files.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectoryDownloads {
    fn save<'a>(
        &'a self,
        file_name: &'a str,
        payload: &'a PdfPayload,
    ) -> BoxFuture<'a, Result<PathBuf, ClientError>> {
        let dir = self.dir.clone();
        let name = file_name.to_string();
        let bytes = payload.bytes.clone();
        Box::pin(async move {
            let fallback = dir.join(&name);
            let path = tokio::task::spawn_blocking(move || write_unique(&dir, &name, &bytes))
                .await
                .map_err(|e| ClientError::OutputWriteFailed {
                    path: fallback,
                    source: io::Error::other(e),
                })??;
            info!("Saved PDF to {}", path.display());
            Ok(path)
        })
    }
}

/// Stage `bytes` in a temp file inside `dir`, then rename it to `name`, or
/// `stem-1.ext`, `stem-2.ext`… if that is taken.
fn write_unique(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ClientError> {
    let write_err = |path: &Path, source: io::Error| ClientError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(dir, e))?;
    if let Err(e) = tmp.write_all(bytes).and_then(|_| tmp.flush()) {
        return Err(write_err(tmp.path(), e));
    }

    let base = Path::new(name);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted".to_string());
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}-{attempt}.{ext}")
        };
        let target = dir.join(candidate);
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next name", target.display());
                tmp = e.file;
            }
            Err(e) => return Err(write_err(&target, e.error)),
        }
    }

    Err(write_err(
        &dir.join(name),
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name after {MAX_NAME_ATTEMPTS} attempts"),
        ),
    ))
}

/// A payload captured by [`MemoryDownloads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Keeps every download in memory.
#[derive(Debug, Default)]
pub struct MemoryDownloads {
    saved: Mutex<Vec<SavedDownload>>,
}

impl MemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedDownload> {
        lock(&self.saved).clone()
    }
}

impl DownloadSink for MemoryDownloads {
    fn save<'a>(
        &'a self,
        file_name: &'a str,
        payload: &'a PdfPayload,
    ) -> BoxFuture<'a, Result<PathBuf, ClientError>> {
        lock(&self.saved).push(SavedDownload {
            file_name: file_name.to_string(),
            bytes: payload.bytes.clone(),
            mime: payload.mime,
        });
        Box::pin(futures::future::ready(Ok(PathBuf::from(file_name))))
    }
}
