//! File intake: accepting a file and reading it as HTML text.
//!
//! Two ways in, mirroring a file picker and a drop zone:
//!
//! * [`IntakeKind::Selected`]: the user picked the file explicitly. No
//!   filter is applied.
//! * [`IntakeKind::Dropped`]: the file was dropped in. It is accepted only if
//!   its declared type is `text/html` or its name ends in `.html` / `.htm`.
//!
//! Text is decoded as UTF-8; invalid sequences become U+FFFD rather than
//! failing the load.

use crate::error::ClientError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a file reached the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeKind {
    Selected,
    Dropped,
}

/// A file offered to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Display name, normally the final path component.
    pub name: String,
    /// Declared MIME type, when the source provides one.
    pub mime: Option<String>,
    pub path: PathBuf,
}

impl IncomingFile {
    /// Describe a file on disk. Local files carry no declared type.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            mime: None,
            path,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// The drop-zone policy.
pub fn accepts_drop(name: &str, mime: Option<&str>) -> bool {
    let declared_html = mime
        .map(|m| m.split(';').next().unwrap_or("").trim())
        .is_some_and(|essence| essence.eq_ignore_ascii_case("text/html"));
    let lower = name.to_ascii_lowercase();
    declared_html || lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Apply the policy for `kind` to `file`.
pub fn check(file: &IncomingFile, kind: IntakeKind) -> Result<(), ClientError> {
    match kind {
        IntakeKind::Selected => Ok(()),
        IntakeKind::Dropped if accepts_drop(&file.name, file.mime.as_deref()) => Ok(()),
        IntakeKind::Dropped => Err(ClientError::RejectedUpload {
            name: file.name.clone(),
            mime: file.mime.clone(),
        }),
    }
}

/// Read a file's full contents as text.
pub async fn read_text(path: &Path) -> Result<String, ClientError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClientError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ClientError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ClientError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_policy_accepts_html_names_and_types() {
        assert!(accepts_drop("cv.html", None));
        assert!(accepts_drop("cv.htm", None));
        assert!(accepts_drop("CV.HTML", None));
        assert!(accepts_drop("export", Some("text/html")));
        assert!(accepts_drop("export", Some("text/html; charset=utf-8")));
    }

    #[test]
    fn drop_policy_rejects_everything_else() {
        assert!(!accepts_drop("cv.pdf", None));
        assert!(!accepts_drop("notes.txt", Some("text/plain")));
        assert!(!accepts_drop("html", None));
        assert!(!accepts_drop("page.html.bak", None));
    }

    #[test]
    fn selection_is_unfiltered() {
        let f = IncomingFile::from_path("/tmp/notes.txt");
        tokio_test::assert_ok!(check(&f, IntakeKind::Selected));
        let err = tokio_test::assert_err!(check(&f, IntakeKind::Dropped));
        assert!(matches!(err, ClientError::RejectedUpload { ref name, .. } if name == "notes.txt"));
    }

    #[test]
    fn from_path_uses_final_component() {
        let f = IncomingFile::from_path("/some/dir/page.htm").with_mime("text/html");
        assert_eq!(f.name, "page.htm");
        assert_eq!(f.mime.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn reads_exact_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.html");
        std::fs::write(&path, "<p>héllo</p>\n").unwrap();
        assert_eq!(read_text(&path).await.unwrap(), "<p>héllo</p>\n");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.html");
        std::fs::write(&path, b"<p>caf\xe9</p>").unwrap();
        assert_eq!(read_text(&path).await.unwrap(), "<p>caf\u{FFFD}</p>");
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let err = read_text(Path::new("/definitely/not/here.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::FileNotFound { .. }));
    }
}
