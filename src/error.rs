//! Error types for the html2pdf-client library.
//!
//! Every failure the client can hit is a [`ClientError`]. They fall into
//! five kinds, reported by [`ClientError::kind`]:
//!
//! * **Validation**: the request was refused locally (blank document,
//!   conversion already running, bad configuration). No network call.
//! * **Rejected upload**: a dropped file was not HTML. No state changed.
//! * **Remote failure**: the endpoint answered with well-formed JSON saying
//!   the conversion failed. The server's message is kept verbatim.
//! * **Transport**: the exchange itself broke (connection, timeout,
//!   unparseable body, undecodable payload).
//! * **I/O**: reading an input file or writing an output file failed.
//!
//! None of them is retried automatically. The user re-initiates.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the html2pdf-client library.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Validation ────────────────────────────────────────────────────────
    /// The Document Source is empty or whitespace-only.
    #[error("Document is empty: enter or load some HTML before converting")]
    EmptyDocument,

    /// A conversion is already in flight; this submission was refused.
    #[error("A conversion is already in progress; wait for it to finish")]
    ConversionInProgress,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Intake ────────────────────────────────────────────────────────────
    /// A dropped file was neither declared as HTML nor named `.html`/`.htm`.
    #[error("Rejected upload '{name}' ({}): only .html or .htm files are accepted", mime.as_deref().unwrap_or("unknown type"))]
    RejectedUpload { name: String, mime: Option<String> },

    // ── Remote ────────────────────────────────────────────────────────────
    /// The endpoint replied with `success: false` or a non-2xx status.
    #[error("Conversion failed: {message}")]
    RemoteFailure { message: String },

    // ── Transport ─────────────────────────────────────────────────────────
    /// Connection-level failure or an unreadable response body.
    #[error("Network error: {detail}")]
    Transport { detail: String },

    /// The request did not settle within the configured timeout.
    #[error("Network error: request timed out after {secs}s\nIncrease --timeout.")]
    Timeout { secs: u64 },

    /// The reply claimed success but its payload could not be decoded.
    #[error("Network error: invalid PDF payload: {detail}")]
    InvalidPayload { detail: String },

    // ── I/O ───────────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file (download or preview).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Validation,
    RejectedUpload,
    RemoteFailure,
    Transport,
    Io,
}

impl ClientError {
    /// Which branch of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::EmptyDocument
            | ClientError::ConversionInProgress
            | ClientError::InvalidConfig(_) => ErrorKind::Validation,
            ClientError::RejectedUpload { .. } => ErrorKind::RejectedUpload,
            ClientError::RemoteFailure { .. } => ErrorKind::RemoteFailure,
            ClientError::Transport { .. }
            | ClientError::Timeout { .. }
            | ClientError::InvalidPayload { .. } => ErrorKind::Transport,
            ClientError::FileNotFound { .. }
            | ClientError::PermissionDenied { .. }
            | ClientError::ReadFailed { .. }
            | ClientError::OutputWriteFailed { .. } => ErrorKind::Io,
        }
    }

    /// The bare detail text of a transport-level failure, without the
    /// `Network error:` prefix the `Display` impl adds.
    pub(crate) fn transport_detail(&self) -> Option<String> {
        match self {
            ClientError::Transport { detail } => Some(detail.clone()),
            ClientError::Timeout { secs } => Some(format!("request timed out after {secs}s")),
            ClientError::InvalidPayload { detail } => Some(format!("invalid PDF payload: {detail}")),
            _ => None,
        }
    }
}
