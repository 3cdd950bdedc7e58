//! # html2pdf-client
//!
//! Preview HTML locally and convert it to PDF through a remote conversion
//! endpoint.
//!
//! The rendering itself happens elsewhere: this crate sends the document to
//! `POST /api/convert_to_pdf`, receives the PDF as base64 inside JSON, and
//! saves the decoded file. Around that single exchange it keeps the state a
//! conversion UI needs: the document text, a debounced live preview, file
//! intake, a single-slot status line, and a guard that allows only one
//! conversion in flight.
//!
//! ## Flow Overview
//!
//! ```text
//! edit / load file
//!  │
//!  ├─ 1. Document   replace the Document Source text
//!  ├─ 2. Preview    debounced (500 ms) render into a PreviewSurface
//!  │
//! submit
//!  ├─ 3. Guard      refuse if blank or already Submitting
//!  ├─ 4. Exchange   one POST through a ConvertTransport
//!  ├─ 5. Decode     base64 → PDF bytes
//!  ├─ 6. Download   atomic write under converted-<millis>.pdf
//!  └─ 7. Status     success / error message in the status slot
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2pdf_client::{ClientConfig, ConversionClient, PageSize};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .endpoint("http://localhost:7071")
//!         .page_size(PageSize::Letter)
//!         .build()?;
//!     let client = ConversionClient::builder(config).build()?;
//!     client.edit("<h1>Invoice #42</h1>");
//!     let outcome = client.submit().await?;
//!     println!("saved {} ({} KB)", outcome.path.display(), outcome.size_kb);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! html2pdf-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod client;
pub mod config;
pub mod document;
pub mod download;
pub mod error;
pub mod intake;
pub mod payload;
pub mod preview;
pub mod schedule;
pub mod status;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{ConvertRequest, ConvertResponse, ConvertTransport, EndpointReply, HttpTransport};
pub use client::{
    ConversionClient, ConversionClientBuilder, ConversionOutcome, FlightState, TriggerControl,
    CONVERTING_LABEL, CONVERT_LABEL,
};
pub use config::{ClientConfig, ClientConfigBuilder, Orientation, PageSize};
pub use document::{DocumentSource, EXAMPLE_CV_HTML};
pub use download::{DirectoryDownloads, DownloadSink, MemoryDownloads};
pub use error::{ClientError, ErrorKind};
pub use intake::{IncomingFile, IntakeKind};
pub use payload::{decode_pdf, PdfPayload};
pub use preview::{FilePreview, MemoryPreview, NullPreview, PreviewRenderer, PreviewSurface};
pub use schedule::{Debouncer, ScheduledTask};
pub use status::{
    NoopStatusObserver, Severity, StatusBoard, StatusMessage, StatusObserver, StatusPhase,
};
