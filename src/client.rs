//! The conversion client: one controller owning all application state.
//!
//! [`ConversionClient`] holds the Document Source, the selected options, the
//! single-flight state and the collaborators (transport, download sink,
//! preview, status board). UI layers call its operations and read its state
//! back; nothing is ambient.
//!
//! ## Single flight
//!
//! [`FlightState`] enforces at most one conversion in flight:
//!
//! ```text
//!            submit()                 success
//!   Idle ────────────────▶ Submitting ────────▶ Idle
//!    ▲                        │
//!    │        submit()        │ any error
//!    └────────── Failed ◀─────┘
//! ```
//!
//! A `submit()` that arrives while `Submitting` is refused with
//! [`ClientError::ConversionInProgress`]; it neither queues nor cancels the
//! running request. The state is restored by a drop guard, so the trigger
//! comes back enabled however the call ends.

use crate::api::{ConvertRequest, ConvertTransport, HttpTransport};
use crate::config::{ClientConfig, Orientation, PageSize};
use crate::document::{DocumentSource, EXAMPLE_CV_HTML};
use crate::download::{timestamped_download_name, DirectoryDownloads, DownloadSink};
use crate::error::{ClientError, ErrorKind};
use crate::intake::{self, IncomingFile, IntakeKind};
use crate::payload::decode_pdf;
use crate::preview::{NullPreview, PreviewRenderer, PreviewSurface};
use crate::schedule::lock;
use crate::status::{NoopStatusObserver, Severity, StatusBoard, StatusObserver};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

/// Trigger label while idle.
pub const CONVERT_LABEL: &str = "Convert to PDF";
/// Trigger label while a conversion is in flight.
pub const CONVERTING_LABEL: &str = "Converting to PDF...";

pub const EMPTY_DOCUMENT_MESSAGE: &str = "Please enter or upload HTML content first!";
pub const CONVERTING_MESSAGE: &str = "Converting HTML to PDF... Please wait.";
pub const REJECTED_UPLOAD_MESSAGE: &str = "Please upload an HTML file (.html or .htm)";
pub const EXAMPLE_LOADED_MESSAGE: &str = "Example CV loaded!";
const UNKNOWN_REMOTE_ERROR: &str = "Unknown error occurred";

/// Where the conversion flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightState {
    Idle,
    Submitting,
    /// The last attempt failed with this kind of error. Accepts new submissions.
    Failed(ErrorKind),
}

/// Observable state of the conversion trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerControl {
    pub enabled: bool,
    pub label: &'static str,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Where the download sink stored the PDF.
    pub path: PathBuf,
    /// The timestamped name the download was offered under.
    pub file_name: String,
    /// Decoded payload size in bytes.
    pub bytes: usize,
    /// Size as reported by the endpoint (or computed, if it omitted one).
    pub size_kb: f64,
    pub duration_ms: u64,
}

/// Puts the flight state back when a submission ends, however it ends.
struct FlightGuard<'a> {
    state: &'a Mutex<FlightState>,
    settled: FlightState,
}

impl<'a> FlightGuard<'a> {
    fn enter(state: &'a Mutex<FlightState>) -> Result<Self, ClientError> {
        let mut current = lock(state);
        if *current == FlightState::Submitting {
            return Err(ClientError::ConversionInProgress);
        }
        *current = FlightState::Submitting;
        Ok(Self {
            state,
            settled: FlightState::Idle,
        })
    }

    fn settle(&mut self, outcome: FlightState) {
        self.settled = outcome;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = self.settled;
    }
}

/// Builder for [`ConversionClient`].
pub struct ConversionClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn ConvertTransport>>,
    downloads: Option<Arc<dyn DownloadSink>>,
    preview: Option<Arc<dyn PreviewSurface>>,
    observer: Option<Arc<dyn StatusObserver>>,
}

impl ConversionClientBuilder {
    /// Use a pre-built transport instead of HTTP to `config.endpoint`.
    pub fn transport(mut self, transport: Arc<dyn ConvertTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where PDFs go. Default: [`DirectoryDownloads`] on `config.output_dir`.
    pub fn downloads(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.downloads = Some(sink);
        self
    }

    /// Preview surface. Default: none.
    pub fn preview(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.preview = Some(surface);
        self
    }

    pub fn status_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Assemble the client and paint the initial (empty) preview.
    pub fn build(self) -> Result<ConversionClient, ClientError> {
        let config = self.config;
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let downloads = self
            .downloads
            .unwrap_or_else(|| Arc::new(DirectoryDownloads::new(config.output_dir.clone())));
        let surface = self.preview.unwrap_or_else(|| Arc::new(NullPreview));
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(NoopStatusObserver));

        let client = ConversionClient {
            document: Mutex::new(DocumentSource::new()),
            options: Mutex::new((config.page_size, config.orientation)),
            flight: Mutex::new(FlightState::Idle),
            preview: PreviewRenderer::new(surface, config.debounce()),
            status: StatusBoard::new(
                config.success_status_lifetime(),
                config.status_fade(),
                observer,
            ),
            transport,
            downloads,
            config,
        };
        client.preview.render_now("");
        Ok(client)
    }
}

/// The controller behind every UI.
pub struct ConversionClient {
    config: ClientConfig,
    document: Mutex<DocumentSource>,
    options: Mutex<(PageSize, Orientation)>,
    flight: Mutex<FlightState>,
    preview: PreviewRenderer,
    status: StatusBoard,
    transport: Arc<dyn ConvertTransport>,
    downloads: Arc<dyn DownloadSink>,
}

impl ConversionClient {
    pub fn builder(config: ClientConfig) -> ConversionClientBuilder {
        ConversionClientBuilder {
            config,
            transport: None,
            downloads: None,
            preview: None,
            observer: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Snapshot of the Document Source.
    pub fn document(&self) -> DocumentSource {
        lock(&self.document).clone()
    }

    pub fn flight_state(&self) -> FlightState {
        *lock(&self.flight)
    }

    pub fn trigger(&self) -> TriggerControl {
        match self.flight_state() {
            FlightState::Submitting => TriggerControl {
                enabled: false,
                label: CONVERTING_LABEL,
            },
            FlightState::Idle | FlightState::Failed(_) => TriggerControl {
                enabled: true,
                label: CONVERT_LABEL,
            },
        }
    }

    pub fn select_page_size(&self, size: PageSize) {
        lock(&self.options).0 = size;
    }

    pub fn select_orientation(&self, orientation: Orientation) {
        lock(&self.options).1 = orientation;
    }

    pub fn options(&self) -> (PageSize, Orientation) {
        *lock(&self.options)
    }

    // ── Editing & preview ────────────────────────────────────────────────

    /// Replace the text from a direct edit and schedule a debounced preview.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn edit(&self, text: impl Into<String>) {
        let text = text.into();
        lock(&self.document).set_text(text.clone());
        self.preview.schedule(text);
    }

    /// Re-render the preview immediately with the current text.
    pub fn refresh_preview(&self) {
        let text = lock(&self.document).text().to_string();
        self.preview.render_now(&text);
    }

    // ── File intake ──────────────────────────────────────────────────────

    /// Load a file into the Document Source.
    ///
    /// Dropped files must pass the HTML policy; a rejected file shows an
    /// error status and leaves everything else untouched.
    ///
    /// Must be called from inside a tokio runtime: a successful load shows a
    /// success status, which schedules its own expiry.
    pub async fn load_file(&self, file: IncomingFile, kind: IntakeKind) -> Result<(), ClientError> {
        if let Err(e) = intake::check(&file, kind) {
            warn!("{}", e);
            self.status.show(REJECTED_UPLOAD_MESSAGE, Severity::Error);
            return Err(e);
        }

        let contents = match intake::read_text(&file.path).await {
            Ok(text) => text,
            Err(e) => {
                self.status.show(e.to_string(), Severity::Error);
                return Err(e);
            }
        };

        info!("Loaded {} ({} bytes)", file.name, contents.len());
        lock(&self.document).replace_with_file(file.name.clone(), contents);
        self.refresh_preview();
        self.status
            .show(format!("File loaded: {}", file.name), Severity::Success);
        Ok(())
    }

    /// Forget the loaded-file indicator. The text stays.
    pub fn clear_file(&self) -> Option<String> {
        lock(&self.document).clear_loaded_file()
    }

    /// Replace the text with the built-in example document.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn load_example(&self) {
        lock(&self.document).set_text(EXAMPLE_CV_HTML);
        self.refresh_preview();
        self.status.show(EXAMPLE_LOADED_MESSAGE, Severity::Success);
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Convert the current document and hand the PDF to the download sink.
    ///
    /// # Errors
    /// - [`ClientError::EmptyDocument`]: nothing to convert; no request made.
    /// - [`ClientError::ConversionInProgress`]: another call is in flight.
    /// - [`ClientError::RemoteFailure`]: the endpoint reported failure.
    /// - Transport and I/O errors from the exchange or the download.
    ///
    /// Every error except `ConversionInProgress` is also shown as an error
    /// status.
    pub async fn submit(&self) -> Result<ConversionOutcome, ClientError> {
        let html = {
            let doc = lock(&self.document);
            (!doc.is_blank()).then(|| doc.trimmed().to_string())
        };
        let Some(html) = html else {
            self.status.show(EMPTY_DOCUMENT_MESSAGE, Severity::Error);
            return Err(ClientError::EmptyDocument);
        };

        let mut flight = FlightGuard::enter(&self.flight).inspect_err(|_| {
            warn!("Conversion already in flight; submission refused");
        })?;

        let (page_size, orientation) = self.options();
        let request = ConvertRequest {
            html,
            filename: self.config.filename.clone(),
            page_size,
            orientation,
        };

        self.status.show(CONVERTING_MESSAGE, Severity::Info);
        let result = self.exchange(&request).await;

        match &result {
            Ok(outcome) => {
                flight.settle(FlightState::Idle);
                info!(
                    "Conversion complete: {} ({} bytes) in {}ms",
                    outcome.path.display(),
                    outcome.bytes,
                    outcome.duration_ms
                );
                self.status.show(
                    format!(
                        "PDF generated successfully! File size: {} KB",
                        outcome.size_kb
                    ),
                    Severity::Success,
                );
            }
            Err(e) => {
                flight.settle(FlightState::Failed(e.kind()));
                warn!("Conversion error: {}", e);
                self.status.show(failure_message(e), Severity::Error);
            }
        }
        result
    }

    async fn exchange(&self, request: &ConvertRequest) -> Result<ConversionOutcome, ClientError> {
        let start = Instant::now();
        let reply = self.transport.send(request).await?;

        if !reply.is_success() {
            let message = reply
                .body
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_REMOTE_ERROR.to_string());
            return Err(ClientError::RemoteFailure { message });
        }

        let encoded = reply
            .body
            .pdf_base64
            .as_deref()
            .ok_or_else(|| ClientError::InvalidPayload {
                detail: "reply reported success but carried no pdf_base64".into(),
            })?;
        let payload = decode_pdf(encoded)?;

        let file_name = timestamped_download_name();
        let path = self.downloads.save(&file_name, &payload).await?;

        let size_kb = reply
            .body
            .size_kb
            .unwrap_or_else(|| (payload.len() as f64 / 1024.0 * 100.0).round() / 100.0);

        Ok(ConversionOutcome {
            path,
            file_name,
            bytes: payload.len(),
            size_kb,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl std::fmt::Debug for ConversionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionClient")
            .field("config", &self.config)
            .field("document", &self.document())
            .field("options", &self.options())
            .field("flight", &self.flight_state())
            .field("transport", &"<dyn ConvertTransport>")
            .field("downloads", &"<dyn DownloadSink>")
            .finish()
    }
}

/// Status text for a failed submission.
fn failure_message(e: &ClientError) -> String {
    match e {
        ClientError::EmptyDocument => EMPTY_DOCUMENT_MESSAGE.to_string(),
        other => match other.transport_detail() {
            Some(detail) => format!(
                "Network error: {detail}. Please check your connection and try again."
            ),
            None => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ConvertResponse, EndpointReply};
    use crate::download::MemoryDownloads;
    use futures::future::BoxFuture;

    struct Canned(Result<ConvertResponse, String>);

    impl ConvertTransport for Canned {
        fn send<'a>(
            &'a self,
            _request: &'a ConvertRequest,
        ) -> BoxFuture<'a, Result<EndpointReply, ClientError>> {
            let reply = match &self.0 {
                Ok(body) => Ok(EndpointReply {
                    http_ok: true,
                    body: body.clone(),
                }),
                Err(detail) => Err(ClientError::Transport {
                    detail: detail.clone(),
                }),
            };
            Box::pin(async move { reply })
        }
    }

    fn client(reply: Result<ConvertResponse, String>) -> ConversionClient {
        ConversionClient::builder(ClientConfig::default())
            .transport(Arc::new(Canned(reply)))
            .downloads(Arc::new(MemoryDownloads::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn flight_guard_refuses_reentry_and_restores() {
        let state = Mutex::new(FlightState::Idle);
        {
            let _g = FlightGuard::enter(&state).unwrap();
            assert_eq!(*state.lock().unwrap(), FlightState::Submitting);
            assert!(matches!(
                FlightGuard::enter(&state),
                Err(ClientError::ConversionInProgress)
            ));
        }
        assert_eq!(*state.lock().unwrap(), FlightState::Idle);
    }

    #[test]
    fn flight_guard_records_failure() {
        let state = Mutex::new(FlightState::Idle);
        {
            let mut g = FlightGuard::enter(&state).unwrap();
            g.settle(FlightState::Failed(ErrorKind::Transport));
        }
        assert_eq!(
            *state.lock().unwrap(),
            FlightState::Failed(ErrorKind::Transport)
        );
        assert!(FlightGuard::enter(&state).is_ok(), "Failed accepts new submissions");
    }

    #[test]
    fn failure_messages() {
        let remote = ClientError::RemoteFailure {
            message: "boom".into(),
        };
        assert_eq!(failure_message(&remote), "Conversion failed: boom");

        let transport = ClientError::Transport {
            detail: "expected value at line 1 column 1".into(),
        };
        assert_eq!(
            failure_message(&transport),
            "Network error: expected value at line 1 column 1. Please check your connection and try again."
        );
    }

    #[tokio::test]
    async fn trigger_idles_with_convert_label() {
        let c = client(Ok(ConvertResponse::ok("SGVsbG8=", 1.0)));
        assert_eq!(
            c.trigger(),
            TriggerControl {
                enabled: true,
                label: CONVERT_LABEL
            }
        );
    }

    #[tokio::test]
    async fn missing_size_is_computed_from_payload() {
        let c = client(Ok(ConvertResponse {
            success: true,
            pdf_base64: Some("SGVsbG8=".into()),
            size_kb: None,
            error: None,
        }));
        c.edit("<p>x</p>");
        let outcome = c.submit().await.unwrap();
        assert_eq!(outcome.bytes, 5);
        assert_eq!(outcome.size_kb, 0.0);
    }

    #[tokio::test]
    async fn success_without_payload_is_transport_failure() {
        let c = client(Ok(ConvertResponse {
            success: true,
            pdf_base64: None,
            size_kb: Some(1.0),
            error: None,
        }));
        c.edit("<p>x</p>");
        let err = c.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(c.flight_state(), FlightState::Failed(ErrorKind::Transport));
        assert!(c
            .status()
            .current()
            .unwrap()
            .text
            .starts_with("Network error:"));
    }

    #[tokio::test]
    async fn empty_remote_error_falls_back_to_generic_text() {
        let c = client(Ok(ConvertResponse::failed("")));
        c.edit("<p>x</p>");
        c.submit().await.unwrap_err();
        assert_eq!(
            c.status().current().unwrap().text,
            "Conversion failed: Unknown error occurred"
        );
    }

    #[tokio::test]
    async fn options_can_be_selected() {
        let c = client(Ok(ConvertResponse::ok("SGVsbG8=", 1.0)));
        c.select_page_size(PageSize::Legal);
        c.select_orientation(Orientation::Landscape);
        assert_eq!(c.options(), (PageSize::Legal, Orientation::Landscape));
    }
}
