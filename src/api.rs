//! Wire contract with the remote conversion endpoint, and the transports
//! that speak it.
//!
//! The endpoint is an external collaborator: `POST /api/convert_to_pdf` with
//! a JSON [`ConvertRequest`], answered by a JSON [`ConvertResponse`]. This
//! module only moves those two values across the network. Interpreting the
//! reply (success flag, payload decoding, status text) is the client's job.
//!
//! [`ConvertTransport`] is the seam. [`HttpTransport`] is the production
//! implementation on `reqwest`; tests substitute scripted transports.

use crate::config::{ClientConfig, Orientation, PageSize};
use crate::error::ClientError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Request body of `POST /api/convert_to_pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub html: String,
    pub filename: String,
    pub page_size: PageSize,
    pub orientation: Orientation,
}

/// Response body of `POST /api/convert_to_pdf`.
///
/// Every field is optional: failures carry only `error`, successes carry
/// `pdf_base64` and `size_kb`. A body without `success` counts as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConvertResponse {
    pub fn ok(pdf_base64: impl Into<String>, size_kb: f64) -> Self {
        Self {
            success: true,
            pdf_base64: Some(pdf_base64.into()),
            size_kb: Some(size_kb),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            pdf_base64: None,
            size_kb: None,
            error: Some(error.into()),
        }
    }
}

/// A parsed reply together with whether the HTTP status was 2xx.
///
/// A non-2xx status whose body still parses is a remote failure, not a
/// transport failure, so the status travels alongside the body.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointReply {
    pub http_ok: bool,
    pub body: ConvertResponse,
}

impl EndpointReply {
    /// Whether the endpoint reported a usable conversion.
    pub fn is_success(&self) -> bool {
        self.http_ok && self.body.success
    }
}

/// Sends one conversion request and returns the parsed reply.
///
/// Implementations return `Err` only for transport-level failures
/// (connection, timeout, unparseable body). A well-formed failure reply is
/// `Ok` with `success: false`.
pub trait ConvertTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a ConvertRequest,
    ) -> BoxFuture<'a, Result<EndpointReply, ClientError>>;
}

/// [`ConvertTransport`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for `config.endpoint_url()` with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                detail: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: config.endpoint_url(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: &ConvertRequest) -> Result<EndpointReply, ClientError> {
        info!(
            "POST {} ({} bytes of HTML, {} {})",
            self.url,
            request.html.len(),
            request.page_size,
            request.orientation
        );

        let payload = serde_json::to_vec(request).map_err(|e| ClientError::Transport {
            detail: format!("could not encode request: {e}"),
        })?;

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.map_reqwest(e))?;
        debug!("Endpoint replied HTTP {} with {} bytes", status, bytes.len());

        let body: ConvertResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Transport {
                detail: format!("invalid response from {} (HTTP {}): {}", self.url, status, e),
            })?;

        Ok(EndpointReply {
            http_ok: status.is_success(),
            body,
        })
    }

    fn map_reqwest(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            ClientError::Transport {
                detail: e.to_string(),
            }
        }
    }
}

impl ConvertTransport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a ConvertRequest,
    ) -> BoxFuture<'a, Result<EndpointReply, ClientError>> {
        Box::pin(self.post(request))
    }
}
