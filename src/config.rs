//! Configuration types for the conversion client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The two conversion options, [`PageSize`] and
//! [`Orientation`], live here too since they are read from the config at
//! submission time.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Path of the conversion endpoint, relative to [`ClientConfig::endpoint`].
pub const CONVERT_PATH: &str = "/api/convert_to_pdf";

/// Configuration for a conversion client.
///
/// # Example
/// ```rust
/// use html2pdf_client::{ClientConfig, Orientation, PageSize};
///
/// let config = ClientConfig::builder()
///     .endpoint("https://convert.example.com")
///     .page_size(PageSize::Letter)
///     .orientation(Orientation::Landscape)
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint_url(), "https://convert.example.com/api/convert_to_pdf");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the conversion service. Default: `http://localhost:7071`.
    pub endpoint: String,

    /// Page size sent with every request. Default: A4.
    pub page_size: PageSize,

    /// Page orientation sent with every request. Default: portrait.
    pub orientation: Orientation,

    /// `filename` field of the request body. Default: `converted.pdf`.
    pub filename: String,

    /// Directory downloaded PDFs are written to. Default: current directory.
    pub output_dir: PathBuf,

    /// Quiet period before a content change re-renders the preview. Default: 500.
    pub debounce_ms: u64,

    /// How long a success status stays visible before fading. Default: 5000.
    pub success_status_ms: u64,

    /// Length of the fade between a success status expiring and its removal. Default: 300.
    pub status_fade_ms: u64,

    /// Per-request timeout for the conversion call, in seconds. Default: 120.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7071".to_string(),
            page_size: PageSize::default(),
            orientation: Orientation::default(),
            filename: "converted.pdf".to_string(),
            output_dir: PathBuf::from("."),
            debounce_ms: 500,
            success_status_ms: 5000,
            status_fade_ms: 300,
            request_timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the conversion endpoint.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), CONVERT_PATH)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn success_status_lifetime(&self) -> Duration {
        Duration::from_millis(self.success_status_ms)
    }

    pub fn status_fade(&self) -> Duration {
        Duration::from_millis(self.status_fade_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.config.filename = name.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    pub fn success_status_ms(mut self, ms: u64) -> Self {
        self.config.success_status_ms = ms;
        self
    }

    pub fn status_fade_ms(mut self, ms: u64) -> Self {
        self.config.status_fade_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let c = &self.config;
        let endpoint = c.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "endpoint must be an http:// or https:// URL, got '{}'",
                c.endpoint
            )));
        }
        if c.filename.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "filename must not be empty".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [
        PageSize::A3,
        PageSize::A4,
        PageSize::A5,
        PageSize::Letter,
        PageSize::Legal,
    ];

    /// The value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSize {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PageSize::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ClientError::InvalidConfig(format!(
                    "unknown page size '{s}' (expected one of A3, A4, A5, Letter, Legal)"
                ))
            })
    }
}

/// Page orientation requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// The value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(ClientError::InvalidConfig(format!(
                "unknown orientation '{s}' (expected portrait or landscape)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_page() {
        let c = ClientConfig::default();
        assert_eq!(c.page_size, PageSize::A4);
        assert_eq!(c.orientation, Orientation::Portrait);
        assert_eq!(c.filename, "converted.pdf");
        assert_eq!(c.debounce(), Duration::from_millis(500));
        assert_eq!(c.success_status_lifetime(), Duration::from_secs(5));
        assert_eq!(c.status_fade(), Duration::from_millis(300));
    }

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        let c = ClientConfig::builder()
            .endpoint("http://host:8080/")
            .build()
            .unwrap();
        assert_eq!(c.endpoint_url(), "http://host:8080/api/convert_to_pdf");
    }

    #[test]
    fn build_rejects_non_http_endpoint() {
        let err = ClientConfig::builder()
            .endpoint("ftp://host")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_blank_filename() {
        assert!(ClientConfig::builder().filename("  ").build().is_err());
    }

    #[test]
    fn timeout_is_clamped_to_one_second() {
        let c = ClientConfig::builder()
            .request_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.request_timeout_secs, 1);
    }

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert_eq!(" a4 ".parse::<PageSize>().unwrap(), PageSize::A4);
        assert!("tabloid".parse::<PageSize>().is_err());
    }

    #[test]
    fn orientation_parses_and_displays() {
        let o: Orientation = "Landscape".parse().unwrap();
        assert_eq!(o, Orientation::Landscape);
        assert_eq!(o.to_string(), "landscape");
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn options_serialise_to_wire_values() {
        assert_eq!(serde_json::to_string(&PageSize::Legal).unwrap(), "\"Legal\"");
        assert_eq!(
            serde_json::to_string(&Orientation::Portrait).unwrap(),
            "\"portrait\""
        );
    }
}
