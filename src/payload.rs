//! Base64 → PDF bytes.
//!
//! The endpoint ships the rendered PDF as standard base64 inside JSON.
//! Decoding is as lenient as a browser's `atob`: ASCII whitespace is skipped
//! (line-wrapped encoders are common), padding is optional, and non-zero
//! trailing bits are ignored. The bytes are not validated as a PDF; a
//! missing `%PDF` header is only logged.

use crate::error::ClientError;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use tracing::{debug, warn};

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// MIME type of every payload this client downloads.
pub const PDF_MIME: &str = "application/pdf";

/// Decoded binary payload plus its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPayload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl PdfPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the bytes start with the `%PDF` magic.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

/// Decode a base64 payload into a [`PdfPayload`].
pub fn decode_pdf(encoded: &str) -> Result<PdfPayload, ClientError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| ClientError::InvalidPayload {
            detail: e.to_string(),
        })?;
    debug!("Decoded payload: {} base64 chars → {} bytes", compact.len(), bytes.len());

    let payload = PdfPayload {
        bytes,
        mime: PDF_MIME,
    };
    if !payload.looks_like_pdf() {
        warn!("Decoded payload does not start with %PDF; saving it anyway");
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hello() {
        let p = decode_pdf("SGVsbG8=").unwrap();
        assert_eq!(p.bytes, b"Hello");
        assert_eq!(p.mime, "application/pdf");
        assert!(!p.looks_like_pdf());
    }

    #[test]
    fn ignores_line_wrapping() {
        let p = decode_pdf("JVBE\nRi0x\r\nLjQK ").unwrap();
        assert_eq!(p.bytes, b"%PDF-1.4\n");
        assert!(p.looks_like_pdf());
    }

    #[test]
    fn padding_is_optional() {
        assert_eq!(decode_pdf("SGVsbG8").unwrap().bytes, b"Hello");
        assert_eq!(decode_pdf("JVBERi0xLjQK").unwrap().bytes, b"%PDF-1.4\n");
    }

    #[test]
    fn nonzero_trailing_bits_are_ignored() {
        assert_eq!(decode_pdf("SGVsbG9=").unwrap().bytes, b"Hello");
    }

    #[test]
    fn empty_payload_is_empty_file() {
        let p = decode_pdf("").unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn garbage_is_a_transport_error() {
        let err = decode_pdf("not*base64!").unwrap_err();
        assert!(matches!(err, ClientError::InvalidPayload { .. }));
        assert!(err.to_string().starts_with("Network error:"));
    }
}
