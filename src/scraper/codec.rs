//! Legacy text decoding for lottery pages
//!
//! kaijiang.500.com serves GB18030 pages. The decoder is built once from an
//! encoding label and owned by the scraper.

use encoding_rs::Encoding;
use thiserror::Error;

/// Default encoding of the lottery site
pub const DEFAULT_ENCODING: &str = "gb18030";

/// Decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("Malformed {encoding} byte sequence")]
    Malformed { encoding: &'static str },
}

/// Strict byte-to-text decoder for a single encoding
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    encoding: &'static Encoding,
}

impl TextDecoder {
    /// Create a decoder from a WHATWG encoding label (e.g. "gb18030", "gbk")
    pub fn new(label: &str) -> Result<Self, DecodeError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))?;

        Ok(Self { encoding })
    }

    /// Name of the underlying encoding
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decode bytes into text, rejecting malformed input instead of
    /// substituting replacement characters
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let (decoded, had_errors) = self.encoding.decode_without_bom_handling(bytes);

        if had_errors {
            return Err(DecodeError::Malformed {
                encoding: self.encoding.name(),
            });
        }

        Ok(decoded.into_owned())
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::GB18030,
        }
    }
}
