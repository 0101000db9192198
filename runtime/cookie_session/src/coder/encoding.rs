use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::errors::{DecodeError, EncodeError};

/// The transport stage of a [`LayeredCoder`](super::LayeredCoder): it turns
/// serialized bytes into a string that can be used as a cookie value.
pub trait TextEncoding: Send + Sync {
    fn encode(&self, bytes: Vec<u8>) -> Result<String, EncodeError>;

    fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError>;
}

/// Standard base64, with padding.
///
/// The standard alphabet doesn't include `-`, so the output can never be
/// confused with the separator used by [`Signer`](crate::Signer).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64;

impl TextEncoding for Base64 {
    fn encode(&self, bytes: Vec<u8>) -> Result<String, EncodeError> {
        Ok(STANDARD.encode(bytes))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        STANDARD
            .decode(text)
            .map_err(|e| DecodeError::encoding("base64", e))
    }
}

/// Use the serialized bytes as they are, provided they are valid UTF-8.
///
/// Characters that aren't allowed in a cookie value (e.g. `;` or `"`) are
/// percent-encoded by the cookie processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl TextEncoding for Verbatim {
    fn encode(&self, bytes: Vec<u8>) -> Result<String, EncodeError> {
        String::from_utf8(bytes).map_err(EncodeError::new)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(text.as_bytes().to_vec())
    }
}
