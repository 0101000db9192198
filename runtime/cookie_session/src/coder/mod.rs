//! Turn the session state into a cookie value, and back.
//!
//! The entry point is the [`SessionCoder`] trait.
//! The default implementation, [`DefaultCoder`], is built out of two independent stages:
//!
//! - a [`Format`], to serialize the session state into bytes (e.g. [`Json`]);
//! - a [`TextEncoding`], to turn those bytes into a string that can be safely
//!   embedded in a cookie (e.g. [`Base64`]).
//!
//! You can swap either stage via [`LayeredCoder`], or implement [`SessionCoder`]
//! directly if you need full control over the cookie value.
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

mod encoding;
mod format;

pub use encoding::{Base64, TextEncoding, Verbatim};
pub use format::{Format, Json};

use errors::{DecodeError, EncodeError};

/// Convert the session state to and from its cookie representation.
///
/// # Failure policy
///
/// Cookie values are provided by the client and must be treated as untrusted.
/// [`decode`](SessionCoder::decode) must never panic on malformed input: return
/// an error instead. The caller will discard the cookie and start a fresh session.
pub trait SessionCoder: Send + Sync {
    /// Encode the session state into a cookie value.
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError>;

    /// Decode a cookie value back into the session state.
    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError>;
}

impl<C: SessionCoder + ?Sized> SessionCoder for &C {
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError> {
        (**self).encode(state)
    }

    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError> {
        (**self).decode(value)
    }
}

impl<C: SessionCoder + ?Sized> SessionCoder for Box<C> {
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError> {
        (**self).encode(state)
    }

    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError> {
        (**self).decode(value)
    }
}

impl<C: SessionCoder + ?Sized> SessionCoder for Arc<C> {
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError> {
        (**self).encode(state)
    }

    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError> {
        (**self).decode(value)
    }
}

/// A [`SessionCoder`] that serializes the state with a [`Format`] and then
/// renders the resulting bytes as text with a [`TextEncoding`].
#[derive(Debug, Clone, Default)]
pub struct LayeredCoder<F, E> {
    format: F,
    encoding: E,
}

/// The coder used by [`SessionMiddleware::new`][crate::SessionMiddleware::new]:
/// JSON, encoded as standard base64.
pub type DefaultCoder = LayeredCoder<Json, Base64>;

impl<F, E> LayeredCoder<F, E> {
    /// Combine a serialization format with a text encoding.
    pub fn new(format: F, encoding: E) -> Self {
        Self { format, encoding }
    }
}

impl<F: Format, E: TextEncoding> SessionCoder for LayeredCoder<F, E> {
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError> {
        let bytes = self.format.serialize(state)?;
        self.encoding.encode(bytes)
    }

    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError> {
        let bytes = self.encoding.decode(value)?;
        self.format.deserialize(&bytes)
    }
}

/// Errors that can occur when encoding or decoding the session state.
pub mod errors {
    type BoxError = Box<dyn std::error::Error + Send + Sync>;

    #[derive(Debug, thiserror::Error)]
    #[error("Failed to encode the session state")]
    /// The error returned by [`SessionCoder::encode`][super::SessionCoder::encode].
    pub struct EncodeError(#[source] BoxError);

    impl EncodeError {
        pub fn new(source: impl Into<BoxError>) -> Self {
            Self(source.into())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[non_exhaustive]
    /// The error returned by [`SessionCoder::decode`][super::SessionCoder::decode].
    pub enum DecodeError {
        #[error("The session cookie is not valid {encoding}")]
        Encoding {
            /// The name of the text encoding that rejected the value.
            encoding: &'static str,
            #[source]
            source: BoxError,
        },
        #[error("Failed to deserialize the session state")]
        Deserialization(#[source] BoxError),
    }

    impl DecodeError {
        pub fn encoding(encoding: &'static str, source: impl Into<BoxError>) -> Self {
            Self::Encoding {
                encoding,
                source: source.into(),
            }
        }

        pub fn deserialization(source: impl Into<BoxError>) -> Self {
            Self::Deserialization(source.into())
        }
    }
}
