use serde_json::Value;
use std::collections::HashMap;

use super::errors::{DecodeError, EncodeError};

/// The serialization stage of a [`LayeredCoder`](super::LayeredCoder).
pub trait Format: Send + Sync {
    /// Serialize the session state into bytes.
    fn serialize(&self, state: &HashMap<String, Value>) -> Result<Vec<u8>, EncodeError>;

    /// Deserialize the session state from bytes.
    ///
    /// Anything that isn't a map with string keys must be rejected.
    fn deserialize(&self, bytes: &[u8]) -> Result<HashMap<String, Value>, DecodeError>;
}

/// Serialize the session state as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Format for Json {
    fn serialize(&self, state: &HashMap<String, Value>) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(state).map_err(EncodeError::new)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<HashMap<String, Value>, DecodeError> {
        serde_json::from_slice(bytes).map_err(DecodeError::deserialization)
    }
}
