use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cookie_session::{
    SessionConfig, SessionMiddleware,
    coder::{DefaultCoder, SessionCoder},
    errors::{DecodeError, EncodeError},
};
use serde_json::Value;

/// A middleware with the default coder.
pub fn middleware(config: SessionConfig) -> SessionMiddleware {
    SessionMiddleware::new(config)
}

/// A middleware with the default coder, with a mechanism to inspect
/// what calls were made to it.
pub fn spy_middleware(
    config: SessionConfig,
) -> (SessionMiddleware<SpyCoder<DefaultCoder>>, CallTracker) {
    let coder = SpyCoder::new(DefaultCoder::default());
    let call_tracker = coder.call_tracker();
    (SessionMiddleware::with_coder(config, coder), call_tracker)
}

/// A configuration that signs the session cookie.
pub fn signed_config() -> SessionConfig {
    SessionConfig::default().with_secret("test")
}

/// A wrapper that keeps track of which methods have been called
/// on the underlying coder.
#[derive(Debug)]
pub struct SpyCoder<C> {
    coder: C,
    call_tracker: CallTracker,
}

impl<C> SpyCoder<C> {
    pub fn new(coder: C) -> Self {
        Self {
            coder,
            call_tracker: Default::default(),
        }
    }

    pub fn call_tracker(&self) -> CallTracker {
        self.call_tracker.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallTracker(Arc<Mutex<Vec<&'static str>>>);

impl CallTracker {
    pub fn operation_log(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    fn push_operation(&self, op: &'static str) {
        self.0.lock().unwrap().push(op);
    }
}

impl<C: SessionCoder> SessionCoder for SpyCoder<C> {
    fn encode(&self, state: &HashMap<String, Value>) -> Result<String, EncodeError> {
        self.call_tracker.push_operation("encode");
        self.coder.encode(state)
    }

    fn decode(&self, value: &str) -> Result<HashMap<String, Value>, DecodeError> {
        self.call_tracker.push_operation("decode");
        self.coder.decode(value)
    }
}
