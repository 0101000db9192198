use crate::coder::SessionCoder;
use crate::{SessionConfig, Signer};
use biscotti::RequestCookies;
use serde_json::Value;
use std::collections::HashMap;
use tracing_log_error::log_error;

/// The session state attached to the incoming request.
///
/// Built using [`IncomingSession::extract`].
pub struct IncomingSession {
    pub(crate) state: HashMap<String, Value>,
}

impl IncomingSession {
    /// Extract the session state from the session cookie attached to the incoming request.
    ///
    /// The cookie value goes through [`Signer::verify`] first, then through
    /// [`SessionCoder::decode`].
    /// If the cookie is missing, or if either step fails, this method returns `None`:
    /// the caller should start a fresh session. Invalid cookies are logged, but they
    /// are otherwise indistinguishable from missing ones.
    ///
    /// The coder is invoked exactly once, whether a cookie was found or not.
    /// An absent or unverified cookie is decoded as an empty value.
    pub fn extract<C: SessionCoder + ?Sized>(
        cookies: &RequestCookies<'_>,
        config: &SessionConfig,
        signer: &Signer,
        coder: &C,
    ) -> Option<Self> {
        let cookie = cookies.get(&config.cookie.name);
        let payload = cookie
            .as_ref()
            .and_then(|cookie| match signer.verify(cookie.value()) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    log_error!(
                        e,
                        level: tracing::Level::WARN,
                        "The session cookie failed the integrity check, creating a new session."
                    );
                    None
                }
            });
        let decoded = coder.decode(payload.unwrap_or_default());
        if payload.is_none() {
            return None;
        }
        match decoded {
            Ok(state) => Some(Self { state }),
            Err(e) => {
                log_error!(
                    e,
                    level: tracing::Level::WARN,
                    "Invalid session state in the session cookie, creating a new session."
                );
                None
            }
        }
    }

    /// Build an [`IncomingSession`] from a session state you already hold.
    pub fn from_parts(state: HashMap<String, Value>) -> Self {
        Self { state }
    }
}
