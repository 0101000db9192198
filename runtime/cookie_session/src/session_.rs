use biscotti::{RemovalCookie, ResponseCookie};
use errors::{FinalizeError, ValueDeserializationError, ValueSerializationError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::coder::SessionCoder;
use crate::incoming::IncomingSession;
use crate::{SessionConfig, SessionId, Signer, Transport};

/// The key used to store the [`SessionId`] in the session state.
pub const SESSION_ID_KEY: &str = "session_id";

#[derive(Clone, Debug)]
/// The current HTTP session.
///
/// The whole session state lives in the session cookie: there is no server-side
/// storage. Changes are sent back to the client when the response is finalized,
/// see [`SessionMiddleware`][crate::SessionMiddleware] for the details.
pub struct Session {
    state: State,
    /// `true` if the client sent a valid session cookie.
    has_incoming_cookie: bool,
}

#[derive(Debug, Clone)]
enum State {
    MarkedForDeletion,
    Unchanged { state: HashMap<String, Value> },
    Updated { state: HashMap<String, Value> },
}

impl Session {
    /// Create a new HTTP session.
    ///
    /// It is a continuation of the existing session if there was a valid session cookie
    /// attached to the request.
    /// It is a brand-new session otherwise, with a freshly generated [`SessionId`].
    pub fn new(incoming_session: Option<IncomingSession>) -> Self {
        let (mut state, has_incoming_cookie) = match incoming_session {
            Some(s) => (s.state, true),
            None => (HashMap::new(), false),
        };
        // Not a change: the id is part of the state the session starts with.
        state
            .entry(SESSION_ID_KEY.to_owned())
            .or_insert_with(|| Value::String(SessionId::random().to_string()));
        Self {
            state: State::Unchanged { state },
            has_incoming_cookie,
        }
    }

    /// The identifier of this session.
    ///
    /// It returns `None` if the session has been invalidated, if the application
    /// removed the [`SESSION_ID_KEY`] entry or if it doesn't hold a valid [`SessionId`].
    pub fn id(&self) -> Option<SessionId> {
        self.get_raw(SESSION_ID_KEY)?.as_str()?.parse().ok()
    }

    /// Get the value associated with `key` from the session state.
    ///
    /// If the value is not found, `None` is returned.
    /// If the value is found, but it cannot be deserialized into the expected type, an error is returned.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ValueDeserializationError> {
        self.get_raw(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| ValueDeserializationError {
                key: key.to_owned(),
                source: e,
            })
    }

    /// Get the raw JSON value associated with `key` from the session state.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        match &self.state {
            State::MarkedForDeletion => {
                tracing::trace!(session.key = %key, "Attempted to get a value on a session marked for deletion.");
                None
            }
            State::Unchanged { state } | State::Updated { state } => state.get(key),
        }
    }

    /// Set a value in the session state for the given key.
    ///
    /// If the key already exists, the value is updated and the old raw value is returned.
    /// If the value cannot be serialized, an error is returned.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<Value>, ValueSerializationError> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|e| ValueSerializationError {
            key: key.clone(),
            source: e,
        })?;
        Ok(self.insert_raw(key, value))
    }

    /// Set a raw JSON value in the session state for the given key.
    ///
    /// If the key already exists, the value is updated and the old value is returned.
    /// Setting a key to the value it already holds doesn't count as a change.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match &mut self.state {
            State::MarkedForDeletion => {
                tracing::trace!(session.key = %key, "Attempted to set a value on a session marked for deletion.");
                None
            }
            State::Updated { state } => state.insert(key, value),
            State::Unchanged { state } => {
                if state.get(&key) == Some(&value) {
                    return Some(value);
                }
                let old_value = state.insert(key, value);
                self.state = State::Updated {
                    state: std::mem::take(state),
                };
                old_value
            }
        }
    }

    /// Remove the value associated with `key` from the session state.
    ///
    /// If the key exists, the removed value is deserialized and returned.
    /// The value is removed even if it cannot be deserialized into the expected type.
    pub fn remove<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, ValueDeserializationError> {
        self.remove_raw(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ValueDeserializationError {
                key: key.to_owned(),
                source: e,
            })
    }

    /// Remove the value associated with `key` from the session state.
    ///
    /// If the key exists, the removed value is returned.
    pub fn remove_raw(&mut self, key: &str) -> Option<Value> {
        match &mut self.state {
            State::MarkedForDeletion => None,
            State::Updated { state } => state.remove(key),
            State::Unchanged { state } => {
                let value = state.remove(key)?;
                self.state = State::Updated {
                    state: std::mem::take(state),
                };
                Some(value)
            }
        }
    }

    /// Remove all key-value pairs from the session state, [`SESSION_ID_KEY`] included.
    ///
    /// This doesn't invalidate the session: you must invoke [`Session::invalidate`]
    /// if you want to delete the session cookie altogether.
    pub fn clear(&mut self) {
        match &mut self.state {
            State::MarkedForDeletion => {}
            State::Updated { state } => state.clear(),
            State::Unchanged { state } => {
                if !state.is_empty() {
                    self.state = State::Updated {
                        state: HashMap::new(),
                    };
                }
            }
        }
    }

    /// Returns `true` if there is a value associated with `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// The number of entries in the session state, [`SESSION_ID_KEY`] included.
    pub fn len(&self) -> usize {
        self.map().map(HashMap::len).unwrap_or(0)
    }

    /// Returns `true` if the session state has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the entries in the session state.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.map()
            .into_iter()
            .flat_map(|state| state.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// A copy of the session state.
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.map().cloned().unwrap_or_default()
    }

    /// Invalidate the session.
    ///
    /// The client will be asked to delete the session cookie, if it sent one.
    ///
    /// After calling this method, the session is considered invalid and should not be used anymore.
    /// All further operations on the session will be no-ops.
    pub fn invalidate(&mut self) {
        self.state = State::MarkedForDeletion;
    }

    /// Returns `true` if [`Session::invalidate`] has been called.
    pub fn is_invalidated(&self) -> bool {
        matches!(self.state, State::MarkedForDeletion)
    }

    /// Returns `true` if the session state has been modified since it was loaded.
    pub fn is_changed(&self) -> bool {
        matches!(self.state, State::Updated { .. })
    }

    fn map(&self) -> Option<&HashMap<String, Value>> {
        match &self.state {
            State::MarkedForDeletion => None,
            State::Unchanged { state } | State::Updated { state } => Some(state),
        }
    }

    /// Build the cookie that must be sent back to the client, if any.
    ///
    /// The size limit is enforced by the caller, on the rendered cookie.
    pub(crate) fn finalize<C: SessionCoder + ?Sized>(
        &self,
        config: &SessionConfig,
        signer: &Signer,
        coder: &C,
        transport: Transport,
    ) -> Result<Option<ResponseCookie<'static>>, FinalizeError> {
        let cookie_config = &config.cookie;
        let cookie_name = &cookie_config.name;

        let state = match &self.state {
            State::MarkedForDeletion => {
                // There is nothing to remove on the client-side.
                if !self.has_incoming_cookie {
                    return Ok(None);
                }
                None
            }
            State::Updated { state } => Some(state),
            State::Unchanged { state } => {
                if config.state.expire_after.is_none() {
                    return Ok(None);
                }
                Some(state)
            }
        };

        if cookie_config.secure && !transport.is_encrypted() {
            tracing::debug!(
                cookie.name = %cookie_name,
                "The session cookie is marked as secure, but the request \
                didn't arrive over an encrypted connection. The session cookie won't be sent."
            );
            return Ok(None);
        }

        let Some(state) = state else {
            let mut cookie = RemovalCookie::new(cookie_name.clone());
            if let Some(domain) = cookie_config.domain.as_deref() {
                cookie = cookie.set_domain(domain.to_owned());
            }
            if let Some(path) = cookie_config.path.as_deref() {
                cookie = cookie.set_path(path.to_owned());
            }
            return Ok(Some(cookie.into()));
        };

        let value = signer.sign(&coder.encode(state)?);
        let mut cookie = ResponseCookie::new(cookie_name.clone(), value);
        if let Some(domain) = cookie_config.domain.as_deref() {
            cookie = cookie.set_domain(domain.to_owned());
        }
        if let Some(path) = cookie_config.path.as_deref() {
            cookie = cookie.set_path(path.to_owned());
        }
        if let Some(same_site) = cookie_config.same_site {
            cookie = cookie.set_same_site(same_site);
        }
        if cookie_config.secure {
            cookie = cookie.set_secure(true);
        }
        if cookie_config.http_only {
            cookie = cookie.set_http_only(true);
        }
        if let Some(expire_after) = config.state.expire_after {
            let max_age = expire_after.try_into().unwrap_or(time::Duration::MAX);
            cookie = cookie.set_max_age(max_age);
        }
        Ok(Some(cookie))
    }
}

/// Errors that can occur when interacting with the session state.
pub mod errors {
    use crate::coder::errors::EncodeError;

    #[derive(Debug, thiserror::Error)]
    #[non_exhaustive]
    #[error("Failed to deserialize the value associated with `{key}`")]
    /// The error returned by [`Session::get`][super::Session::get] and [`Session::remove`][super::Session::remove].
    pub struct ValueDeserializationError {
        /// The key of the value that we failed to deserialize.
        pub key: String,
        #[source]
        /// The underlying deserialization error.
        pub source: serde_json::Error,
    }

    #[derive(Debug, thiserror::Error)]
    #[non_exhaustive]
    #[error("Failed to serialize the value associated with `{key}`")]
    /// The error returned by [`Session::insert`][super::Session::insert].
    pub struct ValueSerializationError {
        /// The key of the value that we failed to serialize.
        pub key: String,
        #[source]
        /// The underlying serialization error.
        pub source: serde_json::Error,
    }

    /// The error returned by [`SessionMiddleware::finalize`][crate::SessionMiddleware::finalize].
    ///
    /// Unlike a malformed session cookie, which is silently discarded, these errors
    /// point at a problem in the application and must not be ignored.
    #[derive(Debug, thiserror::Error)]
    #[non_exhaustive]
    pub enum FinalizeError {
        #[error("Failed to encode the session state")]
        Encoding(#[from] EncodeError),
        #[error(
            "The session cookie (`{cookie_name}`) would be {size} bytes long, exceeding the limit of {limit} bytes. \
            Store less data in the session."
        )]
        CookieTooLarge {
            /// The name of the session cookie.
            cookie_name: String,
            /// The size of the cookie name and value, as sent to the client.
            size: usize,
            /// The configured limit.
            limit: usize,
        },
        #[error("`{invalid_header_value}` is not a valid `Set-Cookie` header value")]
        InvalidHeaderValue {
            /// The rejected header value.
            invalid_header_value: String,
        },
    }

    impl FinalizeError {
        /// Convert the error into a response.
        pub fn into_response<B: Default>(&self) -> http::Response<B> {
            let mut response = http::Response::new(B::default());
            *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
