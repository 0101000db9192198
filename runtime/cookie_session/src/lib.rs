/*!
Client-side HTTP sessions, stored in a cookie.

# Why do we need sessions?

The HTTP protocol, at a first glance, is stateless: the client sends a request, the server
parses its content, performs some processing and returns a response. The outcome is only
influenced by the provided inputs (i.e. the request content) and whatever state the server
queries while performing its processing.

**Sessions** allow the server to attach state to a set of requests coming from the same client.
They are built on top of cookies: the server sets a cookie in the HTTP response (`Set-Cookie`
header), the client (e.g. the browser) stores the cookie and sends it back to the server whenever
it issues new requests (using the `Cookie` header).

# Cookie-only sessions

This crate keeps the **whole** session state inside the session cookie.
There is no storage backend to provision, at the cost of:

- a size limit. Browsers only guarantee 4096 bytes per cookie;
- visibility. The client can read the session state. Don't store secrets in it!

The client can't modify the session state without being noticed, though, as long as you configure
a [`secret`](SessionConfig::secret): the cookie value is signed with HMAC-SHA256 and any
cookie that fails verification is discarded.

# Anatomy of the session cookie

The cookie value is `<payload>--<digest>`:

- `<payload>` is the session state, encoded by a [`SessionCoder`](coder::SessionCoder).
  By default, the state is serialized as JSON and then encoded as base64;
- `<digest>` is the hex-encoded HMAC of the payload. It's omitted if no secret is configured.

The session state always includes a [`SessionId`], stored under [`SESSION_ID_KEY`].

# Failure modes

A malformed, truncated or tampered-with session cookie is never an error: it is logged
and replaced by a fresh session.
A session state that doesn't fit into a cookie, on the other hand, is a bug in the
application and [`SessionMiddleware::finalize`] fails with
[`FinalizeError::CookieTooLarge`](errors::FinalizeError::CookieTooLarge).

## References

Further reading on sessions:
- [RFC 6265](https://datatracker.ietf.org/doc/html/rfc6265);
- [OWASP's session management cheat-sheet](https://cheatsheetseries.owasp.org/cheatsheets/Session_Management_Cheat_Sheet.html).
*/
pub mod coder;
pub mod config;
mod id;
mod incoming;
mod middleware;
mod session_;
mod signing;
mod transport;

pub use id::SessionId;
pub use incoming::IncomingSession;
pub use middleware::SessionMiddleware;
pub use session_::{SESSION_ID_KEY, Session};
pub use signing::{SEPARATOR, Signer};
pub use transport::Transport;

pub mod errors {
    //! All the errors that can be returned by this crate.
    pub use crate::coder::errors::{DecodeError, EncodeError};
    pub use crate::session_::errors::*;
    pub use crate::signing::VerificationError;
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
/// Configure how sessions are managed.
pub struct SessionConfig {
    /// The key used to sign the session cookie.
    ///
    /// If unset, the session cookie is not signed and the client can change the
    /// session state at will. Always set a secret in production.
    #[serde(serialize_with = "redact::expose_secret", default)]
    pub secret: Option<redact::Secret<String>>,
    #[serde(default)]
    /// Configure the session cookie.
    pub cookie: crate::config::SessionCookieConfig,
    #[serde(default)]
    /// Configure how the session state should behave.
    pub state: crate::config::SessionStateConfig,
}

impl SessionConfig {
    /// Create a new session configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key used to sign the session cookie.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(redact::Secret::new(secret.into()));
        self
    }
}
