use biscotti::{Processor, ProcessorConfig, RequestCookies, ResponseCookies};
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Request, Response};
use tracing_log_error::log_error;

use crate::coder::{DefaultCoder, SessionCoder};
use crate::errors::FinalizeError;
use crate::{IncomingSession, Session, SessionConfig, Signer, Transport};

/// Load the session state from the incoming request and persist it
/// in the outgoing response.
///
/// # Lifecycle
///
/// 1. [`load`](Self::load) reads the session cookie, verifies its signature (if a
///    secret is configured) and decodes it. If anything goes wrong, a fresh
///    session is created instead.
/// 2. The request handler reads and modifies the [`Session`].
/// 3. [`finalize`](Self::finalize) decides whether the session cookie must be sent
///    back to the client:
///    - if the session was invalidated, a removal cookie is sent;
///    - if the session state changed, or if
///      [`expire_after`](crate::config::SessionStateConfig::expire_after) is set,
///      the state is encoded, signed and sent;
///    - nothing is sent otherwise. Reading the session state doesn't count as a change.
///
///    A cookie configured as [`secure`](crate::config::SessionCookieConfig::secure)
///    is never sent over a plaintext connection.
///    A cookie that would exceed
///    [`max_cookie_size`](crate::config::SessionStateConfig::max_cookie_size) once
///    percent-encoded is an error.
///
/// [`call`](Self::call) runs the whole lifecycle around a request handler.
///
/// # Example
///
/// ```rust
/// use cookie_session::{Session, SessionConfig, SessionMiddleware};
/// use http::{Request, Response};
///
/// let middleware = SessionMiddleware::new(SessionConfig::default());
/// let request = Request::get("/").body(()).unwrap();
/// let response = middleware
///     .call(request, |_request, session: &mut Session| {
///         let visits: u64 = session.get("visits").unwrap().unwrap_or(0);
///         session.insert("visits", visits + 1).unwrap();
///         Response::new(format!("Visit #{}", visits + 1))
///     })
///     .unwrap();
/// assert!(response.headers().contains_key("set-cookie"));
/// ```
pub struct SessionMiddleware<C = DefaultCoder> {
    config: SessionConfig,
    signer: Signer,
    coder: C,
    processor: Processor,
}

impl SessionMiddleware<DefaultCoder> {
    /// Create a new middleware that encodes the session state using the [`DefaultCoder`].
    pub fn new(config: SessionConfig) -> Self {
        Self::with_coder(config, DefaultCoder::default())
    }
}

impl<C: SessionCoder> SessionMiddleware<C> {
    /// Create a new middleware with a custom [`SessionCoder`].
    pub fn with_coder(config: SessionConfig, coder: C) -> Self {
        let signer = Signer::new(config.secret.as_ref());
        Self {
            config,
            signer,
            coder,
            processor: ProcessorConfig::default().into(),
        }
    }

    /// The configuration this middleware was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The coder used to encode and decode the session state.
    pub fn coder(&self) -> &C {
        &self.coder
    }

    /// The signer derived from the configured [`secret`](SessionConfig::secret).
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Build the [`Session`] for the incoming request.
    pub fn load<B>(&self, request: &Request<B>) -> Session {
        let cookies = request_cookies(request.headers(), &self.processor);
        let incoming = IncomingSession::extract(&cookies, &self.config, &self.signer, &self.coder);
        Session::new(incoming)
    }

    /// Attach the session cookie to the outgoing response, if needed.
    ///
    /// `transport` must describe the connection the request arrived on,
    /// see [`Transport::of`].
    pub fn finalize<B>(
        &self,
        transport: Transport,
        mut response: Response<B>,
        session: &Session,
    ) -> Result<Response<B>, FinalizeError> {
        let Some(cookie) = session.finalize(&self.config, &self.signer, &self.coder, transport)?
        else {
            return Ok(response);
        };
        let mut response_cookies = ResponseCookies::new();
        response_cookies.insert(cookie);
        let limit = self.config.state.max_cookie_size;
        for value in response_cookies.header_values(&self.processor) {
            let size = rendered_size(&value);
            if size > limit {
                let e = FinalizeError::CookieTooLarge {
                    cookie_name: self.config.cookie.name.clone(),
                    size,
                    limit,
                };
                log_error!(e, "The session state doesn't fit in the session cookie");
                return Err(e);
            }
            let value = HeaderValue::from_str(&value).map_err(|_| {
                FinalizeError::InvalidHeaderValue {
                    invalid_header_value: value,
                }
            })?;
            response.headers_mut().append(SET_COOKIE, value);
        }
        Ok(response)
    }

    /// Run `handler` with the session attached to `request`, then finalize the session.
    pub fn call<B, R, H>(&self, request: Request<B>, handler: H) -> Result<Response<R>, FinalizeError>
    where
        H: FnOnce(Request<B>, &mut Session) -> Response<R>,
    {
        let transport = Transport::of(&request);
        let mut session = self.load(&request);
        let response = handler(request, &mut session);
        self.finalize(transport, response, &session)
    }
}

impl<C> std::fmt::Debug for SessionMiddleware<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMiddleware")
            .field("config", &self.config)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

/// The length of the cookie name and value in a `Set-Cookie` header value.
///
/// It's measured after the processor has percent-encoded the value, since that's
/// what the client will have to store.
fn rendered_size(header_value: &str) -> usize {
    let pair = header_value
        .split_once(';')
        .map_or(header_value, |(pair, _)| pair);
    match pair.split_once('=') {
        Some((name, value)) => name.trim().len() + value.trim().len(),
        None => pair.trim().len(),
    }
}

/// Parse the cookies attached to the incoming request.
///
/// Malformed `Cookie` headers are logged and ignored: the request is processed
/// as if no cookie had been sent.
fn request_cookies<'request>(
    headers: &'request HeaderMap,
    processor: &Processor,
) -> RequestCookies<'request> {
    let cookie_headers = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| match h.to_str() {
            Ok(h) => Some(h),
            Err(e) => {
                log_error!(e, level: tracing::Level::WARN, "A `Cookie` header is not valid UTF-8, ignoring it");
                None
            }
        })
        .collect::<Vec<_>>();
    match RequestCookies::parse_headers(cookie_headers.into_iter(), processor) {
        Ok(cookies) => cookies,
        Err(e) => {
            log_error!(e, level: tracing::Level::WARN, "The request cookies are invalid, ignoring them");
            RequestCookies::new()
        }
    }
}
