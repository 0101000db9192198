use http::uri::Scheme;

/// The kind of connection an incoming request arrived on.
///
/// It determines whether a session cookie configured as
/// [`secure`](crate::config::SessionCookieConfig::secure) can be sent back.
///
/// # Resolution
///
/// [`Transport::of`] looks at, in order:
///
/// 1. a [`Transport`] value in the request extensions. A server that terminates
///    TLS itself should insert [`Transport::Encrypted`] there;
/// 2. the scheme of the request URI, if it's absolute;
/// 3. the `X-Forwarded-Proto` and `X-Forwarded-Ssl` headers set by a reverse proxy.
///
/// If none of them says otherwise, the connection is assumed to be plaintext.
///
/// # Security
///
/// `X-Forwarded-Proto` and `X-Forwarded-Ssl` are set by the client as easily as
/// by a proxy: a plaintext client can send them to obtain a `secure` session cookie.
/// Only rely on them if every request goes through a reverse proxy that overwrites
/// those headers. Otherwise, insert a [`Transport`] value in the request extensions:
/// it takes precedence over the headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Plain,
    Encrypted,
}

impl Transport {
    /// Determine the transport used by `request`.
    pub fn of<B>(request: &http::Request<B>) -> Self {
        if let Some(transport) = request.extensions().get::<Transport>() {
            return *transport;
        }
        if let Some(scheme) = request.uri().scheme() {
            return if scheme == &Scheme::HTTPS {
                Transport::Encrypted
            } else {
                Transport::Plain
            };
        }
        let headers = request.headers();
        let forwarded_proto = headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            // A chain of proxies produces a comma-separated list.
            // The first entry was set by the proxy closest to the client.
            .and_then(|v| v.split(',').next())
            .map(str::trim);
        if let Some(proto) = forwarded_proto {
            if proto.eq_ignore_ascii_case("https") {
                return Transport::Encrypted;
            }
        }
        let forwarded_ssl = headers
            .get("x-forwarded-ssl")
            .and_then(|h| h.to_str().ok());
        if forwarded_ssl.is_some_and(|v| v.eq_ignore_ascii_case("on")) {
            return Transport::Encrypted;
        }
        Transport::Plain
    }

    pub fn is_encrypted(self) -> bool {
        self == Transport::Encrypted
    }
}
