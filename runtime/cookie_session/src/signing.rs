use hmac::{Hmac, Mac};
use redact::Secret;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The token joining the payload and its digest in a signed cookie value.
pub const SEPARATOR: &str = "--";

#[derive(Clone)]
/// Sign session cookie values and verify their integrity.
///
/// A signed value has the form `<payload>--<digest>`, where `<digest>` is the
/// hex-encoded HMAC-SHA256 of `<payload>` under the configured secret.
///
/// Without a secret, the signer is a passthrough: values are emitted as they
/// are and trusted as they come.
pub struct Signer {
    key: Option<HmacSha256>,
}

impl Signer {
    /// Build a signer for the given secret.
    ///
    /// An empty secret is treated as a missing one.
    pub fn new(secret: Option<&Secret<String>>) -> Self {
        let secret = secret.map(|s| s.expose_secret().as_bytes());
        let key = match secret {
            Some([]) => {
                tracing::warn!(
                    "The session secret is empty. Session cookies won't be signed, \
                    the client-side state can be tampered with."
                );
                None
            }
            Some(secret) => match HmacSha256::new_from_slice(secret) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::error!(
                        error.message = %e,
                        "The session secret can't be used as an HMAC key. Session cookies won't be signed."
                    );
                    None
                }
            },
            None => None,
        };
        Self { key }
    }

    /// A signer that neither signs nor verifies.
    pub fn unsigned() -> Self {
        Self { key: None }
    }

    /// `true` if a secret has been configured.
    pub fn is_signing(&self) -> bool {
        self.key.is_some()
    }

    /// Append the digest of `payload` to it.
    pub fn sign(&self, payload: &str) -> String {
        match &self.key {
            Some(key) => {
                let mut mac = key.clone();
                mac.update(payload.as_bytes());
                let digest = hex::encode(mac.finalize().into_bytes());
                format!("{payload}{SEPARATOR}{digest}")
            }
            None => payload.to_owned(),
        }
    }

    /// Check the digest attached to `value` and return the payload it covers.
    ///
    /// The comparison runs in constant time.
    pub fn verify<'a>(&self, value: &'a str) -> Result<&'a str, VerificationError> {
        let Some(key) = &self.key else {
            return Ok(value);
        };
        let (payload, digest) = value
            .rsplit_once(SEPARATOR)
            .ok_or(VerificationError::MissingDigest)?;
        let digest = hex::decode(digest).map_err(VerificationError::MalformedDigest)?;
        let mut mac = key.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&digest)
            .map_err(|_| VerificationError::DigestMismatch)?;
        Ok(payload)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("is_signing", &self.is_signing())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`Signer::verify`].
pub enum VerificationError {
    #[error("The session cookie is not signed")]
    MissingDigest,
    #[error("The digest attached to the session cookie is not valid hex")]
    MalformedDigest(#[source] hex::FromHexError),
    #[error("The digest attached to the session cookie doesn't match its content")]
    DigestMismatch,
}
