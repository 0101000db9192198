use std::time::Duration;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
/// Configure how the session state is persisted in the session cookie.
pub struct SessionStateConfig {
    /// How long the session cookie should be kept by the client.
    ///
    /// When set, the session cookie is re-issued on **every** response,
    /// even if the session state wasn't touched, to push the expiration
    /// forward. The value is used to set the `Max-Age` attribute.
    ///
    /// When unset, the session cookie is only sent when the session state
    /// changes, and it expires when the browser session ends.
    ///
    /// # Default
    ///
    /// By default, it's unset.
    #[serde(with = "humantime_serde", default)]
    pub expire_after: Option<Duration>,
    /// The maximum size, in bytes, of the session cookie (name and value),
    /// measured after the value has been percent-encoded.
    ///
    /// Browsers are only required to store cookies up to 4096 bytes.
    /// Finalizing a session whose cookie would exceed this limit
    /// fails with [`FinalizeError::CookieTooLarge`].
    ///
    /// # Default
    ///
    /// 4096 bytes.
    ///
    /// [`FinalizeError::CookieTooLarge`]: crate::errors::FinalizeError::CookieTooLarge
    #[serde(default = "default_max_cookie_size")]
    pub max_cookie_size: usize,
}

impl Default for SessionStateConfig {
    fn default() -> Self {
        Self {
            expire_after: None,
            max_cookie_size: default_max_cookie_size(),
        }
    }
}

fn default_max_cookie_size() -> usize {
    4096
}
