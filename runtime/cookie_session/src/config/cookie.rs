use biscotti::SameSite;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
/// Configure the cookie that carries the session state.
pub struct SessionCookieConfig {
    /// The name of the session cookie.
    ///
    /// By default, the name is set to `session`.
    #[serde(default = "default_session_cookie_name")]
    pub name: String,
    /// Set the `Domain` attribute on the session cookie.
    ///
    /// By default, the attribute is not set.
    #[serde(default)]
    pub domain: Option<String>,
    /// Set the `Path` attribute on the session cookie.
    ///
    /// By default, the attribute is set to `/`.
    #[serde(default = "default_session_cookie_path")]
    pub path: Option<String>,
    /// Only emit the session cookie over an encrypted transport.
    ///
    /// When `true`, the cookie is marked as `Secure` and it is **not** sent at all
    /// if the current request arrived over a plaintext connection, even if the
    /// session state changed.
    /// Check out [`Transport`] for how the transport is determined.
    ///
    /// Default is `false`.
    ///
    /// [`Transport`]: crate::Transport
    #[serde(default)]
    pub secure: bool,
    /// Set the `HttpOnly` attribute on the session cookie.
    ///
    /// If the cookie is marked as `HttpOnly`, it will not be visible to JavaScript
    /// snippets running in the browser.
    ///
    /// Default is `true`.
    #[serde(default = "default_session_cookie_http_only")]
    pub http_only: bool,
    /// Set the [`SameSite`] attribute on the session cookie.
    ///
    /// By default, the attribute is set to [`SameSite::Lax`].
    #[serde(default = "default_session_cookie_same_site")]
    #[serde(with = "same_site")]
    pub same_site: Option<SameSite>,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: default_session_cookie_name(),
            domain: None,
            path: default_session_cookie_path(),
            secure: false,
            http_only: default_session_cookie_http_only(),
            same_site: default_session_cookie_same_site(),
        }
    }
}

fn default_session_cookie_name() -> String {
    "session".to_string()
}

fn default_session_cookie_http_only() -> bool {
    true
}

fn default_session_cookie_path() -> Option<String> {
    Some("/".to_string())
}

fn default_session_cookie_same_site() -> Option<SameSite> {
    Some(SameSite::Lax)
}

// `biscotti::SameSite` doesn't implement `serde` traits.
mod same_site {
    use biscotti::SameSite;
    use serde::{Deserializer, Serializer, de};
    use std::fmt;

    pub fn serialize<S>(value: &Option<SameSite>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(same_site) => {
                let same_site = match same_site {
                    SameSite::Strict => "Strict",
                    SameSite::Lax => "Lax",
                    SameSite::None => "None",
                };
                serializer.serialize_some(same_site)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SameSite>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SameSiteVisitor;

        impl<'de> de::Visitor<'de> for SameSiteVisitor {
            type Value = Option<SameSite>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("one of `Strict`, `Lax`, `None` or null")
            }

            fn visit_str<E>(self, value: &str) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                if value.eq_ignore_ascii_case("strict") {
                    Ok(Some(SameSite::Strict))
                } else if value.eq_ignore_ascii_case("lax") {
                    Ok(Some(SameSite::Lax))
                } else if value.eq_ignore_ascii_case("none") {
                    Ok(Some(SameSite::None))
                } else {
                    Err(de::Error::unknown_variant(
                        value,
                        &["Strict", "Lax", "None"],
                    ))
                }
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Option<SameSite>, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_str(self)
            }

            fn visit_none<E>(self) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                Ok(None)
            }
        }

        deserializer.deserialize_option(SameSiteVisitor)
    }
}
