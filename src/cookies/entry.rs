//! The physical cookie record.
//!
//! A [`CookieEntry`] is what a store adapter actually holds: one name, one already
//! encoded value and an absolute expiry. Logical values that are too large for a
//! single entry are spread over several entries by the [`Chunker`](super::Chunker).

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// SameSite policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A cookie as held by a [`CookieStore`](super::CookieStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEntry {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Encoded value, exactly as it travels in the header.
    pub value: String,

    /// Absolute expiry. The entry is gone once this point has been reached.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Path scoping (e.g., `"/"`).
    pub path: Option<String>,

    /// Domain scoping (host-only if `None`).
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,

    pub same_site: Option<SameSite>,
}

impl CookieEntry {
    /// Creates a host-only, non-secure entry with no path.
    pub fn new(name: impl Into<String>, value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires_at,
            path: None,
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Renders the entry as a `Set-Cookie` header value.
    ///
    /// `Expires` uses the IMF-fixdate form from RFC 7231, always in GMT.
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);

        let fmt = format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        );
        if let Ok(expires) = self.expires_at.to_offset(UtcOffset::UTC).format(fmt) {
            out.push_str("; Expires=");
            out.push_str(&expires);
        }

        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }

        out
    }
}

/// Checks a cookie name against the RFC 6265 `token` production.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/'
                        | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}
