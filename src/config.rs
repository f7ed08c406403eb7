use std::sync::atomic::{AtomicU32, Ordering};

use crate::cookies::SameSite;

/// Per-cookie byte ceiling most user agents accept once name and attributes are added.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 4000;
/// Expiry used when nothing else is configured.
pub const DEFAULT_EXPIRE_MINUTES: u32 = 60;
/// Upper bound on the number of chunks a single value may be split into.
pub const DEFAULT_MAX_CHUNKS: usize = 50;

// 0 means "never set"
static GLOBAL_EXPIRE_MINUTES: AtomicU32 = AtomicU32::new(0);

/// Sets the process-wide default expiry in minutes. Passing 0 restores the built-in default.
pub fn set_default_expire_minutes(minutes: u32) {
    GLOBAL_EXPIRE_MINUTES.store(minutes, Ordering::Relaxed);
}

/// Returns the process-wide default expiry, falling back to 60 minutes when unset.
pub fn default_expire_minutes() -> u32 {
    match GLOBAL_EXPIRE_MINUTES.load(Ordering::Relaxed) {
        0 => DEFAULT_EXPIRE_MINUTES,
        m => m,
    }
}

/// Reversible transformation applied to encoded values so they survive the `Cookie` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportEncoding {
    /// Values are stored as-is. The caller is responsible for header-safe content.
    None,
    /// Percent-encoding.
    #[default]
    Url,
    /// URL-safe Base64 without padding.
    Base64,
}

/// Configuration for the [`Cookies`](crate::cookies::Cookies) helper.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Expiry in minutes for writes without a per-call override. `None` (or 0) defers
    /// to the process-wide default.
    pub expire_minutes: Option<u32>,
    /// Maximum number of bytes of a single physical cookie value
    pub max_value_bytes: usize,
    /// Maximum number of chunks a value may be split into
    pub max_chunks: usize,
    /// Whether oversized values are split across several cookies or rejected
    pub chunking: bool,
    /// Transport encoding applied after serialization
    pub encoding: TransportEncoding,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            expire_minutes: None,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
            max_chunks: DEFAULT_MAX_CHUNKS,
            chunking: true,
            encoding: TransportEncoding::default(),
            path: Some("/".to_string()),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

impl CookieConfig {
    pub fn with_expire_minutes(mut self, minutes: u32) -> Self {
        self.expire_minutes = Some(minutes);
        self
    }

    pub fn with_max_value_bytes(mut self, bytes: usize) -> Self {
        self.max_value_bytes = bytes;
        self
    }

    pub fn with_max_chunks(mut self, chunks: usize) -> Self {
        self.max_chunks = chunks;
        self
    }

    pub fn with_chunking(mut self, enabled: bool) -> Self {
        self.chunking = enabled;
        self
    }

    pub fn with_encoding(mut self, encoding: TransportEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Resolves the expiry for a write: per-call override, then this config, then the
    /// process-wide default. Zero at any level counts as unset.
    pub fn resolve_expire_minutes(&self, per_call: Option<u32>) -> u32 {
        per_call
            .filter(|m| *m > 0)
            .or(self.expire_minutes.filter(|m| *m > 0))
            .unwrap_or_else(default_expire_minutes)
    }
}

/// Per-call overrides for a single write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    pub expire_minutes: Option<u32>,
    pub max_value_bytes: Option<usize>,
    pub chunking: Option<bool>,
}

impl SetOptions {
    pub fn expire_minutes(mut self, minutes: u32) -> Self {
        self.expire_minutes = Some(minutes);
        self
    }

    pub fn max_value_bytes(mut self, bytes: usize) -> Self {
        self.max_value_bytes = Some(bytes);
        self
    }

    pub fn chunking(mut self, enabled: bool) -> Self {
        self.chunking = Some(enabled);
        self
    }
}
