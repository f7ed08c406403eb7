//! Cookie store bound to a single request/response pair.
//!
//! The incoming side is parsed once from the request's `Cookie` headers. Writes go
//! to the outgoing side and are mirrored into the incoming view, so a value written
//! earlier in the same request is visible to later reads without a round trip to
//! the client. When the handler is done, [`HttpCookieStore::write_response_headers`]
//! turns the outgoing side into `Set-Cookie` headers.
//!
//! ### Read priority
//! 1. Outgoing entry for the name. An expired (removed) outgoing entry hides the
//!    incoming value.
//! 2. Incoming value from the request.
use std::collections::{BTreeSet, HashMap};

use ::http::header::{COOKIE, SET_COOKIE};
use ::http::{HeaderMap, HeaderValue};
use anyhow::{Context, Result};
use time::{Duration, OffsetDateTime};

use crate::cookies::store::CookieStore;
use crate::cookies::CookieEntry;

#[derive(Debug)]
pub struct HttpCookieStore {
    /// Name/value pairs sent by the client, plus mirrored writes.
    incoming: HashMap<String, String>,
    /// Entries to be sent back, in write order.
    outgoing: Vec<CookieEntry>,
    /// Path used for removal entries of cookies that were only seen on the request.
    removal_path: Option<String>,
    /// Frozen clock; `None` follows the system clock.
    clock: Option<OffsetDateTime>,
}

impl Default for HttpCookieStore {
    fn default() -> Self {
        Self {
            incoming: HashMap::new(),
            outgoing: Vec::new(),
            removal_path: Some("/".to_string()),
            clock: None,
        }
    }
}

impl HttpCookieStore {
    /// Creates a store for a request that carried no cookies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from the request's headers.
    ///
    /// Every `Cookie` header is parsed. When a name occurs more than once, the first
    /// occurrence wins (user agents send the most specific path first). Pairs without
    /// `=` and headers that are not valid visible ASCII are skipped.
    pub fn from_request_headers(headers: &HeaderMap) -> Self {
        let mut store = Self::default();

        for header in headers.get_all(COOKIE) {
            let Ok(header_str) = header.to_str() else {
                log::debug!("skipping non-ASCII Cookie header");
                continue;
            };
            for pair in header_str.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    store
                        .incoming
                        .entry(name.to_string())
                        .or_insert_with(|| unquote(value.trim()).to_string());
                }
            }
        }

        store
    }

    /// Freezes the store's clock at `now`.
    pub fn with_clock(mut self, now: OffsetDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Path attribute put on removal entries synthesized for request-only cookies.
    pub fn with_removal_path(mut self, path: Option<String>) -> Self {
        self.removal_path = path;
        self
    }

    /// Outgoing entries in write order, including removals.
    pub fn response_cookies(&self) -> &[CookieEntry] {
        &self.outgoing
    }

    /// Appends one `Set-Cookie` header per outgoing entry.
    pub fn write_response_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        for entry in &self.outgoing {
            let value = HeaderValue::from_str(&entry.to_set_cookie())
                .with_context(|| format!("cookie '{}' is not a valid header value", entry.name))?;
            headers.append(SET_COOKIE, value);
        }
        Ok(())
    }

    fn outgoing(&self, name: &str) -> Option<&CookieEntry> {
        self.outgoing.iter().find(|e| e.name == name)
    }
}

/// Strips one pair of surrounding DQUOTEs, which RFC 6265 allows around a cookie value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

impl CookieStore for HttpCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        match self.outgoing(name) {
            Some(entry) if entry.is_expired(self.now()) => None,
            Some(entry) => Some(entry.value.clone()),
            None => self.incoming.get(name).cloned(),
        }
    }

    fn set(&mut self, entry: CookieEntry) -> Result<()> {
        if entry.is_expired(self.now()) {
            self.incoming.remove(&entry.name);
        } else {
            self.incoming.insert(entry.name.clone(), entry.value.clone());
        }

        if let Some(existing) = self.outgoing.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
        } else {
            self.outgoing.push(entry);
        }
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let past = self.now() - Duration::days(1);
        let was_incoming = self.incoming.remove(name).is_some();

        if let Some(existing) = self.outgoing.iter_mut().find(|e| e.name == name) {
            existing.expires_at = past;
        } else if was_incoming {
            let mut removal = CookieEntry::new(name, "", past);
            removal.path = self.removal_path.clone();
            self.outgoing.push(removal);
        }
        Ok(())
    }

    fn list_names(&self) -> BTreeSet<String> {
        let now = self.now();
        let mut names: BTreeSet<String> = self
            .incoming
            .keys()
            .filter(|name| self.outgoing(name).is_none())
            .cloned()
            .collect();
        names.extend(
            self.outgoing
                .iter()
                .filter(|e| !e.is_expired(now))
                .map(|e| e.name.clone()),
        );
        names
    }

    fn now(&self) -> OffsetDateTime {
        self.clock.unwrap_or_else(OffsetDateTime::now_utc)
    }
}
