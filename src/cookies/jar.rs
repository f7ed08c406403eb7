//! The [`Cookies`] helper: typed reads and writes over any [`CookieStore`].
//!
//! Write path: value -> [`Encoder`] -> [`Chunker`] (only when over the limit) -> store.
//! Read path runs the other way round. The helper holds configuration only, so one
//! instance can serve any number of requests; the store is passed in on each call.
//!
//! ```rust
//! use cookie_chunker::cookies::{Cookies, InMemoryCookieStore};
//!
//! let cookies = Cookies::default();
//! let mut store = InMemoryCookieStore::new();
//!
//! cookies.set(&mut store, "theme", "dark").unwrap();
//! let theme: Option<String> = cookies.get(&store, "theme").unwrap();
//! assert_eq!(theme.as_deref(), Some("dark"));
//! ```
use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::config::{CookieConfig, SetOptions};
use crate::cookies::encoder::{shape_of, Shape};
use crate::cookies::entry::is_valid_name;
use crate::cookies::{Chunker, CookieEntry, CookieStore, Encoder};
use crate::errors::{CookieError, Result};

#[derive(Debug, Clone, Default)]
pub struct Cookies {
    config: CookieConfig,
}

impl Cookies {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    fn encoder(&self) -> Encoder {
        Encoder::new(self.config.encoding)
    }

    /// Stores `value` under `name` with the configured expiry.
    pub fn set<T: Serialize + ?Sized>(&self, store: &mut dyn CookieStore, name: &str, value: &T) -> Result<()> {
        self.set_with(store, name, value, SetOptions::default())
    }

    /// Stores `value` under `name`, replacing whatever was there.
    ///
    /// A value serializing to `null` removes the cookie instead. Values whose encoded
    /// form exceeds the byte limit are chunked, or rejected with
    /// [`CookieError::SizeExceeded`] when chunking is off.
    pub fn set_with<T: Serialize + ?Sized>(
        &self,
        store: &mut dyn CookieStore,
        name: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<()> {
        check_name(name)?;

        if shape_of(value) == Shape::Null {
            return self.remove(store, name);
        }

        let encoded = self.encoder().encode(value)?;
        let minutes = self.config.resolve_expire_minutes(options.expire_minutes);
        let expires_at = store.now() + Duration::minutes(i64::from(minutes));

        self.write_encoded(store, name, &encoded, expires_at, options)
    }

    /// Reads and decodes the value stored under `name`.
    ///
    /// Returns `Ok(None)` when nothing live is stored under the name.
    pub fn get<T: DeserializeOwned>(&self, store: &dyn CookieStore, name: &str) -> Result<Option<T>> {
        let encoder = self.encoder();
        self.payload(store, name)?.map(|p| encoder.decode(&p)).transpose()
    }

    /// Reads the value under `name` with only the transport encoding reversed.
    pub fn get_raw(&self, store: &dyn CookieStore, name: &str) -> Result<Option<String>> {
        let encoder = self.encoder();
        self.payload(store, name)?.map(|p| encoder.decode_raw(&p)).transpose()
    }

    /// Expires `name` and all of its chunks.
    pub fn remove(&self, store: &mut dyn CookieStore, name: &str) -> Result<()> {
        check_name(name)?;

        let chunks = chunk_count(store, name, self.config.max_chunks);
        store.remove(name)?;
        for index in 0..chunks {
            store.remove(&Chunker::chunk_name(name, index))?;
        }
        log::debug!("removed cookie '{name}' ({chunks} chunks)");
        Ok(())
    }

    /// Pushes the expiry of an existing cookie forward without changing its value.
    ///
    /// The physical entries are re-expired as they are, so a value chunked under
    /// per-call options stays chunked the same way. Returns `false` when nothing live
    /// is stored under `name`.
    pub fn touch(&self, store: &mut dyn CookieStore, name: &str, expire_minutes: Option<u32>) -> Result<bool> {
        check_name(name)?;

        // Validates the chunk sequence before anything is rewritten.
        if self.payload(store, name)?.is_none() {
            return Ok(false);
        }
        let minutes = self.config.resolve_expire_minutes(expire_minutes);
        let expires_at = store.now() + Duration::minutes(i64::from(minutes));

        let mut physical = Vec::new();
        if store.get(name).is_some() {
            physical.push(name.to_string());
        }
        let chunks = chunk_count(store, name, self.config.max_chunks);
        physical.extend((0..chunks).map(|index| Chunker::chunk_name(name, index)));

        for entry_name in physical {
            if let Some(value) = store.get(&entry_name) {
                store.set(self.entry(&entry_name, &value, expires_at))?;
            }
        }
        Ok(true)
    }

    /// Names of all live physical cookies.
    pub fn names(&self, store: &dyn CookieStore) -> BTreeSet<String> {
        store.list_names()
    }

    /// Names of all live cookies with chunk entries folded into their base name.
    pub fn logical_names(&self, store: &dyn CookieStore) -> BTreeSet<String> {
        let physical = store.list_names();

        physical
            .iter()
            .map(|name| match Chunker::parse_chunk_name(name) {
                Some((base, _)) if is_chunk_base(store, &physical, base) => base.to_string(),
                _ => name.clone(),
            })
            .collect()
    }

    fn write_encoded(
        &self,
        store: &mut dyn CookieStore,
        name: &str,
        encoded: &str,
        expires_at: OffsetDateTime,
        options: SetOptions,
    ) -> Result<()> {
        let limit = options.max_value_bytes.unwrap_or(self.config.max_value_bytes);
        let chunking = options.chunking.unwrap_or(self.config.chunking);

        if limit == 0 {
            return Err(CookieError::SizeExceeded {
                name: name.to_string(),
                size: encoded.len(),
                limit,
            });
        }

        let previous_chunks = chunk_count(store, name, self.config.max_chunks);
        let chunker = Chunker::new(limit);

        let written_chunks = if !chunker.needs_split(encoded) {
            store.set(self.entry(name, encoded, expires_at))?;
            0
        } else {
            if !chunking {
                return Err(CookieError::SizeExceeded {
                    name: name.to_string(),
                    size: encoded.len(),
                    limit,
                });
            }

            let chunks = chunker.split(encoded);
            if chunks.len() > self.config.max_chunks {
                return Err(CookieError::SizeExceeded {
                    name: name.to_string(),
                    size: encoded.len(),
                    limit: limit.saturating_mul(self.config.max_chunks),
                });
            }

            for (index, chunk) in chunks.iter().enumerate() {
                store.set(self.entry(&Chunker::chunk_name(name, index), chunk, expires_at))?;
            }
            store.set(self.entry(name, &Chunker::marker(chunks.len()), expires_at))?;

            log::debug!("cookie '{name}' split into {} chunks of at most {limit} bytes", chunks.len());
            chunks.len()
        };

        // Chunks left over from an earlier, longer value.
        for index in written_chunks..previous_chunks {
            store.remove(&Chunker::chunk_name(name, index))?;
        }

        Ok(())
    }

    /// Encoded payload under `name`, reassembled if chunked.
    fn payload(&self, store: &dyn CookieStore, name: &str) -> Result<Option<String>> {
        if let Some(value) = store.get(name) {
            let Some(count) = Chunker::parse_marker(&value) else {
                return Ok(Some(value));
            };
            // The marker may come straight from the client.
            if count > self.config.max_chunks {
                log::warn!("cookie '{name}' announces {count} chunks, limit is {}", self.config.max_chunks);
                return Err(CookieError::ChunkSequence {
                    name: name.to_string(),
                    reason: format!("{count} chunks announced, at most {} allowed", self.config.max_chunks),
                });
            }

            let mut chunks = Vec::new();
            for index in 0..count {
                let chunk_name = Chunker::chunk_name(name, index);
                match store.get(&chunk_name) {
                    Some(chunk) => chunks.push(chunk),
                    None => {
                        log::warn!("cookie '{name}' announces {count} chunks but '{chunk_name}' is missing");
                        return Err(CookieError::ChunkSequence {
                            name: name.to_string(),
                            reason: format!("chunk {index} of {count} is missing"),
                        });
                    }
                }
            }
            return Ok(Some(Chunker::join(&chunks)));
        }

        // Sequences written without a count marker end at the first absent or empty chunk.
        let chunks = unmarked_chunks(store, name, self.config.max_chunks);
        if chunks.is_empty() {
            return Ok(None);
        }
        log::debug!("cookie '{name}' read from {} unmarked chunks", chunks.len());
        Ok(Some(Chunker::join(&chunks)))
    }

    fn entry(&self, name: &str, value: &str, expires_at: OffsetDateTime) -> CookieEntry {
        CookieEntry {
            name: name.to_string(),
            value: value.to_string(),
            expires_at,
            path: self.config.path.clone(),
            domain: self.config.domain.clone(),
            secure: self.config.secure,
            http_only: self.config.http_only,
            same_site: self.config.same_site,
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CookieError::InvalidName(name.to_string()))
    }
}

/// Number of chunk entries currently belonging to `name`, never more than `max_chunks`.
fn chunk_count(store: &dyn CookieStore, name: &str, max_chunks: usize) -> usize {
    match store.get(name) {
        Some(value) => Chunker::parse_marker(&value).unwrap_or(0).min(max_chunks),
        None => unmarked_chunks(store, name, max_chunks).len(),
    }
}

fn unmarked_chunks(store: &dyn CookieStore, name: &str, max_chunks: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    while chunks.len() < max_chunks {
        let Some(chunk) = store.get(&Chunker::chunk_name(name, chunks.len())) else {
            break;
        };
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

fn is_chunk_base(store: &dyn CookieStore, physical: &BTreeSet<String>, base: &str) -> bool {
    match store.get(base) {
        Some(value) => Chunker::parse_marker(&value).is_some(),
        None => physical.contains(&Chunker::chunk_name(base, 0)),
    }
}
