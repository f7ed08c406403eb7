//! Cookie store adapters.
//!
//! A **cookie store** is the thin binding between the [`Cookies`](super::Cookies)
//! helper and wherever physical cookies actually live. The helper never talks to a
//! web framework directly; it receives a `&mut dyn CookieStore` on every call.
//!
//! This module exports two implementations:
//! - [`HttpCookieStore`]: bound to one request/response pair via `http` headers.
//! - [`InMemoryCookieStore`]: a plain map, handy for tests and non-HTTP callers.
//!
//! ## Contract
//! - `set` creates the entry if absent and overwrites value and expiry otherwise.
//! - `get` never returns an entry whose expiry has passed according to [`CookieStore::now`].
//! - `remove` expires the entry; it does not have to delete it physically.
mod http;
mod in_memory;

pub use self::http::HttpCookieStore;
pub use in_memory::InMemoryCookieStore;

use std::collections::BTreeSet;

use anyhow::Result;
use time::OffsetDateTime;

use crate::cookies::CookieEntry;

/// Name-keyed access to physical cookies.
pub trait CookieStore {
    /// Returns the live value stored under `name`, if any.
    fn get(&self, name: &str) -> Option<String>;

    /// Creates or replaces the entry named `entry.name`.
    fn set(&mut self, entry: CookieEntry) -> Result<()>;

    /// Expires the entry named `name`. Removing an absent name is not an error.
    fn remove(&mut self, name: &str) -> Result<()>;

    /// Names of all live entries.
    fn list_names(&self) -> BTreeSet<String>;

    /// The store's notion of the current time; expiry is judged against it.
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
