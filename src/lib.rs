//! Typed cookie values for a single request/response cycle.
//!
//! Values are serialized (plain text for primitives, JSON for structured data),
//! transport-encoded, and split over several cookies when they exceed the
//! per-cookie size limit. See [`cookies::Cookies`] for the entry point.

pub mod config;
pub mod cookies;
pub mod errors;

pub use config::{CookieConfig, SetOptions, TransportEncoding};
pub use cookies::{Cookies, CookieStore, HttpCookieStore, InMemoryCookieStore};
pub use errors::{CookieError, Result};
