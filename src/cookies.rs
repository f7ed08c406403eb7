//! Cookies: the [`Cookies`] helper, its [`Encoder`] and [`Chunker`], and the
//! [`CookieStore`] adapters it writes through.
//!
//! # Typical usage
//! ```rust
//! use cookie_chunker::cookies::{Cookies, HttpCookieStore};
//! use http::{header, HeaderMap, HeaderValue};
//!
//! let cookies = Cookies::default();
//!
//! let mut request = HeaderMap::new();
//! request.insert(header::COOKIE, HeaderValue::from_static("theme=light"));
//! let mut store = HttpCookieStore::from_request_headers(&request);
//!
//! cookies.set(&mut store, "theme", "dark").unwrap();
//! assert_eq!(cookies.get::<String>(&store, "theme").unwrap().as_deref(), Some("dark"));
//!
//! let mut response = HeaderMap::new();
//! store.write_response_headers(&mut response).unwrap();
//! assert_eq!(response.get_all(header::SET_COOKIE).iter().count(), 1);
//! ```

mod chunker;
mod encoder;
mod entry;
mod jar;
mod store;

pub use chunker::Chunker;
pub use encoder::Encoder;
pub use entry::{CookieEntry, SameSite};
pub use jar::Cookies;
pub use store::{CookieStore, HttpCookieStore, InMemoryCookieStore};
