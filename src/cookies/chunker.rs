//! Splitting of oversized values across several physical cookies.
//!
//! A value that does not fit into one cookie is stored as `name_0`, `name_1`, …
//! with the base cookie `name` holding a count marker (`~chunks:<n>`). Readers use
//! the count rather than scanning for the first empty slot, so an empty or missing
//! intermediate chunk is detected instead of silently truncating the value.
//!
//! Slicing policy: every chunk is non-empty and at most `limit` bytes. A payload
//! whose length is an exact multiple of `limit` yields exactly `len / limit` chunks.
//! Slices never cut through a UTF-8 sequence; with a transport encoding the payload
//! is ASCII anyway.

const MARKER_PREFIX: &str = "~chunks:";

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    limit: usize,
}

impl Chunker {
    /// Creates a chunker for the given per-cookie byte limit. A limit of 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        Self { limit: limit.max(1) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether `encoded` has to be split at all.
    pub fn needs_split(&self, encoded: &str) -> bool {
        encoded.len() > self.limit
    }

    /// Partitions `encoded` into ordered slices of at most `limit` bytes.
    pub fn split<'a>(&self, encoded: &'a str) -> Vec<&'a str> {
        if encoded.is_empty() {
            return vec![encoded];
        }

        let mut chunks = Vec::with_capacity(encoded.len().div_ceil(self.limit));
        let mut rest = encoded;
        while !rest.is_empty() {
            let mut end = self.limit.min(rest.len());
            while !rest.is_char_boundary(end) {
                end -= 1;
            }
            // A single character wider than the limit still has to go somewhere.
            if end == 0 {
                end = rest.chars().next().map_or(rest.len(), char::len_utf8);
            }
            let (head, tail) = rest.split_at(end);
            chunks.push(head);
            rest = tail;
        }
        chunks
    }

    /// Concatenates chunks given in ascending index order.
    pub fn join<S: AsRef<str>>(chunks: &[S]) -> String {
        chunks.iter().map(AsRef::as_ref).collect()
    }

    /// Physical name of chunk `index` of `name`.
    pub fn chunk_name(name: &str, index: usize) -> String {
        format!("{name}_{index}")
    }

    /// Value stored under the base name of a chunked cookie.
    pub fn marker(count: usize) -> String {
        format!("{MARKER_PREFIX}{count}")
    }

    /// Returns the chunk count if `value` is a count marker.
    pub fn parse_marker(value: &str) -> Option<usize> {
        value.strip_prefix(MARKER_PREFIX)?.parse().ok()
    }

    /// Returns the base name and index if `name` looks like a chunk name.
    pub fn parse_chunk_name(name: &str) -> Option<(&str, usize)> {
        let (base, index) = name.rsplit_once('_')?;
        if base.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((base, index.parse().ok()?))
    }
}
