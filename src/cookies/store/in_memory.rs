use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use time::{Duration, OffsetDateTime};

use crate::cookies::store::CookieStore;
use crate::cookies::CookieEntry;

/// In-memory cookie store (no transport). Expired entries are kept but never returned.
#[derive(Debug, Default)]
pub struct InMemoryCookieStore {
    entries: HashMap<String, CookieEntry>,
    /// Frozen clock; `None` follows the system clock.
    clock: Option<OffsetDateTime>,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose clock is frozen at `now`.
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            entries: HashMap::new(),
            clock: Some(now),
        }
    }

    /// Moves a frozen clock forward. Freezes the system clock first if needed.
    pub fn advance(&mut self, by: Duration) {
        let now = self.now();
        self.clock = Some(now + by);
    }

    /// Raw entry, expired or not.
    pub fn entry(&self, name: &str) -> Option<&CookieEntry> {
        self.entries.get(name)
    }

    /// Number of physical entries, including expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CookieStore for InMemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = self.now();
        self.entries
            .get(name)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }

    fn set(&mut self, entry: CookieEntry) -> Result<()> {
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let past = self.now() - Duration::days(1);
        if let Some(entry) = self.entries.get_mut(name) {
            entry.expires_at = past;
        }
        Ok(())
    }

    fn list_names(&self) -> BTreeSet<String> {
        let now = self.now();
        self.entries
            .values()
            .filter(|e| !e.is_expired(now))
            .map(|e| e.name.clone())
            .collect()
    }

    fn now(&self) -> OffsetDateTime {
        self.clock.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn entry(name: &str, value: &str, expires_at: OffsetDateTime) -> CookieEntry {
        CookieEntry::new(name, value, expires_at)
    }

    #[test]
    fn store_contract() {
        let now = datetime!(2026-10-17 12:00:00 UTC);
        let mut store = InMemoryCookieStore::at(now);
        let later = now + Duration::hours(1);

        assert!(store.get("missing").is_none());

        store.set(entry("a", "1", later)).unwrap();
        store.set(entry("b", "2", later)).unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        assert_eq!(store.list_names().len(), 2);

        // overwrite keeps one entry
        store.set(entry("a", "ONE", later)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").as_deref(), Some("ONE"));

        store.remove("b").unwrap();
        assert!(store.get("b").is_none());
        assert!(store.entry("b").unwrap().expires_at < now);
        assert_eq!(store.list_names().into_iter().collect::<Vec<_>>(), vec!["a".to_string()]);

        // removing an absent name is fine
        store.remove("nope").unwrap();
    }

    #[test]
    fn entries_vanish_once_expired() {
        let now = datetime!(2026-10-17 12:00:00 UTC);
        let mut store = InMemoryCookieStore::at(now);
        store.set(entry("a", "1", now + Duration::minutes(60))).unwrap();

        store.advance(Duration::minutes(59));
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.advance(Duration::minutes(1));
        assert!(store.get("a").is_none());
        assert!(store.list_names().is_empty());
    }
}
