//! Expansion cache (C8 dependency): caches `expand()`/`hyde()` results
//! keyed by `sha256(query.lower())[:16]`, 7-day TTL, LRU-evict-half at 500
//! entries (§4.8, I8).

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

const TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone)]
pub struct CachedExpansion {
    pub expansions: Vec<String>,
    pub hyde: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedExpansion,
    inserted_at: SystemTime,
    last_used_at: SystemTime,
}

/// Process-global expansion cache (§5 "Shared state lifecycle").
pub struct ExpansionCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Derives the cache key for a raw query (case-folded before hashing).
    pub fn key_for(query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.to_lowercase().as_bytes());
        let digest = hasher.finalize();
        digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
    }

    pub fn get(&self, query: &str) -> Option<CachedExpansion> {
        let key = Self::key_for(query);
        let now = SystemTime::now();
        let mut entries = self.entries.write().expect("expansion cache lock poisoned");
        let entry = entries.get_mut(&key)?;
        if now.duration_since(entry.inserted_at).unwrap_or_default() > TTL {
            entries.remove(&key);
            return None;
        }
        entry.last_used_at = now;
        Some(entry.value.clone())
    }

    pub fn put(&self, query: &str, value: CachedExpansion) {
        let key = Self::key_for(query);
        let now = SystemTime::now();
        let mut entries = self.entries.write().expect("expansion cache lock poisoned");
        if entries.len() >= MAX_ENTRIES && !entries.contains_key(&key) {
            self.evict_half_locked(&mut entries);
        }
        entries.insert(key, Entry { value, inserted_at: now, last_used_at: now });
    }

    /// Evicts the least-recently-used half of the cache (§4.8 "LRU-evict-half").
    fn evict_half_locked(&self, entries: &mut HashMap<String, Entry>) {
        let mut by_recency: Vec<(String, SystemTime)> =
            entries.iter().map(|(k, v)| (k.clone(), v.last_used_at)).collect();
        by_recency.sort_by_key(|(_, t)| *t);
        let evict_count = by_recency.len() / 2;
        for (key, _) in by_recency.into_iter().take(evict_count) {
            entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("expansion cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().expect("expansion cache lock poisoned").clear();
    }
}

impl Default for ExpansionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive() {
        assert_eq!(ExpansionCache::key_for("Hello"), ExpansionCache::key_for("hello"));
    }

    #[test]
    fn get_after_put_returns_equal_value() {
        let cache = ExpansionCache::new();
        cache.put("新卒採用", CachedExpansion { expansions: vec!["a".into()], hyde: None });
        let got = cache.get("新卒採用").unwrap();
        assert_eq!(got.expansions, vec!["a".to_string()]);
    }

    #[test]
    fn miss_for_unknown_key() {
        let cache = ExpansionCache::new();
        assert!(cache.get("never put").is_none());
    }

    #[test]
    fn evicts_half_when_full() {
        let cache = ExpansionCache::new();
        for i in 0..MAX_ENTRIES {
            cache.put(&format!("query-{i}"), CachedExpansion { expansions: vec![], hyde: None });
        }
        assert_eq!(cache.len(), MAX_ENTRIES);
        cache.put("one-more", CachedExpansion { expansions: vec![], hyde: None });
        assert!(cache.len() <= MAX_ENTRIES / 2 + 1);
    }
}
