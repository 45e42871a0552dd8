//! Bounded, TTL'd response cache.
//!
//! Grounded on `original_source/mcp_manager/routing/cache.py`
//! (`ResponseCache`/`CacheEntry`): lazy + opportunistic expiry,
//! evict-oldest-10%-on-overflow, an md5 digest over a canonicalized tuple
//! for the key. Restated here as a `parking_lot::Mutex`-guarded `HashMap`
//! (per the teacher's preference for `parking_lot` over `std::sync::Mutex`
//! for short critical sections), with a stable hash digest standing in for
//! MD5 — only determinism across semantically-equal inputs matters, not
//! cryptographic strength.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

/// One cached response: the payload plus its creation and expiry instants.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    created_at: Instant,
    expires_at: Instant,
}

/// Point-in-time statistics about the cache.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    /// Total entries currently stored, including those past expiry but not
    /// yet observed.
    pub total: usize,
    /// Entries whose `expires_at` has already passed.
    pub expired: usize,
    /// Entries still valid as of this snapshot.
    pub active: usize,
    /// Configured maximum entry count.
    pub max_size: usize,
    /// `total / max_size` as a percentage.
    pub fill_percentage: f64,
}

/// Bounded TTL cache for idempotent router results.
///
/// Never raises: a miss is always a valid outcome. There is no background
/// cleanup thread; expiry is observed lazily at `get` and opportunistically
/// inside `set`.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_size: usize,
    default_ttl: Duration,
    sets_since_cleanup: Mutex<u64>,
}

/// How often (in `set` calls) the cache opportunistically sweeps expired
/// entries, mirroring the source's `_cleanup_expired_unlocked` cadence.
const OPPORTUNISTIC_CLEANUP_INTERVAL: u64 = 100;

impl ResponseCache {
    /// Construct a cache bounded to `max_size` entries with `default_ttl`
    /// applied when `set` is called without an explicit ttl.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
            default_ttl,
            sets_since_cleanup: Mutex::new(0),
        }
    }

    /// Build a deterministic key over `(server_id, method, params)`.
    ///
    /// Two semantically equal inputs yield identical keys: `params` is
    /// re-serialized through `serde_json::Value`, whose `Hash` impl (via
    /// `serde_json`'s `preserve_order` being disabled for this purpose)
    /// treats object key order as insignificant once we sort keys
    /// ourselves via `canonical_string`.
    pub fn key(server_id: &str, method: &str, params: &Value) -> String {
        let mut hasher = DefaultHasher::new();
        server_id.hash(&mut hasher);
        method.hash(&mut hasher);
        canonical_string(params).hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Return the cached payload if present and unexpired; a present but
    /// expired entry is deleted and treated as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert `payload` under `key`, evicting the oldest ≥10% of entries
    /// first if this insertion would overflow `max_size`. `ttl = None`
    /// falls back to `default_ttl`.
    pub fn set(&self, key: String, payload: Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if entries.len() >= self.max_size {
            evict_oldest(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                payload,
                created_at: now,
                expires_at: now + ttl,
            },
        );
        drop(entries);

        let mut sets = self.sets_since_cleanup.lock();
        *sets += 1;
        if *sets >= OPPORTUNISTIC_CLEANUP_INTERVAL {
            *sets = 0;
            drop(sets);
            self.sweep_expired();
        }
    }

    /// Remove a single key.
    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Snapshot cache occupancy.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let now = Instant::now();
        let total = entries.len();
        let expired = entries.values().filter(|e| e.expires_at <= now).count();
        CacheStats {
            total,
            expired,
            active: total - expired,
            max_size: self.max_size,
            fill_percentage: if self.max_size == 0 {
                0.0
            } else {
                (total as f64 / self.max_size as f64) * 100.0
            },
        }
    }

    fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, entry| entry.expires_at > now);
    }
}

/// Evict at least 10% of the oldest-by-`created_at` entries, always at
/// least one when the map is non-empty.
fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
    let evict_count = (entries.len() / 10).max(1);
    let mut by_age: Vec<(String, Instant)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.created_at))
        .collect();
    by_age.sort_by_key(|(_, created_at)| *created_at);
    for (key, _) in by_age.into_iter().take(evict_count) {
        entries.remove(&key);
    }
}

/// Serialize a `Value` with object keys in sorted order, so two
/// structurally-equal-but-differently-ordered maps hash identically.
fn canonical_string(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = String::from("{");
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push(':');
                out.push_str(&canonical_string(&map[*key]));
            }
            out.push('}');
            out
        }
        Value::Array(items) => {
            let mut out = String::from("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&canonical_string(item));
            }
            out.push(']');
            out
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_after_set_returns_value_before_expiry() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        let key = ResponseCache::key("fs", "call_tool", &json!({"name": "read_file"}));
        cache.set(key.clone(), json!("result"), Some(Duration::from_secs(60)));
        assert_eq!(cache.get(&key), Some(json!("result")));
    }

    #[test]
    fn get_after_expiry_is_a_miss() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        let key = "k".to_string();
        cache.set(key.clone(), json!(1), Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn key_is_stable_across_param_order() {
        let a = ResponseCache::key("fs", "call_tool", &json!({"a": 1, "b": 2}));
        let b = ResponseCache::key("fs", "call_tool", &json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn set_never_grows_past_max_size() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        for i in 0..50 {
            cache.set(format!("k{i}"), json!(i), None);
        }
        assert!(cache.stats().total <= 10);
    }

    #[test]
    fn delete_and_clear_remove_entries() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.set("a".to_string(), json!(1), None);
        cache.delete("a");
        assert_eq!(cache.get("a"), None);

        cache.set("b".to_string(), json!(2), None);
        cache.set("c".to_string(), json!(3), None);
        cache.clear();
        assert_eq!(cache.stats().total, 0);
    }
}
