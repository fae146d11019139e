use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::{DEBUG_FLAGS, PERSISTENCE};
use crate::utils::Clock;

/// Build a cache key: `prefix:arg1:arg2:k1=v1:k2=v2`, lowercased, spaces as `_`.
/// Keyword pairs are sorted by name so call-site order does not matter.
pub fn make_cache_key(prefix: &str, args: &[&str], kwargs: &[(&str, &str)]) -> String {
    let mut sorted_kwargs = kwargs.to_vec();
    sorted_kwargs.sort_by(|a, b| a.0.cmp(b.0));

    let mut parts: Vec<String> = Vec::with_capacity(1 + args.len() + kwargs.len());
    parts.push(prefix.to_string());
    parts.extend(args.iter().map(|a| a.to_string()));
    parts.extend(sorted_kwargs.iter().map(|(k, v)| format!("{}={}", k, v)));

    parts
        .join(PERSISTENCE.cache.key_separator)
        .replace(' ', "_")
        .to_lowercase()
}

/// Glob match supporting `*` (any run) and `?` (any one char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = backtrack {
            pi = star_pi + 1;
            ti = star_ti + 1;
            backtrack = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// In-memory key/value cache whose entries expire after a time-to-live.
///
/// Time comes from the injected [`Clock`]. Clones share the same storage.
pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(clock, PERSISTENCE.cache.default_ttl)
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Entries are whole values, so a poisoned map is still usable
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Live value for `key`. An expired entry is dropped on the way out.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let hit = match entries.get(key).map(|e| e.expires_at) {
            Some(expires_at) if expires_at > now => entries.get(key).map(|e| Arc::clone(&e.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        if DEBUG_FLAGS.print_cache_events {
            log::info!("Cache {}: {}", if hit.is_some() { "HIT" } else { "MISS" }, key);
        }
        hit
    }

    pub fn set(&self, key: impl Into<String>, value: V) -> Arc<V> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) -> Arc<V> {
        let key = key.into();
        let value = Arc::new(value);
        let expires_at = self.clock.now() + ttl;
        if DEBUG_FLAGS.print_cache_events {
            log::info!("Cache SET: {} (ttl {:?})", key, ttl);
        }
        self.lock().insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                expires_at,
            },
        );
        value
    }

    /// `true` if a (live or expired) entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every key matching a glob pattern (`*`, `?`). Returns how many went.
    pub fn clear_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop every expired entry. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock().values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-through lookup: return the live value for `key`, or run `compute`, store its
    /// success under `key` and return it. Errors are passed back and never cached.
    ///
    /// The lock is not held while `compute` runs, so two racing callers may both compute.
    pub fn get_or_compute<E, F>(&self, key: &str, ttl: Option<Duration>, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = compute()?;
        Ok(self.set_with_ttl(key, value, ttl.unwrap_or(self.default_ttl)))
    }
}
