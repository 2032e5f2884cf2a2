//! Fingerprint-keyed cache of provider results.
//!
//! One cache exists per search type per session. Lookups come in two forms:
//! [`ResultCache::get`] by exact fingerprint, and
//! [`ResultCache::find_by_params`], a linear scan that accepts any entry
//! agreeing with the query on every shared key. Neither lookup ever fails;
//! a miss simply sends the caller back to the provider.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tripmate_core::config::CacheConfig;
use tripmate_core::{fingerprint, Fingerprint, SearchParams};

/// One cached search.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<R> {
    /// The exact parameter set used for the search.
    pub parameters: SearchParams,
    /// Wall-clock time of the fetch.
    pub timestamp: DateTime<Utc>,
    /// Normalized records, in provider order.
    pub results: Vec<R>,
}

/// In-memory result cache.
///
/// Unbounded and never stale by default; `max_entries` and `max_age` add an
/// oldest-first eviction cap and an age cutoff when set.
#[derive(Debug, Clone)]
pub struct ResultCache<R> {
    entries: HashMap<Fingerprint, CacheEntry<R>>,
    max_entries: usize,
    max_age: Option<Duration>,
}

impl<R> Default for ResultCache<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: 0,
            max_age: None,
        }
    }
}

impl<R: Clone> ResultCache<R> {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with the limits from config. Zero disables a limit.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: config.max_entries,
            max_age: max_age(config.max_age_secs),
        }
    }

    /// Exact lookup by fingerprint.
    pub fn get(&self, key: &Fingerprint) -> Option<&CacheEntry<R>> {
        let now = Utc::now();
        self.entries.get(key).filter(|e| self.is_fresh(e, now))
    }

    /// Exact lookup by parameter set.
    pub fn get_by_params(&self, params: &SearchParams) -> Option<&CacheEntry<R>> {
        self.get(&fingerprint(params))
    }

    /// Store results under `key`, stamped with the current time.
    pub fn put(&mut self, key: Fingerprint, parameters: SearchParams, results: Vec<R>) {
        self.insert(
            key,
            CacheEntry {
                parameters,
                timestamp: Utc::now(),
                results,
            },
        );
    }

    /// Partial-match lookup.
    ///
    /// Returns the results of the most recently stored fresh entry whose
    /// parameters agree with `params` on every shared key.
    pub fn find_by_params(&self, params: &SearchParams) -> Option<&[R]> {
        let now = Utc::now();
        self.entries
            .values()
            .filter(|e| self.is_fresh(e, now) && e.parameters.partially_matches(params))
            .max_by_key(|e| e.timestamp)
            .map(|e| e.results.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn insert(&mut self, key: Fingerprint, entry: CacheEntry<R>) {
        self.entries.insert(key, entry);
        if self.max_entries > 0 {
            while self.entries.len() > self.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.timestamp)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        tracing::debug!(key = %k, "Evicting oldest cache entry");
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<R>, now: DateTime<Utc>) -> bool {
        match self.max_age {
            Some(max_age) => now - entry.timestamp <= max_age,
            None => true,
        }
    }
}

/// Age cutoff for `secs`; zero and ages beyond what a `Duration` can hold
/// mean "never stale".
fn max_age(secs: u64) -> Option<Duration> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}
