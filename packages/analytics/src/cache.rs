//! Memoization of filter resolution.
//!
//! Entries are keyed by every filter input that affects the resolved subset
//! and expire after a fixed time-to-live. Callers pass the current
//! [`Instant`] so expiry is deterministic under test.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arrest_tracker_analytics_models::{DateRange, FilterState, RegionOutcome};
use arrest_tracker_geography_models::RegionKey;

/// Every filter input that determines a resolved subset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterKey {
    date_range: Option<DateRange>,
    crime_types: BTreeSet<String>,
    selected_region: Option<RegionKey>,
}

impl From<&FilterState> for FilterKey {
    fn from(filters: &FilterState) -> Self {
        Self {
            date_range: filters.date_range,
            crime_types: filters.crime_types.clone(),
            selected_region: filters.selected_region,
        }
    }
}

/// A resolved subset stored as record indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResolution {
    pub(crate) unregioned: Arc<[usize]>,
    pub(crate) narrowed: Option<Arc<[usize]>>,
    pub(crate) outcome: RegionOutcome,
}

#[derive(Debug)]
struct Entry {
    stored_at: Instant,
    value: CachedResolution,
}

/// Time-bounded, size-bounded cache of filter resolutions.
#[derive(Debug)]
pub struct FilterCache {
    ttl: Duration,
    capacity: usize,
    entries: BTreeMap<FilterKey, Entry>,
}

impl FilterCache {
    /// Creates a cache. A zero `ttl` or `capacity` disables caching.
    #[must_use]
    pub const fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: BTreeMap::new(),
        }
    }

    /// Returns `true` if lookups can ever hit.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.capacity > 0
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `key`, dropping it if it has expired as of `now`.
    pub fn get(&mut self, key: &FilterKey, now: Instant) -> Option<CachedResolution> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.stored_at) < self.ttl {
            return Some(entry.value.clone());
        }
        self.entries.remove(key);
        None
    }

    /// Stores `value` under `key`, evicting expired entries and then the
    /// oldest entry if the cache is full.
    pub fn insert(&mut self, key: FilterKey, value: CachedResolution, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                log::trace!("Evicting oldest filter cache entry");
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            key,
            Entry {
                stored_at: now,
                value,
            },
        );
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(crime: &str) -> FilterKey {
        FilterKey {
            date_range: None,
            crime_types: [crime.to_string()].into(),
            selected_region: None,
        }
    }

    fn value(indices: &[usize]) -> CachedResolution {
        CachedResolution {
            unregioned: indices.into(),
            narrowed: None,
            outcome: RegionOutcome::NotRequested,
        }
    }

    #[test]
    fn hits_until_ttl_elapses() {
        let start = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(300), 8);
        cache.insert(key("ROBBERY"), value(&[1, 2]), start);

        let hit = cache.get(&key("ROBBERY"), start + Duration::from_secs(299));
        assert_eq!(hit, Some(value(&[1, 2])));

        assert!(cache.get(&key("ROBBERY"), start + Duration::from_secs(300)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let now = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(60), 8);
        cache.insert(key("ROBBERY"), value(&[1]), now);
        assert!(cache.get(&key("ASSAULT"), now).is_none());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let start = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(60), 2);
        cache.insert(key("A"), value(&[0]), start);
        cache.insert(key("B"), value(&[1]), start + Duration::from_secs(1));
        cache.insert(key("C"), value(&[2]), start + Duration::from_secs(2));

        let now = start + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A"), now).is_none());
        assert!(cache.get(&key("B"), now).is_some());
        assert!(cache.get(&key("C"), now).is_some());
    }

    #[test]
    fn zero_ttl_disables() {
        let now = Instant::now();
        let mut cache = FilterCache::new(Duration::ZERO, 8);
        assert!(!cache.is_enabled());
        cache.insert(key("A"), value(&[0]), now);
        assert!(cache.get(&key("A"), now).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let now = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(60), 8);
        cache.insert(key("A"), value(&[0]), now);
        cache.clear();
        assert!(cache.get(&key("A"), now).is_none());
    }
}
