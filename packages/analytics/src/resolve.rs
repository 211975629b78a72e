//! Filter resolution.
//!
//! Applies the date and crime-type predicates to the full record set, then
//! narrows by the selected region when one is set. The unregioned subset is
//! kept alongside the final one because the map must keep showing every
//! region while the auxiliary charts focus on the selection.

use std::sync::Arc;
use std::time::Instant;

use arrest_tracker_analytics_models::{FilterState, RegionOutcome, Trigger};
use arrest_tracker_arrest_models::ArrestRecord;
use arrest_tracker_geography_models::RegionKey;

use crate::cache::{CachedResolution, FilterCache, FilterKey};

/// The outcome of resolving a [`FilterState`] against a record set.
///
/// Holds indices into the source slice, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct FilteredRecords<'a> {
    source: &'a [ArrestRecord],
    resolution: CachedResolution,
}

impl<'a> FilteredRecords<'a> {
    /// Every record, with no region predicate.
    #[must_use]
    pub fn all(source: &'a [ArrestRecord]) -> Self {
        Self {
            source,
            resolution: CachedResolution {
                unregioned: (0..source.len()).collect(),
                narrowed: None,
                outcome: RegionOutcome::NotRequested,
            },
        }
    }

    /// Records passing every applied predicate, region included.
    pub fn records(&self) -> impl Iterator<Item = &'a ArrestRecord> {
        let source = self.source;
        self.final_indices().iter().map(move |&i| &source[i])
    }

    /// Records passing the date and crime-type predicates only.
    pub fn unregioned(&self) -> impl Iterator<Item = &'a ArrestRecord> {
        let source = self.source;
        self.resolution.unregioned.iter().map(move |&i| &source[i])
    }

    /// Number of records in [`Self::records`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.final_indices().len()
    }

    /// Returns `true` if no record passed the filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records in [`Self::unregioned`].
    #[must_use]
    pub fn unregioned_len(&self) -> usize {
        self.resolution.unregioned.len()
    }

    /// What happened to the region predicate.
    #[must_use]
    pub const fn region_outcome(&self) -> RegionOutcome {
        self.resolution.outcome
    }

    fn final_indices(&self) -> &[usize] {
        self.resolution
            .narrowed
            .as_deref()
            .unwrap_or(&self.resolution.unregioned)
    }
}

/// Resolves `filters` against `records` for the given trigger.
///
/// A [`Trigger::ClickReset`] ignores every filter and yields the full set.
/// A selected region that matches none of the filtered records is dropped
/// and reported as [`RegionOutcome::FellBack`].
#[must_use]
pub fn resolve<'a>(
    records: &'a [ArrestRecord],
    filters: &FilterState,
    trigger: Trigger,
) -> FilteredRecords<'a> {
    if trigger == Trigger::ClickReset {
        return FilteredRecords::all(records);
    }

    FilteredRecords {
        source: records,
        resolution: compute(records, filters),
    }
}

/// Like [`resolve`], but memoized in `cache`.
///
/// A reset clears the cache before returning the full set.
pub fn resolve_cached<'a>(
    records: &'a [ArrestRecord],
    filters: &FilterState,
    trigger: Trigger,
    cache: &mut FilterCache,
    now: Instant,
) -> FilteredRecords<'a> {
    if trigger == Trigger::ClickReset {
        cache.clear();
        return FilteredRecords::all(records);
    }

    let key = FilterKey::from(filters);
    if let Some(resolution) = cache.get(&key, now) {
        log::trace!("Filter cache hit");
        return FilteredRecords {
            source: records,
            resolution,
        };
    }

    let resolution = compute(records, filters);
    cache.insert(key, resolution.clone(), now);
    FilteredRecords {
        source: records,
        resolution,
    }
}

fn compute(records: &[ArrestRecord], filters: &FilterState) -> CachedResolution {
    let unregioned: Arc<[usize]> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.admits_unregioned(r))
        .map(|(i, _)| i)
        .collect();

    let Some(region) = filters.selected_region else {
        return CachedResolution {
            unregioned,
            narrowed: None,
            outcome: RegionOutcome::NotRequested,
        };
    };

    let narrowed = narrow(records, &unregioned, region);
    if narrowed.is_empty() {
        log::debug!("{region} matched no filtered records, ignoring region filter");
        return CachedResolution {
            unregioned,
            narrowed: None,
            outcome: RegionOutcome::FellBack { region },
        };
    }

    CachedResolution {
        unregioned,
        narrowed: Some(narrowed),
        outcome: RegionOutcome::Applied { region },
    }
}

fn narrow(records: &[ArrestRecord], indices: &[usize], region: RegionKey) -> Arc<[usize]> {
    indices
        .iter()
        .copied()
        .filter(|&i| region.contains(&records[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::{date, record};
    use arrest_tracker_analytics_models::DateRange;
    use arrest_tracker_arrest_models::Borough;

    fn brooklyn() -> RegionKey {
        RegionKey::Borough {
            name: Borough::Brooklyn,
        }
    }

    fn sample() -> Vec<ArrestRecord> {
        vec![
            record(Some(Borough::Brooklyn), Some(75), "ROBBERY", 3),
            record(Some(Borough::Brooklyn), Some(77), "ASSAULT", 10),
            record(Some(Borough::Queens), Some(110), "ROBBERY", 12),
            record(Some(Borough::Bronx), Some(40), "BURGLARY", 20),
            record(None, None, "ROBBERY", 25),
        ]
    }

    fn offenses<'a>(filtered: &FilteredRecords<'a>) -> Vec<&'a str> {
        filtered.records().map(|r| r.offense.as_str()).collect()
    }

    #[test]
    fn empty_filters_pass_everything() {
        let records = sample();
        let filtered = resolve(&records, &FilterState::default(), Trigger::Initial);
        assert_eq!(filtered.len(), records.len());
        assert_eq!(filtered.region_outcome(), RegionOutcome::NotRequested);
    }

    #[test]
    fn date_and_crime_predicates_combine() {
        let records = sample();
        let filters = FilterState {
            date_range: Some(DateRange::between(date(1), date(15))),
            crime_types: ["ROBBERY".to_string()].into(),
            ..FilterState::default()
        };
        let filtered = resolve(&records, &filters, Trigger::ClickApply);
        assert_eq!(offenses(&filtered), vec!["ROBBERY", "ROBBERY"]);
        assert!(
            filtered
                .records()
                .all(|r| r.date.is_some_and(|d| d <= date(15)))
        );
    }

    #[test]
    fn undated_records_fail_bounded_range() {
        let mut records = sample();
        records[0].date = None;
        let filters = FilterState {
            date_range: Some(DateRange::between(date(1), date(31))),
            ..FilterState::default()
        };
        assert_eq!(resolve(&records, &filters, Trigger::ClickApply).len(), 4);
    }

    #[test]
    fn region_narrows_final_but_not_unregioned() {
        let records = sample();
        let filters = FilterState {
            selected_region: Some(brooklyn()),
            ..FilterState::default()
        };
        let filtered = resolve(&records, &filters, Trigger::ClickRegion);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.unregioned_len(), 5);
        assert_eq!(
            filtered.region_outcome(),
            RegionOutcome::Applied { region: brooklyn() }
        );
        assert!(filtered.records().all(|r| brooklyn().contains(r)));
    }

    #[test]
    fn unmatched_region_falls_back() {
        let records = sample();
        let filters = FilterState {
            crime_types: ["BURGLARY".to_string()].into(),
            selected_region: Some(brooklyn()),
            ..FilterState::default()
        };
        let filtered = resolve(&records, &filters, Trigger::ClickRegion);
        assert_eq!(offenses(&filtered), vec!["BURGLARY"]);
        assert_eq!(
            filtered.region_outcome(),
            RegionOutcome::FellBack { region: brooklyn() }
        );
    }

    #[test]
    fn reset_ignores_filters() {
        let records = sample();
        let filters = FilterState {
            crime_types: ["BURGLARY".to_string()].into(),
            selected_region: Some(brooklyn()),
            ..FilterState::default()
        };
        let filtered = resolve(&records, &filters, Trigger::ClickReset);
        assert_eq!(filtered.len(), records.len());
        assert_eq!(filtered.region_outcome(), RegionOutcome::NotRequested);
    }

    #[test]
    fn cached_resolution_matches_uncached() {
        let records = sample();
        let filters = FilterState {
            crime_types: ["ROBBERY".to_string()].into(),
            selected_region: Some(brooklyn()),
            ..FilterState::default()
        };
        let now = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(300), 8);

        let first = resolve_cached(&records, &filters, Trigger::ClickApply, &mut cache, now);
        assert_eq!(cache.len(), 1);
        let second = resolve_cached(&records, &filters, Trigger::ClickApply, &mut cache, now);
        let direct = resolve(&records, &filters, Trigger::ClickApply);

        assert_eq!(offenses(&first), offenses(&direct));
        assert_eq!(offenses(&second), offenses(&direct));
        assert_eq!(second.region_outcome(), direct.region_outcome());
    }

    #[test]
    fn cached_reset_clears_cache() {
        let records = sample();
        let now = Instant::now();
        let mut cache = FilterCache::new(Duration::from_secs(300), 8);
        let _ = resolve_cached(
            &records,
            &FilterState::default(),
            Trigger::Initial,
            &mut cache,
            now,
        );
        assert_eq!(cache.len(), 1);

        let filtered = resolve_cached(
            &records,
            &FilterState::default(),
            Trigger::ClickReset,
            &mut cache,
            now,
        );
        assert!(cache.is_empty());
        assert_eq!(filtered.len(), records.len());
    }
}
