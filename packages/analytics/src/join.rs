//! Joins region counts onto reference geometry.

use std::collections::{BTreeSet, HashMap};

use arrest_tracker_analytics_models::{AggregateTable, GeoRow, GeoTable};
use arrest_tracker_geography_models::{GeoRegion, RegionKey, ViewMode};

/// Produces one row per distinct reference region of the `mode` layer.
///
/// Regions with no matching records get a count of zero. Reference regions
/// that repeat a key are dropped in favour of the first occurrence. Records
/// that had no region, or whose region has no reference geometry, are
/// totalled in [`GeoTable::unmatched`], so row counts plus `unmatched`
/// always equal the number of aggregated records.
#[must_use]
pub fn join<'g>(
    counts: &AggregateTable<RegionKey>,
    reference: &'g [GeoRegion],
    mode: ViewMode,
) -> GeoTable<'g> {
    let by_key: HashMap<RegionKey, u64> =
        counts.rows().iter().map(|r| (r.key, r.count)).collect();

    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(reference.len());

    for region in reference.iter().filter(|r| r.key.view_mode() == mode) {
        if !seen.insert(region.key) {
            log::debug!("Duplicate reference region {}, keeping first", region.key);
            continue;
        }
        rows.push(GeoRow {
            key: region.key,
            count: by_key.get(&region.key).copied().unwrap_or(0),
            geometry: region.geometry.as_ref(),
        });
    }

    let matched: u64 = rows.iter().map(|r| r.count).sum();
    let unjoined = counts.total().saturating_sub(matched);
    if unjoined > 0 {
        log::debug!("{unjoined} record(s) fall in regions without reference geometry");
    }

    GeoTable {
        view_mode: mode,
        rows,
        unmatched: unjoined + counts.missing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate_regions;
    use crate::test_support::record;
    use arrest_tracker_arrest_models::Borough;
    use geo::{MultiPolygon, polygon};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    fn precinct(id: i32) -> GeoRegion {
        GeoRegion {
            key: RegionKey::Precinct { id },
            geometry: Some(square()),
        }
    }

    #[test]
    fn fills_zero_counts_and_tracks_unmatched() {
        let records = vec![
            record(Some(Borough::Brooklyn), Some(75), "ROBBERY", 1),
            record(Some(Borough::Brooklyn), Some(75), "ROBBERY", 1),
            record(Some(Borough::Brooklyn), Some(999), "ROBBERY", 1),
            record(Some(Borough::Brooklyn), None, "ROBBERY", 1),
        ];
        let reference = vec![precinct(75), precinct(14)];
        let counts = aggregate_regions(&records, ViewMode::Precinct);

        let table = join(&counts, &reference, ViewMode::Precinct);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.count_of(RegionKey::Precinct { id: 75 }), Some(2));
        assert_eq!(table.count_of(RegionKey::Precinct { id: 14 }), Some(0));
        assert_eq!(table.count_of(RegionKey::Precinct { id: 999 }), None);
        assert_eq!(table.unmatched, 2);
        assert_eq!(table.total(), records.len() as u64);
    }

    #[test]
    fn duplicate_reference_regions_keep_first() {
        let mut second = precinct(75);
        second.geometry = None;
        let reference = vec![precinct(75), second];
        let table = join(&AggregateTable::empty(), &reference, ViewMode::Precinct);
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].geometry.is_some());
    }

    #[test]
    fn ignores_regions_from_other_layer() {
        let reference = vec![
            precinct(75),
            GeoRegion {
                key: RegionKey::Borough {
                    name: Borough::Queens,
                },
                geometry: None,
            },
        ];
        let table = join(&AggregateTable::empty(), &reference, ViewMode::Borough);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.view_mode, ViewMode::Borough);
    }
}
