//! Category counts over a filtered record set.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use arrest_tracker_analytics_models::{
    AggregateField, AggregateTable, CategoryCount, ChartKind, CrimeTypeView, CrimeViewMode,
};
use arrest_tracker_arrest_models::ArrestRecord;
use arrest_tracker_geography_models::{RegionKey, ViewMode};

/// Counts `records` by the key `key_of` extracts.
///
/// Records for which `key_of` returns `None` are tallied as missing.
#[must_use]
pub fn count_by<'r, K, I, F>(records: I, key_of: F) -> AggregateTable<K>
where
    I: IntoIterator<Item = &'r ArrestRecord>,
    K: Eq + Hash + Clone,
    F: Fn(&'r ArrestRecord) -> Option<K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut rows: Vec<CategoryCount<K>> = Vec::new();
    let mut missing = 0_u64;

    for record in records {
        let Some(key) = key_of(record) else {
            missing += 1;
            continue;
        };
        if let Some(&pos) = positions.get(&key) {
            rows[pos].count += 1;
        } else {
            positions.insert(key.clone(), rows.len());
            rows.push(CategoryCount { key, count: 1 });
        }
    }

    AggregateTable::from_first_seen(rows, missing)
}

/// Groups `records` by one categorical field.
///
/// Keys are the field's display labels, so the table can be charted
/// directly.
#[must_use]
pub fn aggregate<'r>(
    records: impl IntoIterator<Item = &'r ArrestRecord>,
    field: AggregateField,
) -> AggregateTable<String> {
    match field {
        AggregateField::CrimeType => {
            count_by(records, |r| Some(r.offense.as_str())).map_keys(str::to_string)
        }
        AggregateField::Sex => count_by(records, |r| Some(r.sex)).map_keys(|s| s.to_string()),
        AggregateField::AgeGroup => {
            count_by(records, |r| Some(r.age_group)).map_keys(|a| a.to_string())
        }
        AggregateField::Borough => count_by(records, |r| r.borough).map_keys(|b| b.to_string()),
        AggregateField::Precinct => count_by(records, |r| r.precinct).map_keys(|p| p.to_string()),
    }
}

/// Groups `records` by their region in the given layer.
///
/// Records without a borough (or precinct) are counted as missing.
#[must_use]
pub fn aggregate_regions<'r>(
    records: impl IntoIterator<Item = &'r ArrestRecord>,
    mode: ViewMode,
) -> AggregateTable<RegionKey> {
    count_by(records, |r| RegionKey::of_record(r, mode))
}

/// Builds the crime-type chart rows.
///
/// When between one and `restrict_max` crime types are selected, only
/// those types are kept (types absent from `records` simply do not appear).
/// Otherwise the `kind.top_n()` most frequent types are kept.
#[must_use]
pub fn crime_type_view<'r>(
    records: impl IntoIterator<Item = &'r ArrestRecord>,
    selected: &BTreeSet<String>,
    kind: ChartKind,
    restrict_max: usize,
) -> CrimeTypeView {
    let table = aggregate(records, AggregateField::CrimeType);

    if (1..=restrict_max).contains(&selected.len()) {
        log::debug!("Restricting crime chart to {} selected type(s)", selected.len());
        return CrimeTypeView {
            table: table.restrict_to(selected),
            mode: CrimeViewMode::Restricted,
        };
    }

    let limit = kind.top_n();
    CrimeTypeView {
        table: table.top(limit),
        mode: CrimeViewMode::Top { limit },
    }
}
