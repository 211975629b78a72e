#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter, aggregate, and geo-table types.
//!
//! Defines the inputs to the filter resolver ([`FilterState`], [`Trigger`])
//! and the derived tables it feeds ([`AggregateTable`], [`GeoTable`]).

use std::collections::BTreeSet;

use arrest_tracker_arrest_models::ArrestRecord;
use arrest_tracker_geography_models::{RegionKey, ViewMode};
use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Inclusive date range. A missing bound disables the date predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First day included.
    pub start: Option<NaiveDate>,
    /// Last day included.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a range with both bounds set.
    #[must_use]
    pub const fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns both bounds when the range is fully specified.
    #[must_use]
    pub const fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Returns `true` if `date` passes this range.
    ///
    /// A half-open range matches everything. An undated record never
    /// matches a fully bounded range.
    #[must_use]
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        self.bounds().is_none_or(|(start, end)| {
            date.is_some_and(|d| start <= d && d <= end)
        })
    }
}

/// The complete filter intent for one update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Date range, if any.
    pub date_range: Option<DateRange>,
    /// Offense descriptions to keep. Empty means no restriction.
    pub crime_types: BTreeSet<String>,
    /// Region predicate, if any.
    pub selected_region: Option<RegionKey>,
    /// Map layer currently displayed.
    pub view_mode: ViewMode,
}

impl FilterState {
    /// Returns `true` if `record` passes the date and crime-type predicates.
    #[must_use]
    pub fn admits_unregioned(&self, record: &ArrestRecord) -> bool {
        self.date_range.is_none_or(|range| range.admits(record.date))
            && (self.crime_types.is_empty() || self.crime_types.contains(&record.offense))
    }
}

/// The control that fired an update cycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Trigger {
    /// First render, before any control fired.
    Initial,
    /// Borough/precinct map switch.
    ToggleView,
    /// Crime-type multi-select changed.
    ChangeCrimeSelection,
    /// Date picker changed.
    ChangeDateRange,
    /// A map region was clicked.
    ClickRegion,
    /// Apply button.
    ClickApply,
    /// Reset button.
    ClickReset,
}

/// Categorical record field that can be counted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AggregateField {
    /// Offense description.
    CrimeType,
    /// Perpetrator sex.
    Sex,
    /// Perpetrator age bucket.
    AgeGroup,
    /// Borough name.
    Borough,
    /// Precinct number.
    Precinct,
}

impl AggregateField {
    /// Source column name, used as the category field in chart data.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CrimeType => "OFNS_DESC",
            Self::Sex => "PERP_SEX",
            Self::AgeGroup => "AGE_GROUP",
            Self::Borough => "Borough",
            Self::Precinct => "Precinct",
        }
    }
}

/// Chart style for the crime-type view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    /// Horizontal bar chart.
    #[default]
    Bar,
    /// Pie chart.
    Pie,
}

impl ChartKind {
    /// How many leading categories an unrestricted view keeps.
    #[must_use]
    pub const fn top_n(self) -> usize {
        match self {
            Self::Bar => 5,
            Self::Pie => 10,
        }
    }
}

/// Count of records in a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount<K> {
    /// Category value.
    pub key: K,
    /// Number of records.
    pub count: u64,
}

/// Record counts grouped by one categorical key.
///
/// Rows are ordered by descending count; ties keep the order in which the
/// key was first seen. Records with no value for the key are tallied in
/// [`AggregateTable::missing`] rather than dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTable<K> {
    rows: Vec<CategoryCount<K>>,
    missing: u64,
}

impl<K> AggregateTable<K> {
    /// Builds a table from rows listed in first-seen order.
    #[must_use]
    pub fn from_first_seen(mut rows: Vec<CategoryCount<K>>, missing: u64) -> Self {
        // Stable sort keeps first-seen order among equal counts.
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Self { rows, missing }
    }

    /// An empty table.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rows: Vec::new(),
            missing: 0,
        }
    }

    /// Rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[CategoryCount<K>] {
        &self.rows
    }

    /// Records that had no value for the key.
    #[must_use]
    pub const fn missing(&self) -> u64 {
        self.missing
    }

    /// Sum of all row counts (excluding [`Self::missing`]).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Keeps only the first `n` rows.
    #[must_use]
    pub fn top(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Converts every key, keeping row order and the missing count.
    #[must_use]
    pub fn map_keys<J>(self, mut f: impl FnMut(K) -> J) -> AggregateTable<J> {
        AggregateTable {
            rows: self
                .rows
                .into_iter()
                .map(|r| CategoryCount {
                    key: f(r.key),
                    count: r.count,
                })
                .collect(),
            missing: self.missing,
        }
    }
}

impl<K: PartialEq> AggregateTable<K> {
    /// Count for `key`, or 0.
    #[must_use]
    pub fn count_of(&self, key: &K) -> u64 {
        self.rows
            .iter()
            .find(|r| &r.key == key)
            .map_or(0, |r| r.count)
    }
}

impl<K: Ord> AggregateTable<K> {
    /// Keeps only rows whose key is in `keys`, preserving order.
    #[must_use]
    pub fn restrict_to(mut self, keys: &BTreeSet<K>) -> Self {
        self.rows.retain(|r| keys.contains(&r.key));
        self
    }
}

/// How the crime-type view chose its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CrimeViewMode {
    /// Only the actively selected crime types are shown.
    Restricted,
    /// The `limit` most frequent crime types are shown.
    Top {
        /// Row cap.
        limit: usize,
    },
}

/// Crime-type counts prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeTypeView {
    /// Rows to chart.
    pub table: AggregateTable<String>,
    /// Selection rule that produced the rows.
    pub mode: CrimeViewMode,
}

/// What happened to the region predicate during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RegionOutcome {
    /// No region was selected.
    NotRequested,
    /// The region predicate narrowed the result.
    Applied {
        /// Region applied.
        region: RegionKey,
    },
    /// The region matched nothing, so the predicate was dropped.
    FellBack {
        /// Region that matched nothing.
        region: RegionKey,
    },
}

impl RegionOutcome {
    /// The region that actually narrowed the result, if any.
    #[must_use]
    pub const fn applied(self) -> Option<RegionKey> {
        match self {
            Self::Applied { region } => Some(region),
            Self::NotRequested | Self::FellBack { .. } => None,
        }
    }
}

/// One render-ready map row, borrowing its outline from the reference layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRow<'a> {
    /// Region identifier.
    pub key: RegionKey,
    /// Matching records (0 when none).
    pub count: u64,
    /// Region outline.
    pub geometry: Option<&'a MultiPolygon<f64>>,
}

/// Region counts joined onto reference geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable<'a> {
    /// Layer the rows belong to.
    pub view_mode: ViewMode,
    /// Exactly one row per distinct reference region.
    pub rows: Vec<GeoRow<'a>>,
    /// Records whose region is null or has no reference geometry.
    pub unmatched: u64,
}

impl GeoTable<'_> {
    /// Sum of row counts plus [`Self::unmatched`].
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum::<u64>() + self.unmatched
    }

    /// Count for `key`, or `None` if the region is not in the table.
    #[must_use]
    pub fn count_of(&self, key: RegionKey) -> Option<u64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.count)
    }
}
