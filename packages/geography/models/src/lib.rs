#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Borough and precinct region types.
//!
//! Boroughs and precincts share one map selection channel but live in
//! separate identifier spaces. [`RegionKey`] keeps them apart as an explicit
//! tagged union, and [`RegionSignal`] classifies the raw values coming back
//! from a map click into that union exactly once.

use std::fmt;

use arrest_tracker_arrest_models::{ArrestRecord, Borough};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Which geographic layer the map is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// Five borough polygons.
    #[default]
    Borough,
    /// Police precinct polygons.
    Precinct,
}

impl ViewMode {
    /// Returns the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Borough => Self::Precinct,
            Self::Precinct => Self::Borough,
        }
    }

    /// Field name used for the region column in rendered map data.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Borough => "Borough",
            Self::Precinct => "Precinct",
        }
    }
}

/// Identifies a single selectable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RegionKey {
    /// A borough, by canonical name.
    Borough {
        /// The borough.
        name: Borough,
    },
    /// A precinct, by number.
    Precinct {
        /// Precinct number.
        id: i32,
    },
}

impl RegionKey {
    /// Classifies a raw textual identifier.
    ///
    /// Borough names win; anything else that parses as an integer is a
    /// precinct. Returns `None` when the value is neither.
    #[must_use]
    pub fn classify(raw: &str) -> Option<Self> {
        if let Some(name) = Borough::from_name(raw) {
            return Some(Self::Borough { name });
        }
        raw.trim().parse().ok().map(|id| Self::Precinct { id })
    }

    /// The layer this key belongs to.
    #[must_use]
    pub const fn view_mode(self) -> ViewMode {
        match self {
            Self::Borough { .. } => ViewMode::Borough,
            Self::Precinct { .. } => ViewMode::Precinct,
        }
    }

    /// Returns `true` if `record` falls inside this region.
    #[must_use]
    pub fn contains(self, record: &ArrestRecord) -> bool {
        match self {
            Self::Borough { name } => record.borough == Some(name),
            Self::Precinct { id } => record.precinct == Some(id),
        }
    }

    /// Extracts the key of `record` for the given layer, if it has one.
    #[must_use]
    pub fn of_record(record: &ArrestRecord, mode: ViewMode) -> Option<Self> {
        match mode {
            ViewMode::Borough => record.borough.map(|name| Self::Borough { name }),
            ViewMode::Precinct => record.precinct.map(|id| Self::Precinct { id }),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borough { name } => write!(f, "{name}"),
            Self::Precinct { id } => write!(f, "Precinct {id}"),
        }
    }
}

/// A reference polygon for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRegion {
    /// Region identifier.
    pub key: RegionKey,
    /// Boundary, if the source feature carried a usable one.
    pub geometry: Option<MultiPolygon<f64>>,
}

/// A classified map selection signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSignal {
    /// The selection was emptied (click on background, or no payload).
    Cleared,
    /// A borough or precinct was selected.
    Selected(RegionKey),
    /// A value was present but is neither a borough name nor a number.
    Unrecognized(String),
}

impl RegionSignal {
    /// Classifies the payload of a map selection signal.
    ///
    /// Accepts either `{"select_region": {"Borough": [...]}}` or the inner
    /// object directly. The `Borough` field takes precedence over
    /// `Precinct`; list values use their first element.
    #[must_use]
    pub fn parse(signal: &serde_json::Value) -> Self {
        let inner = signal.get("select_region").unwrap_or(signal);
        if !inner.is_object() {
            return Self::Cleared;
        }

        let value = ["Borough", "Precinct"]
            .iter()
            .filter_map(|field| inner.get(*field))
            .map(first_element)
            .find(|v| !is_blank(v));

        let Some(value) = value else {
            return Self::Cleared;
        };

        match value {
            serde_json::Value::String(s) => RegionKey::classify(s)
                .map_or_else(|| Self::Unrecognized(s.clone()), Self::Selected),
            serde_json::Value::Number(n) => n
                .as_i64()
                .and_then(|id| i32::try_from(id).ok())
                .or_else(|| n.as_f64().and_then(whole_i32))
                .map_or_else(
                    || Self::Unrecognized(n.to_string()),
                    |id| Self::Selected(RegionKey::Precinct { id }),
                ),
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

static NULL: serde_json::Value = serde_json::Value::Null;

#[allow(clippy::cast_possible_truncation)]
fn whole_i32(f: f64) -> Option<i32> {
    if f.fract() != 0.0 || f < f64::from(i32::MIN) || f > f64::from(i32::MAX) {
        return None;
    }
    Some(f as i32)
}

fn first_element(value: &serde_json::Value) -> &serde_json::Value {
    match value {
        serde_json::Value::Array(items) => items.first().unwrap_or(&NULL),
        other => other,
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
