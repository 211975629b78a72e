#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! NYPD arrest record types and enumerated field definitions.
//!
//! This crate defines the normalized shape of a single arrest row and the
//! small fixed vocabularies (boroughs, perpetrator sex, age buckets) that
//! the rest of the arrest tracker filters and aggregates on. Raw source
//! values are mapped into these types once, at load time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the five New York City boroughs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Borough {
    /// Arrest code `B`
    #[strum(to_string = "Bronx")]
    Bronx,
    /// Arrest code `K`
    #[strum(to_string = "Brooklyn")]
    Brooklyn,
    /// Arrest code `M`
    #[strum(to_string = "Manhattan")]
    Manhattan,
    /// Arrest code `Q`
    #[strum(to_string = "Queens")]
    Queens,
    /// Arrest code `S`
    #[serde(rename = "Staten Island")]
    #[strum(to_string = "Staten Island")]
    StatenIsland,
}

impl Borough {
    /// Maps a one-letter `ARREST_BORO` code to its borough.
    ///
    /// Returns `None` for anything outside the five known codes.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "B" => Some(Self::Bronx),
            "K" => Some(Self::Brooklyn),
            "M" => Some(Self::Manhattan),
            "Q" => Some(Self::Queens),
            "S" => Some(Self::StatenIsland),
            _ => None,
        }
    }

    /// Looks up a borough by its canonical name (e.g. `"Staten Island"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// Returns the one-letter `ARREST_BORO` code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bronx => "B",
            Self::Brooklyn => "K",
            Self::Manhattan => "M",
            Self::Queens => "Q",
            Self::StatenIsland => "S",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Bronx,
            Self::Brooklyn,
            Self::Manhattan,
            Self::Queens,
            Self::StatenIsland,
        ]
    }
}

/// Perpetrator sex as recorded on the arrest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PerpSex {
    /// `M`
    #[serde(rename = "M")]
    #[strum(to_string = "M")]
    Male,
    /// `F`
    #[serde(rename = "F")]
    #[strum(to_string = "F")]
    Female,
    /// `U`, or any value outside the known set
    #[serde(rename = "U")]
    #[strum(to_string = "U")]
    Unknown,
}

impl PerpSex {
    /// Parses a raw `PERP_SEX` value, falling back to
    /// [`PerpSex::Unknown`] for anything unrecognized.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        raw.trim().to_uppercase().parse().unwrap_or(Self::Unknown)
    }
}

/// Perpetrator age bucket as recorded on the arrest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AgeGroup {
    /// Under 18
    #[serde(rename = "<18")]
    #[strum(to_string = "<18")]
    Under18,
    /// 18 through 24
    #[serde(rename = "18-24")]
    #[strum(to_string = "18-24")]
    From18To24,
    /// 25 through 44
    #[serde(rename = "25-44")]
    #[strum(to_string = "25-44")]
    From25To44,
    /// 45 through 64
    #[serde(rename = "45-64")]
    #[strum(to_string = "45-64")]
    From45To64,
    /// 65 and over
    #[serde(rename = "65+")]
    #[strum(to_string = "65+")]
    Over64,
    /// Missing or unrecognized bucket
    #[serde(rename = "UNKNOWN")]
    #[strum(to_string = "UNKNOWN")]
    Unknown,
}

impl AgeGroup {
    /// Parses a raw `AGE_GROUP` value, falling back to
    /// [`AgeGroup::Unknown`] for anything unrecognized.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }
}

/// A single normalized arrest.
///
/// Records are immutable once loaded. Nullable fields hold `None` where the
/// source value could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrestRecord {
    /// Arresting precinct.
    pub precinct: Option<i32>,
    /// Borough the arrest was made in.
    pub borough: Option<Borough>,
    /// Offense description (`OFNS_DESC`).
    pub offense: String,
    /// Perpetrator sex.
    pub sex: PerpSex,
    /// Perpetrator age bucket.
    pub age_group: AgeGroup,
    /// Arrest date.
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borough_code_roundtrip() {
        for borough in Borough::all() {
            assert_eq!(Borough::from_code(borough.code()), Some(*borough));
        }
    }

    #[test]
    fn unknown_borough_code() {
        assert_eq!(Borough::from_code("X"), None);
        assert_eq!(Borough::from_code(""), None);
    }

    #[test]
    fn borough_names() {
        assert_eq!(Borough::StatenIsland.to_string(), "Staten Island");
        assert_eq!(
            Borough::from_name("Staten Island"),
            Some(Borough::StatenIsland)
        );
        assert_eq!(Borough::from_name(" Brooklyn "), Some(Borough::Brooklyn));
        assert_eq!(Borough::from_name("75"), None);
    }

    #[test]
    fn borough_serializes_canonical_name() {
        let json = serde_json::to_string(&Borough::StatenIsland).unwrap();
        assert_eq!(json, "\"Staten Island\"");
    }

    #[test]
    fn sex_parse_lossy() {
        assert_eq!(PerpSex::parse_lossy("M"), PerpSex::Male);
        assert_eq!(PerpSex::parse_lossy("f"), PerpSex::Female);
        assert_eq!(PerpSex::parse_lossy("(null)"), PerpSex::Unknown);
    }

    #[test]
    fn age_group_parse_lossy() {
        assert_eq!(AgeGroup::parse_lossy("<18"), AgeGroup::Under18);
        assert_eq!(AgeGroup::parse_lossy("65+"), AgeGroup::Over64);
        assert_eq!(AgeGroup::parse_lossy("1022"), AgeGroup::Unknown);
        assert_eq!(AgeGroup::Over64.to_string(), "65+");
    }
}
