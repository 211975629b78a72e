#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Immutable arrest dataset store.
//!
//! Loads the arrest CSV and the borough/precinct `GeoJSON` layers once at
//! startup, applies every normalization step exactly once, and exposes the
//! result as a read-only [`Dataset`] together with the lookup tables the
//! dashboard needs (sorted crime types, date bounds, known precincts).

pub mod geometry;
pub mod parsing;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use arrest_tracker_arrest_models::{AgeGroup, ArrestRecord, Borough, PerpSex};
use arrest_tracker_geography_models::{GeoRegion, RegionKey, ViewMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parsing::{coerce_precinct, parse_arrest_date};

/// Precinct id present in the raw export that has no real jurisdiction.
pub const INVALID_PRECINCT: i32 = 483;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Reading an input file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The arrest CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A reference layer is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Input was readable but structurally unusable.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Where the dataset files live and how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Arrest records CSV.
    pub arrests: PathBuf,
    /// Borough boundaries `GeoJSON`.
    pub boroughs: PathBuf,
    /// Precinct boundaries `GeoJSON`.
    pub precincts: PathBuf,
    /// Precinct ids whose rows are dropped at load time.
    pub excluded_precincts: Vec<i32>,
    /// Borough layer property holding the borough name.
    pub borough_name_property: String,
    /// Precinct layer property holding the precinct number.
    pub precinct_id_property: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            arrests: PathBuf::from("data/processed/arrests.csv"),
            boroughs: PathBuf::from("data/processed/boroughs.geojson"),
            precincts: PathBuf::from("data/processed/precincts.geojson"),
            excluded_precincts: vec![INVALID_PRECINCT],
            borough_name_property: "name".to_string(),
            precinct_id_property: "precinct".to_string(),
        }
    }
}

/// Counts of rows touched by normalization during a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows read from the CSV.
    pub rows_read: u64,
    /// Rows dropped because their precinct is excluded.
    pub excluded: u64,
    /// Rows the CSV reader could not decode at all.
    pub malformed: u64,
    /// Rows whose borough code did not map to a borough.
    pub unmapped_borough: u64,
    /// Rows whose precinct was missing or non-numeric.
    pub invalid_precinct: u64,
    /// Rows whose arrest date could not be parsed.
    pub invalid_date: u64,
}

/// Inclusive date span covered by the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateBounds {
    /// Earliest arrest date.
    pub min: NaiveDate,
    /// Latest arrest date.
    pub max: NaiveDate,
}

impl DateBounds {
    /// Clamps `date` into the bounds.
    #[must_use]
    pub fn clamp(self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }
}

/// The loaded, normalized arrest dataset. Read-only after construction.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<ArrestRecord>,
    boroughs: Vec<GeoRegion>,
    precincts: Vec<GeoRegion>,
    crime_types: Vec<String>,
    date_bounds: Option<DateBounds>,
    known_precincts: BTreeSet<i32>,
}

impl Dataset {
    /// Loads the dataset from the files named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if a file cannot be read or is not a CSV /
    /// `GeoJSON` `FeatureCollection`. Row-level problems never fail the load.
    pub fn load(config: &DataConfig) -> Result<Self, DatasetError> {
        log::info!("Loading arrests from {}", config.arrests.display());
        let file = std::fs::File::open(&config.arrests)?;
        let (records, report) = load_arrests(file, &config.excluded_precincts)?;
        log::info!(
            "Loaded {} arrests ({} read, {} excluded, {} malformed, {} unmapped borough, {} invalid precinct, {} invalid date)",
            records.len(),
            report.rows_read,
            report.excluded,
            report.malformed,
            report.unmapped_borough,
            report.invalid_precinct,
            report.invalid_date,
        );

        let boroughs = load_layer(
            &config.boroughs,
            ViewMode::Borough,
            &config.borough_name_property,
        )?;
        log::info!("Loaded {} borough boundaries", boroughs.len());

        let precincts = load_layer(
            &config.precincts,
            ViewMode::Precinct,
            &config.precinct_id_property,
        )?;
        log::info!("Loaded {} precinct boundaries", precincts.len());

        Ok(Self::from_parts(records, boroughs, precincts))
    }

    /// Builds a dataset from already-normalized parts and derives the
    /// lookup tables.
    #[must_use]
    pub fn from_parts(
        records: Vec<ArrestRecord>,
        boroughs: Vec<GeoRegion>,
        precincts: Vec<GeoRegion>,
    ) -> Self {
        let crime_types: Vec<String> = records
            .iter()
            .map(|r| r.offense.as_str())
            .filter(|o| !o.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let date_bounds = records
            .iter()
            .filter_map(|r| r.date)
            .fold(None, |bounds: Option<DateBounds>, date| {
                Some(bounds.map_or(DateBounds { min: date, max: date }, |b| DateBounds {
                    min: b.min.min(date),
                    max: b.max.max(date),
                }))
            });

        let known_precincts = records
            .iter()
            .filter_map(|r| r.precinct)
            .chain(precincts.iter().filter_map(|region| match region.key {
                RegionKey::Precinct { id } => Some(id),
                RegionKey::Borough { .. } => None,
            }))
            .collect();

        Self {
            records,
            boroughs,
            precincts,
            crime_types,
            date_bounds,
            known_precincts,
        }
    }

    /// All arrest records.
    #[must_use]
    pub fn records(&self) -> &[ArrestRecord] {
        &self.records
    }

    /// Reference layer for the given map mode.
    #[must_use]
    pub fn region_layer(&self, mode: ViewMode) -> &[GeoRegion] {
        match mode {
            ViewMode::Borough => &self.boroughs,
            ViewMode::Precinct => &self.precincts,
        }
    }

    /// Sorted distinct offense descriptions.
    #[must_use]
    pub fn crime_types(&self) -> &[String] {
        &self.crime_types
    }

    /// Earliest and latest arrest date, or `None` if no record has a date.
    #[must_use]
    pub const fn date_bounds(&self) -> Option<DateBounds> {
        self.date_bounds
    }

    /// Returns `true` if `id` appears in the records or the precinct layer.
    #[must_use]
    pub fn knows_precinct(&self, id: i32) -> bool {
        self.known_precincts.contains(&id)
    }
}

/// Raw CSV row. Every column is optional; absent columns read as `None`.
#[derive(Debug, Deserialize)]
struct RawArrestRow {
    #[serde(rename = "ARREST_DATE", default)]
    arrest_date: Option<String>,
    #[serde(rename = "OFNS_DESC", default)]
    ofns_desc: Option<String>,
    #[serde(rename = "ARREST_BORO", default)]
    arrest_boro: Option<String>,
    #[serde(rename = "ARREST_PRECINCT", default)]
    arrest_precinct: Option<String>,
    #[serde(rename = "PERP_SEX", default)]
    perp_sex: Option<String>,
    #[serde(rename = "AGE_GROUP", default)]
    age_group: Option<String>,
}

/// Reads and normalizes arrest rows from CSV.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header row cannot be read.
pub fn load_arrests<R: Read>(
    reader: R,
    excluded_precincts: &[i32],
) -> Result<(Vec<ArrestRecord>, LoadReport), DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<RawArrestRow>() {
        report.rows_read += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Skipping malformed arrest row: {e}");
                report.malformed += 1;
                continue;
            }
        };

        let precinct = row.arrest_precinct.as_deref().and_then(coerce_precinct);
        if precinct.is_some_and(|p| excluded_precincts.contains(&p)) {
            report.excluded += 1;
            continue;
        }
        if precinct.is_none() {
            report.invalid_precinct += 1;
        }

        let borough = row.arrest_boro.as_deref().and_then(Borough::from_code);
        if borough.is_none() {
            report.unmapped_borough += 1;
        }

        let date = row.arrest_date.as_deref().and_then(parse_arrest_date);
        if date.is_none() {
            report.invalid_date += 1;
        }

        records.push(ArrestRecord {
            precinct,
            borough,
            offense: row.ofns_desc.unwrap_or_default(),
            sex: row
                .perp_sex
                .as_deref()
                .map_or(PerpSex::Unknown, PerpSex::parse_lossy),
            age_group: row
                .age_group
                .as_deref()
                .map_or(AgeGroup::Unknown, AgeGroup::parse_lossy),
            date,
        });
    }

    Ok((records, report))
}

fn load_layer(
    path: &Path,
    mode: ViewMode,
    key_property: &str,
) -> Result<Vec<GeoRegion>, DatasetError> {
    let contents = std::fs::read_to_string(path)?;
    geometry::parse_region_layer(&contents, mode, key_property)
}
