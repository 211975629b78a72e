#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the arrest tracker server.
//!
//! Dashboard updates and controller state are served in their own
//! serialized form; the types here cover the endpoints that have no
//! counterpart in the dashboard crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Values for populating the dashboard controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Distinct offense descriptions, sorted.
    pub crime_types: Vec<String>,
    /// Earliest arrest date, if any record is dated.
    pub min_date: Option<NaiveDate>,
    /// Latest arrest date, if any record is dated.
    pub max_date: Option<NaiveDate>,
    /// Canonical borough names.
    pub boroughs: Vec<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body from any displayable error.
    #[must_use]
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_use_camel_case() {
        let options = ApiOptions {
            crime_types: vec!["ROBBERY".to_string()],
            min_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            max_date: None,
            boroughs: vec!["Bronx".to_string()],
        };
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["crimeTypes"][0], "ROBBERY");
        assert_eq!(value["minDate"], "2024-01-01");
        assert!(value["maxDate"].is_null());
    }
}
