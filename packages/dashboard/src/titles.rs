//! Chart titles.

use std::collections::BTreeSet;

use arrest_tracker_analytics_models::CrimeViewMode;
use arrest_tracker_geography_models::RegionKey;

/// Title for the crime-type chart.
#[must_use]
pub fn crime_chart_title(
    mode: CrimeViewMode,
    region: Option<RegionKey>,
    crime_types: &BTreeSet<String>,
) -> String {
    let base = match mode {
        CrimeViewMode::Restricted => "Selected Crime Types".to_string(),
        CrimeViewMode::Top { limit } => format!("Top {limit} Crime Types"),
    };
    with_suffixes(&base, region, crime_types)
}

/// Title for the gender chart.
#[must_use]
pub fn gender_chart_title(region: Option<RegionKey>, crime_types: &BTreeSet<String>) -> String {
    with_suffixes("Arrests by Gender", region, crime_types)
}

/// Title for the age-group chart.
#[must_use]
pub fn age_chart_title(region: Option<RegionKey>, crime_types: &BTreeSet<String>) -> String {
    with_suffixes("Arrests by Age Group", region, crime_types)
}

fn with_suffixes(base: &str, region: Option<RegionKey>, crime_types: &BTreeSet<String>) -> String {
    let region = region.map(|r| format!(" in {r}")).unwrap_or_default();
    let crimes = match crime_types.len() {
        0 => String::new(),
        1 => crime_types
            .first()
            .map(|only| format!(" - {only}"))
            .unwrap_or_default(),
        n => format!(" - Selected Crimes ({n})"),
    };
    format!("{base}{region}{crimes}")
}
