//! Chart rendering.
//!
//! The controller only decides *what* to draw. A [`ChartRenderer`] turns
//! aggregate tables into opaque [`ChartSpec`]s, so the front-end charting
//! library can change without touching the update logic.

use arrest_tracker_analytics_models::{AggregateField, AggregateTable, GeoTable};
use arrest_tracker_geography_models::RegionKey;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const VALUE_FIELD: &str = "Arrests";
const SELECTED_OPACITY: f64 = 0.9;
const UNSELECTED_OPACITY: f64 = 0.3;
const NO_DATA: &str = "No Data";

const CRIME_COLORS: &[&str] = &[
    "#E63946", "#1D3557", "#F1FAEE", "#457B9D", "#A8DADC", "#F1FAEE", "#1D3557", "#E63946",
    "#457B9D", "#A8DADC",
];
const GENDER_COLORS: &[&str] = &["#1D3557", "#E63946", "#457B9D"];
const AGE_COLORS: &[&str] = &["#1D3557", "#E63946", "#457B9D", "#A8DADC", "#90A955", "#F77F00"];

/// A renderer-specific chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSpec(Value);

impl ChartSpec {
    /// Wraps a JSON chart description.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Turns aggregate tables into chart specs.
pub trait ChartRenderer {
    /// Horizontal bar chart of `table`, categories labelled by `field`.
    fn bar(&self, table: &AggregateTable<String>, field: AggregateField, title: &str) -> ChartSpec;

    /// Pie chart of `table`, categories labelled by `field`.
    fn pie(&self, table: &AggregateTable<String>, field: AggregateField, title: &str) -> ChartSpec;

    /// Choropleth map of `table`, highlighting `selected` when set.
    fn choropleth(&self, table: &GeoTable<'_>, selected: Option<RegionKey>) -> ChartSpec;

    /// Placeholder bar chart for an empty result.
    fn empty_bar(&self) -> ChartSpec;

    /// Placeholder pie chart for an empty result.
    fn empty_pie(&self) -> ChartSpec;
}

/// Emits Vega-Lite style JSON specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl JsonChartRenderer {
    fn category_values(table: &AggregateTable<String>, field: AggregateField) -> Vec<Value> {
        table
            .rows()
            .iter()
            .map(|row| json!({ field.column(): row.key, VALUE_FIELD: row.count }))
            .collect()
    }

    const fn palette(field: AggregateField) -> &'static [&'static str] {
        match field {
            AggregateField::Sex => GENDER_COLORS,
            AggregateField::AgeGroup => AGE_COLORS,
            AggregateField::CrimeType | AggregateField::Borough | AggregateField::Precinct => {
                CRIME_COLORS
            }
        }
    }
}

impl ChartRenderer for JsonChartRenderer {
    fn bar(&self, table: &AggregateTable<String>, field: AggregateField, title: &str) -> ChartSpec {
        let column = field.column();
        ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": Self::category_values(table, field) },
            "mark": { "type": "bar", "color": CRIME_COLORS[0] },
            "encoding": {
                "y": { "field": column, "type": "nominal", "sort": "-x", "title": null },
                "x": { "field": VALUE_FIELD, "type": "quantitative", "title": "Number of Arrests" },
                "tooltip": [
                    { "field": column, "type": "nominal" },
                    { "field": VALUE_FIELD, "type": "quantitative", "format": "," },
                ],
            },
        }))
    }

    fn pie(&self, table: &AggregateTable<String>, field: AggregateField, title: &str) -> ChartSpec {
        let column = field.column();
        ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": Self::category_values(table, field) },
            "mark": { "type": "arc" },
            "encoding": {
                "theta": { "field": VALUE_FIELD, "type": "quantitative" },
                "color": {
                    "field": column,
                    "type": "nominal",
                    "scale": { "range": Self::palette(field) },
                    "legend": null,
                },
                "tooltip": [
                    { "field": column, "type": "nominal" },
                    { "field": VALUE_FIELD, "type": "quantitative", "format": "," },
                ],
            },
        }))
    }

    fn choropleth(&self, table: &GeoTable<'_>, selected: Option<RegionKey>) -> ChartSpec {
        let label = table.view_mode.field_name();
        let features: Vec<Value> = table
            .rows
            .iter()
            .map(|row| {
                let opacity = match selected {
                    Some(key) if key != row.key => UNSELECTED_OPACITY,
                    _ => SELECTED_OPACITY,
                };
                json!({
                    "type": "Feature",
                    "properties": {
                        label: region_label(row.key),
                        VALUE_FIELD: row.count,
                        "opacity": opacity,
                    },
                    "geometry": row.geometry.map_or(Value::Null, geometry_json),
                })
            })
            .collect();

        ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "width": 600,
            "height": 500,
            "data": { "values": features },
            "projection": { "type": "albersUsa" },
            "mark": { "type": "geoshape", "stroke": "grey" },
            "params": [{
                "name": "select_region",
                "select": { "type": "point", "fields": [label], "toggle": false },
            }],
            "encoding": {
                "color": {
                    "field": format!("properties.{VALUE_FIELD}"),
                    "type": "quantitative",
                    "scale": { "scheme": "blues" },
                },
                "opacity": { "field": "properties.opacity", "type": "quantitative", "scale": null },
                "tooltip": [
                    { "field": format!("properties.{label}"), "title": label },
                    { "field": format!("properties.{VALUE_FIELD}"), "title": VALUE_FIELD, "format": "," },
                ],
            },
        }))
    }

    fn empty_bar(&self) -> ChartSpec {
        ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": NO_DATA,
            "data": { "values": [] },
            "mark": { "type": "bar" },
        }))
    }

    fn empty_pie(&self) -> ChartSpec {
        ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": NO_DATA,
            "data": { "values": [{ "Category": NO_DATA, "Value": 1 }] },
            "mark": { "type": "arc", "tooltip": false },
            "encoding": {
                "theta": { "field": "Value", "type": "quantitative" },
                "color": { "value": "lightgray" },
            },
        }))
    }
}

/// Map label for a region: the borough name, or the bare precinct number so
/// a click round-trips through the selection signal unchanged.
fn region_label(key: RegionKey) -> Value {
    match key {
        RegionKey::Borough { name } => Value::String(name.to_string()),
        RegionKey::Precinct { id } => Value::from(id),
    }
}

fn geometry_json(geometry: &geo::MultiPolygon<f64>) -> Value {
    let geometry = geojson::Geometry::new(geojson::Value::from(geometry));
    serde_json::to_value(&geometry).unwrap_or_else(|e| {
        log::warn!("Failed to serialize region geometry: {e}");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrest_tracker_analytics_models::{CategoryCount, GeoRow};
    use arrest_tracker_arrest_models::Borough;
    use arrest_tracker_geography_models::ViewMode;
    use geo::{MultiPolygon, polygon};

    fn table() -> AggregateTable<String> {
        AggregateTable::from_first_seen(
            vec![
                CategoryCount {
                    key: "M".to_string(),
                    count: 3,
                },
                CategoryCount {
                    key: "F".to_string(),
                    count: 1,
                },
            ],
            0,
        )
    }

    #[test]
    fn pie_carries_rows_and_title() {
        let spec = JsonChartRenderer.pie(&table(), AggregateField::Sex, "Arrests by Gender");
        let value = spec.as_value();
        assert_eq!(value["title"], "Arrests by Gender");
        assert_eq!(value["data"]["values"][0]["PERP_SEX"], "M");
        assert_eq!(value["data"]["values"][0]["Arrests"], 3);
        assert_eq!(
            value["encoding"]["color"]["scale"]["range"][1],
            GENDER_COLORS[1]
        );
    }

    #[test]
    fn bar_sorts_by_count() {
        let spec = JsonChartRenderer.bar(&table(), AggregateField::CrimeType, "Top 5 Crime Types");
        assert_eq!(spec.as_value()["encoding"]["y"]["field"], "OFNS_DESC");
        assert_eq!(spec.as_value()["encoding"]["y"]["sort"], "-x");
    }

    #[test]
    fn empty_charts_say_no_data() {
        assert_eq!(JsonChartRenderer.empty_pie().as_value()["title"], NO_DATA);
        assert_eq!(JsonChartRenderer.empty_bar().as_value()["title"], NO_DATA);
    }

    #[test]
    fn choropleth_highlights_selection() {
        let outline = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]]);
        let brooklyn = RegionKey::Borough {
            name: Borough::Brooklyn,
        };
        let queens = RegionKey::Borough {
            name: Borough::Queens,
        };
        let geo = GeoTable {
            view_mode: ViewMode::Borough,
            rows: vec![
                GeoRow {
                    key: brooklyn,
                    count: 6,
                    geometry: Some(&outline),
                },
                GeoRow {
                    key: queens,
                    count: 4,
                    geometry: None,
                },
            ],
            unmatched: 0,
        };

        let spec = JsonChartRenderer.choropleth(&geo, Some(brooklyn));
        let features = spec.as_value()["data"]["values"].as_array().unwrap().clone();
        assert_eq!(features[0]["properties"]["Borough"], "Brooklyn");
        assert_eq!(features[0]["properties"]["opacity"], SELECTED_OPACITY);
        assert_eq!(features[1]["properties"]["opacity"], UNSELECTED_OPACITY);
        assert_eq!(features[0]["geometry"]["type"], "MultiPolygon");
        assert!(features[1]["geometry"].is_null());

        let spec = JsonChartRenderer.choropleth(&geo, None);
        let features = spec.as_value()["data"]["values"].as_array().unwrap().clone();
        assert!(
            features
                .iter()
                .all(|f| f["properties"]["opacity"] == SELECTED_OPACITY)
        );
    }

    #[test]
    fn precinct_labels_are_numbers() {
        assert_eq!(region_label(RegionKey::Precinct { id: 75 }), json!(75));
    }
}
