//! Borough and precinct reference layers.
//!
//! Both layers arrive as `GeoJSON` `FeatureCollection`s. Each feature is
//! keyed by one configurable property; features whose key cannot be mapped
//! to a [`RegionKey`] are skipped with a warning since they can never be
//! joined against arrest counts.

use arrest_tracker_arrest_models::Borough;
use arrest_tracker_geography_models::{GeoRegion, RegionKey, ViewMode};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson};

use crate::DatasetError;
use crate::parsing::coerce_precinct_value;

/// Parses a reference layer from a `GeoJSON` string.
///
/// `key_property` names the feature property holding the region id (a
/// borough name or a precinct number, depending on `mode`).
///
/// # Errors
///
/// Returns [`DatasetError`] if the input is not valid `GeoJSON` or is not a
/// `FeatureCollection`.
pub fn parse_region_layer(
    geojson_str: &str,
    mode: ViewMode,
    key_property: &str,
) -> Result<Vec<GeoRegion>, DatasetError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(DatasetError::Conversion {
            message: format!("{} layer is not a FeatureCollection", mode.field_name()),
        });
    };

    let mut regions = Vec::with_capacity(collection.features.len());
    let mut skipped = 0_usize;

    for feature in &collection.features {
        let Some(key) = feature_key(feature, mode, key_property) else {
            skipped += 1;
            continue;
        };

        let geometry = feature_geometry(feature);
        if geometry.is_none() {
            log::warn!("{key} has no usable polygon geometry");
        }

        regions.push(GeoRegion { key, geometry });
    }

    if skipped > 0 {
        log::warn!(
            "Skipped {skipped} {} feature(s) without a valid '{key_property}' property",
            mode.field_name()
        );
    }

    Ok(regions)
}

fn feature_key(feature: &Feature, mode: ViewMode, key_property: &str) -> Option<RegionKey> {
    let value = feature.property(key_property)?;
    match mode {
        ViewMode::Borough => value
            .as_str()
            .and_then(Borough::from_name)
            .map(|name| RegionKey::Borough { name }),
        ViewMode::Precinct => coerce_precinct_value(value).map(|id| RegionKey::Precinct { id }),
    }
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn feature_geometry(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geometry = feature.geometry.clone()?;
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOROUGHS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Brooklyn", "cartodb_id": 1 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Staten Island" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Jersey City" },
                "geometry": null
            }
        ]
    }"#;

    const PRECINCTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "precinct": "75" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "precinct": 14 },
                "geometry": { "type": "Point", "coordinates": [0.5, 0.5] }
            },
            {
                "type": "Feature",
                "properties": { "precinct": "unknown" },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_borough_layer() {
        let regions = parse_region_layer(BOROUGHS, ViewMode::Borough, "name").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(
            regions[0].key,
            RegionKey::Borough {
                name: Borough::Brooklyn
            }
        );
        assert_eq!(
            regions[1].key,
            RegionKey::Borough {
                name: Borough::StatenIsland
            }
        );
        assert!(regions.iter().all(|r| r.geometry.is_some()));
    }

    #[test]
    fn parses_precinct_layer_with_coercion() {
        let regions = parse_region_layer(PRECINCTS, ViewMode::Precinct, "precinct").unwrap();
        let keys: Vec<RegionKey> = regions.iter().map(|r| r.key).collect();
        assert_eq!(
            keys,
            vec![
                RegionKey::Precinct { id: 75 },
                RegionKey::Precinct { id: 14 }
            ]
        );
        assert!(regions[0].geometry.is_some());
        // A point is not a usable region outline.
        assert!(regions[1].geometry.is_none());
    }

    #[test]
    fn rejects_non_collection() {
        let point = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        let err = parse_region_layer(point, ViewMode::Borough, "name").unwrap_err();
        assert!(matches!(err, DatasetError::Conversion { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_region_layer("{not json", ViewMode::Borough, "name").is_err());
    }
}
