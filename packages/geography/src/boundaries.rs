//! Municipality boundary loading from `GeoJSON`.
//!
//! Each feature of the input `FeatureCollection` becomes a
//! [`MunicipalPolygon`]. The municipality code is read from a configurable
//! property and kept in its raw form; coercion happens at join time.

use std::path::Path;

use geo::MultiPolygon;
use geojson::{Feature, GeoJson};
use malaria_choco_cases_models::RawMunicipalityCode;
use malaria_choco_geography_models::MunicipalPolygon;

use crate::GeoError;

/// Feature property holding the municipality code.
pub const DEFAULT_CODE_PROPERTY: &str = "COD_MUN";

/// Loads municipality boundaries from a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`GeoError`] if the file cannot be read or is not a `GeoJSON`
/// `FeatureCollection`.
pub fn load_municipalities(
    path: impl AsRef<Path>,
    code_property: &str,
) -> Result<Vec<MunicipalPolygon>, GeoError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let polygons = parse_municipalities(&text, code_property)?;

    log::info!(
        "Loaded {} municipal boundaries from {}",
        polygons.len(),
        path.display()
    );

    Ok(polygons)
}

/// Parses municipality boundaries from a `GeoJSON` string.
///
/// Every feature must carry a usable code property and an areal geometry.
///
/// # Errors
///
/// Returns [`GeoError`] if the text is not a `GeoJSON` `FeatureCollection`,
/// or [`GeoError::Conversion`] naming the first feature with a null or
/// non-scalar code or a non-polygon geometry.
pub fn parse_municipalities(
    geojson_str: &str,
    code_property: &str,
) -> Result<Vec<MunicipalPolygon>, GeoError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::Conversion {
            message: "expected a GeoJSON FeatureCollection of municipalities".to_owned(),
        });
    };

    let mut polygons = Vec::with_capacity(collection.features.len());

    for (i, feature) in collection.features.into_iter().enumerate() {
        let Some(code) = feature.property(code_property).and_then(raw_code) else {
            return Err(GeoError::Conversion {
                message: format!("feature {i} has no usable '{code_property}' property"),
            });
        };

        let Some(geometry) = feature_to_multipolygon(&feature) else {
            return Err(GeoError::Conversion {
                message: format!("feature {i} (code {code}) has no polygon geometry"),
            });
        };

        polygons.push(MunicipalPolygon {
            code,
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    Ok(polygons)
}

/// Reads a code property as text or number. Null, booleans, and nested
/// values are unusable.
fn raw_code(value: &serde_json::Value) -> Option<RawMunicipalityCode> {
    match value {
        serde_json::Value::String(s) => Some(RawMunicipalityCode::Text(s.clone())),
        serde_json::Value::Number(n) => n.as_i64().map_or_else(
            || n.as_f64().map(RawMunicipalityCode::Float),
            |v| Some(RawMunicipalityCode::Integer(v)),
        ),
        _ => None,
    }
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn feature_to_multipolygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
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

    const CHOCO: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "properties": { "COD_MUN": 27001, "NOM_MUN": "QUIBDO" },
          "geometry": {
            "type": "Polygon",
            "coordinates": [[[-76.7, 5.6], [-76.5, 5.6], [-76.5, 5.8], [-76.7, 5.8], [-76.7, 5.6]]]
          }
        },
        {
          "type": "Feature",
          "properties": { "COD_MUN": "27006", "NOM_MUN": "ACANDI" },
          "geometry": {
            "type": "MultiPolygon",
            "coordinates": [
              [[[-77.3, 8.4], [-77.1, 8.4], [-77.1, 8.6], [-77.3, 8.6], [-77.3, 8.4]]],
              [[[-77.5, 8.7], [-77.4, 8.7], [-77.4, 8.8], [-77.5, 8.7]]]
            ]
          }
        },
        {
          "type": "Feature",
          "properties": { "COD_MUN": 27025.0, "NOM_MUN": "ALTO BAUDO" },
          "geometry": {
            "type": "Polygon",
            "coordinates": [[[-76.0, 6.0], [-75.9, 6.0], [-75.9, 6.1], [-76.0, 6.0]]]
          }
        }
      ]
    }"#;

    fn single_feature(properties: &str, geometry: &str) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {properties}, "geometry": {geometry}}}
            ]}}"#
        )
    }

    const TRIANGLE: &str = r#"{
      "type": "Polygon",
      "coordinates": [[[-76.0, 6.0], [-75.9, 6.0], [-75.9, 6.1], [-76.0, 6.0]]]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let polygons = parse_municipalities(CHOCO, DEFAULT_CODE_PROPERTY).unwrap();
        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0].geometry.0.len(), 1);
        assert_eq!(polygons[1].geometry.0.len(), 2);
    }

    #[test]
    fn keeps_raw_code_representation() {
        let polygons = parse_municipalities(CHOCO, DEFAULT_CODE_PROPERTY).unwrap();
        assert_eq!(polygons[0].code, RawMunicipalityCode::Integer(27001));
        assert_eq!(polygons[1].code, RawMunicipalityCode::Text("27006".to_owned()));
        assert_eq!(polygons[2].code, RawMunicipalityCode::Float(27025.0));
    }

    #[test]
    fn keeps_feature_properties() {
        let polygons = parse_municipalities(CHOCO, DEFAULT_CODE_PROPERTY).unwrap();
        assert_eq!(polygons[1].name(), Some("ACANDI"));
    }

    #[test]
    fn custom_code_property() {
        let polygons = parse_municipalities(CHOCO, "NOM_MUN").unwrap();
        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0].code, RawMunicipalityCode::Text("QUIBDO".to_owned()));
    }

    #[test]
    fn null_code_is_an_error() {
        let text = single_feature(r#"{ "COD_MUN": null }"#, TRIANGLE);
        let err = parse_municipalities(&text, DEFAULT_CODE_PROPERTY).unwrap_err();
        assert!(
            matches!(err, GeoError::Conversion { ref message } if message.contains("COD_MUN"))
        );
    }

    #[test]
    fn missing_code_property_is_an_error() {
        let text = single_feature(r#"{ "NOM_MUN": "QUIBDO" }"#, TRIANGLE);
        assert!(parse_municipalities(&text, DEFAULT_CODE_PROPERTY).is_err());
    }

    #[test]
    fn point_geometry_is_an_error() {
        let text = single_feature(
            r#"{ "COD_MUN": 27050 }"#,
            r#"{ "type": "Point", "coordinates": [-76.0, 6.0] }"#,
        );
        let err = parse_municipalities(&text, DEFAULT_CODE_PROPERTY).unwrap_err();
        assert!(
            matches!(err, GeoError::Conversion { ref message } if message.contains("27050"))
        );
    }

    #[test]
    fn null_geometry_is_an_error() {
        let text = single_feature(r#"{ "COD_MUN": 27050 }"#, "null");
        assert!(parse_municipalities(&text, DEFAULT_CODE_PROPERTY).is_err());
    }

    #[test]
    fn rejects_non_collection() {
        let err = parse_municipalities(
            r#"{"type": "Point", "coordinates": [-76.0, 6.0]}"#,
            DEFAULT_CODE_PROPERTY,
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::Conversion { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_municipalities("not geojson", DEFAULT_CODE_PROPERTY).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("choco_mun.geojson");
        std::fs::write(&path, CHOCO).unwrap();
        let polygons = load_municipalities(&path, DEFAULT_CODE_PROPERTY).unwrap();
        assert_eq!(polygons.len(), 3);
    }
}
