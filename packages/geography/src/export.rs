//! `GeoJSON` export of joined rows.
//!
//! Each row becomes one feature: the polygon geometry, the polygon's own
//! properties, and then the case columns. Rows without a case record get
//! the case columns as `null`.

use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry};
use malaria_choco_cases::CaseColumns;
use malaria_choco_cases::parsing::format_date;
use malaria_choco_cases_models::{CASES_COLUMN, Covariate};
use malaria_choco_geography_models::{EnrichedRecord, Properties};
use serde_json::Value;

use crate::GeoError;

/// Builds a `FeatureCollection` from joined rows.
#[must_use]
pub fn enriched_feature_collection(
    rows: &[EnrichedRecord<'_>],
    columns: &CaseColumns,
) -> FeatureCollection {
    let features = rows
        .iter()
        .map(|row| Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&row.polygon.geometry))),
            id: None,
            properties: Some(row_properties(row, columns)),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn row_properties(row: &EnrichedRecord<'_>, columns: &CaseColumns) -> Properties {
    let mut properties = row.polygon.properties.clone();
    properties.insert(columns.code.clone(), Value::from(row.municipality.0));

    let Some(case) = row.case else {
        properties.insert(columns.disease.clone(), Value::Null);
        properties.insert(columns.date.clone(), Value::Null);
        properties.insert(CASES_COLUMN.to_owned(), Value::Null);
        for covariate in Covariate::ALL {
            properties.insert(covariate.column().to_owned(), Value::Null);
        }
        return properties;
    };

    properties.insert(columns.disease.clone(), Value::from(case.disease.clone()));
    properties.insert(columns.date.clone(), Value::from(format_date(case.date)));
    properties.insert(CASES_COLUMN.to_owned(), number(case.cases));
    for (covariate, value) in case.covariates.iter() {
        properties.insert(covariate.column().to_owned(), number(value));
    }
    for (name, value) in &case.extra {
        properties
            .entry(name.clone())
            .or_insert_with(|| Value::from(value.clone()));
    }

    properties
}

fn number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// Writes joined rows as a `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// Returns [`GeoError`] if serialization or the file write fails.
pub fn write_enriched_geojson(
    path: impl AsRef<Path>,
    rows: &[EnrichedRecord<'_>],
    columns: &CaseColumns,
) -> Result<(), GeoError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let collection = enriched_feature_collection(rows, columns);
    let json = serde_json::to_string(&collection)?;
    std::fs::write(path, json)?;

    log::info!("Wrote {} joined features to {}", rows.len(), path.display());
    Ok(())
}
