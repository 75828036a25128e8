#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipal boundary types.
//!
//! A [`MunicipalPolygon`] is one municipality of Chocó with its boundary.
//! An [`EnrichedRecord`] is the result of joining a polygon with (at most)
//! one case record; the polygon set is immutable and the joined set only
//! borrows from it.

use chrono::NaiveDate;
use geo::MultiPolygon;
use malaria_choco_cases_models::{CaseRecord, MapField, MunicipalityCode, RawMunicipalityCode};

/// Feature properties carried alongside a boundary.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A municipality boundary as read from the geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalPolygon {
    /// Municipality code exactly as it appeared in the feature properties.
    pub code: RawMunicipalityCode,
    /// Boundary geometry. Single polygons are stored as one-part
    /// multipolygons.
    pub geometry: MultiPolygon<f64>,
    /// All feature properties, including the code property.
    pub properties: Properties,
}

impl MunicipalPolygon {
    /// Human-readable name, if the feature carries one of the usual name
    /// properties.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        ["MPIO_CNMBR", "NOM_MUN", "NOMBRE", "name"]
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(serde_json::Value::as_str))
    }
}

/// One row of the polygon/case left join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedRecord<'a> {
    /// Coerced municipality code of the polygon.
    pub municipality: MunicipalityCode,
    /// The boundary this row belongs to.
    pub polygon: &'a MunicipalPolygon,
    /// The matching case record, or `None` if the municipality had no case
    /// rows.
    pub case: Option<&'a CaseRecord>,
}

impl EnrichedRecord<'_> {
    /// Observation month, if the row has a case record.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.case.map(|c| c.date)
    }

    /// Value of a mappable field; `None` for unmatched polygons.
    #[must_use]
    pub fn value(&self, field: MapField) -> Option<f64> {
        self.case.and_then(|c| c.value(field))
    }

    /// Whether the polygon matched a case record.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.case.is_some()
    }
}
