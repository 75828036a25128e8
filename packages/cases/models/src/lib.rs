#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case record types for the Chocó malaria pipeline.
//!
//! A [`CaseRecord`] is one (municipality, month) observation: the reported
//! case count for a parasite species plus a fixed set of environmental
//! covariates, any of which may be missing. Records are keyed to municipal
//! polygons through a [`MunicipalityCode`].

pub mod code;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use code::{CodeError, MunicipalityCode, RawMunicipalityCode};

/// Column name of the reported case count.
pub const CASES_COLUMN: &str = "CASES";

/// Environmental covariates that are gap-filled over time.
///
/// Variants serialize to the column names used in the case table.
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
)]
pub enum Covariate {
    /// Maximum elevation of the municipality (m).
    #[serde(rename = "MUN_ELV_MAX")]
    #[strum(serialize = "MUN_ELV_MAX")]
    ElevationMax,
    /// Mean elevation of the municipality (m).
    #[serde(rename = "MUN_ELV_MEAN")]
    #[strum(serialize = "MUN_ELV_MEAN")]
    ElevationMean,
    /// Monthly maximum of the mean temperature (°C).
    #[serde(rename = "MUN_T_MEAN_MAX")]
    #[strum(serialize = "MUN_T_MEAN_MAX")]
    TemperatureMax,
    /// Monthly minimum of the mean temperature (°C).
    #[serde(rename = "MUN_T_MEAN_MIN")]
    #[strum(serialize = "MUN_T_MEAN_MIN")]
    TemperatureMin,
    /// Monthly mean temperature (°C).
    #[serde(rename = "MUN_T_MEAN_MEAN")]
    #[strum(serialize = "MUN_T_MEAN_MEAN")]
    TemperatureMean,
    /// Cumulative monthly precipitation (mm).
    #[serde(rename = "PREC_CUM_MONTH")]
    #[strum(serialize = "PREC_CUM_MONTH")]
    PrecipitationCumulative,
    /// Enhanced vegetation index as observed.
    #[serde(rename = "mean_evi")]
    #[strum(serialize = "mean_evi")]
    VegetationIndex,
    /// Enhanced vegetation index after upstream gap filling.
    #[serde(rename = "mean_evi_interp")]
    #[strum(serialize = "mean_evi_interp")]
    VegetationIndexInterp,
}

impl Covariate {
    /// Number of covariates.
    pub const COUNT: usize = 8;

    /// Every covariate, in table column order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ElevationMax,
        Self::ElevationMean,
        Self::TemperatureMax,
        Self::TemperatureMin,
        Self::TemperatureMean,
        Self::PrecipitationCumulative,
        Self::VegetationIndex,
        Self::VegetationIndexInterp,
    ];

    /// Position of this covariate in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name in the case table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::ElevationMax => "MUN_ELV_MAX",
            Self::ElevationMean => "MUN_ELV_MEAN",
            Self::TemperatureMax => "MUN_T_MEAN_MAX",
            Self::TemperatureMin => "MUN_T_MEAN_MIN",
            Self::TemperatureMean => "MUN_T_MEAN_MEAN",
            Self::PrecipitationCumulative => "PREC_CUM_MONTH",
            Self::VegetationIndex => "mean_evi",
            Self::VegetationIndexInterp => "mean_evi_interp",
        }
    }
}

/// One optional value per [`Covariate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Covariates([Option<f64>; Covariate::COUNT]);

impl Covariates {
    /// Returns the value of `covariate`, if observed.
    #[must_use]
    pub const fn get(&self, covariate: Covariate) -> Option<f64> {
        self.0[covariate.index()]
    }

    /// Sets (or clears) the value of `covariate`.
    pub const fn set(&mut self, covariate: Covariate, value: Option<f64>) {
        self.0[covariate.index()] = value;
    }

    /// Builder-style [`Self::set`].
    #[must_use]
    pub const fn with(mut self, covariate: Covariate, value: Option<f64>) -> Self {
        self.set(covariate, value);
        self
    }

    /// Iterates `(covariate, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Covariate, Option<f64>)> + '_ {
        Covariate::ALL.iter().map(|c| (*c, self.get(*c)))
    }
}

/// A numeric field that can be mapped: the case count or a covariate.
///
/// Serializes as its column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MapField {
    /// The reported case count.
    Cases,
    /// One of the environmental covariates.
    Covariate(Covariate),
}

impl MapField {
    /// Column name in the case table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Cases => CASES_COLUMN,
            Self::Covariate(c) => c.column(),
        }
    }
}

impl std::fmt::Display for MapField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Error returned when a string names no mappable field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field '{name}': expected {CASES_COLUMN} or a covariate column")]
pub struct UnknownFieldError {
    /// The unrecognized name.
    pub name: String,
}

impl FromStr for MapField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CASES_COLUMN {
            return Ok(Self::Cases);
        }
        Covariate::from_str(s)
            .map(Self::Covariate)
            .map_err(|_| UnknownFieldError { name: s.to_owned() })
    }
}

impl TryFrom<String> for MapField {
    type Error = UnknownFieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MapField> for String {
    fn from(field: MapField) -> Self {
        field.column().to_owned()
    }
}

/// One (municipality, month) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Zero-based position of the row in the loaded file. This is the
    /// record's identity; filtering and interpolation never change it.
    pub row: usize,
    /// Municipality the observation belongs to.
    pub municipality: MunicipalityCode,
    /// Observation month (always the first day of the month).
    pub date: NaiveDate,
    /// Disease / parasite species label (e.g. `"MALARIA FALCIPARUM"`).
    pub disease: String,
    /// Reported case count.
    pub cases: Option<f64>,
    /// Environmental covariates.
    pub covariates: Covariates,
    /// Every other column of the source row, passed through verbatim.
    pub extra: BTreeMap<String, String>,
}

impl CaseRecord {
    /// Value of a mappable field.
    #[must_use]
    pub const fn value(&self, field: MapField) -> Option<f64> {
        match field {
            MapField::Cases => self.cases,
            MapField::Covariate(c) => self.covariates.get(c),
        }
    }
}

/// A loaded case table: header order plus records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTable {
    /// Column names in the order they appeared in the source file.
    pub columns: Vec<String>,
    /// The records, in file order unless a caller re-sorted them.
    pub records: Vec<CaseRecord>,
}

impl CaseTable {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct municipality codes present in the table.
    #[must_use]
    pub fn municipalities(&self) -> BTreeSet<MunicipalityCode> {
        self.records.iter().map(|r| r.municipality).collect()
    }
}
