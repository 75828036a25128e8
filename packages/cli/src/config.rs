//! TOML pipeline configuration.
//!
//! ```toml
//! cases_path = "data/choco_malaria.csv"
//! municipalities_path = "data/choco_mun.geojson"
//! output_path = "out/choco_malaria_interp.csv"
//! map_date = "2018-07"
//!
//! [[maps]]
//! field = "CASES"
//! scale = "Reds"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use malaria_choco_cases::parsing::parse_month;
use malaria_choco_cases::{CaseColumns, DEFAULT_SPECIES};
use malaria_choco_cases_models::Covariate;
use malaria_choco_geography::DEFAULT_CODE_PROPERTY;
use malaria_choco_interpolate::BoundaryPolicy;
use malaria_choco_render::{MapSpec, default_maps};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Environment variable naming the default config file.
pub const CONFIG_ENV: &str = "MALARIA_CHOCO_CONFIG";

/// Config file used when neither `--config` nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "malaria_choco.toml";

/// Errors that can occur while loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has invalid values.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a full pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input case/covariate CSV.
    pub cases_path: PathBuf,
    /// Municipality boundaries (`GeoJSON` `FeatureCollection`).
    pub municipalities_path: PathBuf,
    /// Where the interpolated CSV is written.
    pub output_path: PathBuf,
    /// Optional `GeoJSON` export of the full join.
    #[serde(default)]
    pub joined_path: Option<PathBuf>,
    /// Directory for rendered maps.
    #[serde(default = "default_map_dir")]
    pub map_dir: PathBuf,
    /// Disease label to keep.
    #[serde(default = "default_species")]
    pub species: String,
    /// Observation month to map. Accepts `YYYY-MM` or `YYYY-MM-DD`.
    #[serde(default = "default_map_date", deserialize_with = "deserialize_month")]
    pub map_date: NaiveDate,
    /// Gap handling at the ends of each municipality's series.
    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,
    /// Covariates to interpolate.
    #[serde(default = "default_covariates")]
    pub covariates: Vec<Covariate>,
    /// Feature property holding the municipality code.
    #[serde(default = "default_code_property")]
    pub code_property: String,
    /// Structural column names of the case table.
    #[serde(default)]
    pub columns: CaseColumns,
    /// Maps to render.
    #[serde(default = "default_maps")]
    pub maps: Vec<MapSpec>,
}

fn default_map_dir() -> PathBuf {
    PathBuf::from("maps")
}

fn default_species() -> String {
    DEFAULT_SPECIES.to_owned()
}

fn default_map_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 7, 1).unwrap_or_default()
}

fn default_covariates() -> Vec<Covariate> {
    Covariate::ALL.to_vec()
}

fn default_code_property() -> String {
    DEFAULT_CODE_PROPERTY.to_owned()
}

fn deserialize_month<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_month(&s).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid month '{s}' (expected YYYY-MM)"))
    })
}

impl PipelineConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid config.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Config path from `--config`, then [`CONFIG_ENV`], then
/// [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
