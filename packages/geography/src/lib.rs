#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipal boundaries for the Chocó malaria pipeline.
//!
//! Loads municipality polygons from a `GeoJSON` `FeatureCollection`, left
//! joins interpolated case records onto them by municipality code, and
//! exports the joined rows back to `GeoJSON` for mapping.

pub mod boundaries;
pub mod export;
pub mod join;

use malaria_choco_cases_models::CodeError;
use thiserror::Error;

pub use boundaries::{DEFAULT_CODE_PROPERTY, load_municipalities, parse_municipalities};
pub use export::{enriched_feature_collection, write_enriched_geojson};
pub use join::{JoinSummary, SpatialJoin, left_join_by, select_date, spatial_join};

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A municipality code could not be cast to an integer.
    #[error("Municipality code '{code}': {source}")]
    Code {
        /// The raw code as read.
        code: String,
        /// Underlying coercion failure.
        source: CodeError,
    },

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
