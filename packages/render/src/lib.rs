#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Headless choropleth maps of joined case data.
//!
//! Each map colours the municipal polygons of one month by a single field
//! and is written as a standalone SVG file.

pub mod choropleth;
pub mod scale;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use malaria_choco_cases_models::{Covariate, MapField};
use malaria_choco_geography_models::EnrichedRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use choropleth::{MapStyle, render_choropleth, render_to_file};
pub use scale::ColorScale;

/// Errors that can occur while rendering maps.
#[derive(Debug, Error)]
pub enum RenderError {
    /// I/O error writing the image.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to draw.
    #[error("No rows to render for {field}")]
    EmptySelection {
        /// Field that was requested.
        field: String,
    },

    /// The drawing backend failed.
    #[error("Drawing error: {message}")]
    Drawing {
        /// Backend error message.
        message: String,
    },

    /// A `FIELD:SCALE` map argument could not be parsed.
    #[error("Invalid map '{value}': {message}")]
    MapSpec {
        /// The argument as given.
        value: String,
        /// What was wrong with it.
        message: String,
    },
}

/// One map to render: a field and the colour scale to fill it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    /// Field to map.
    pub field: MapField,
    /// Colour scale.
    pub scale: ColorScale,
}

impl FromStr for MapSpec {
    type Err = RenderError;

    /// Parses `FIELD:SCALE`, e.g. `PREC_CUM_MONTH:Blues`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| RenderError::MapSpec {
            value: s.to_owned(),
            message,
        };

        let (field, scale) = s
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected FIELD:SCALE".to_owned()))?;
        let field = field.parse::<MapField>().map_err(|e| invalid(e.to_string()))?;
        let scale = scale
            .parse::<ColorScale>()
            .map_err(|_| invalid(format!("unknown colour scale '{scale}'")))?;

        Ok(Self { field, scale })
    }
}

/// The standard set of monthly maps.
#[must_use]
pub fn default_maps() -> Vec<MapSpec> {
    vec![
        MapSpec {
            field: MapField::Cases,
            scale: ColorScale::Reds,
        },
        MapSpec {
            field: MapField::Covariate(Covariate::VegetationIndexInterp),
            scale: ColorScale::Greens,
        },
        MapSpec {
            field: MapField::Covariate(Covariate::PrecipitationCumulative),
            scale: ColorScale::Blues,
        },
        MapSpec {
            field: MapField::Covariate(Covariate::TemperatureMean),
            scale: ColorScale::CoolWarm,
        },
        MapSpec {
            field: MapField::Covariate(Covariate::ElevationMean),
            scale: ColorScale::Terrain,
        },
    ]
}

/// File name for a map of `field` in `date`: `{field}_{date}.svg`.
#[must_use]
pub fn map_file_name(field: MapField, date: NaiveDate) -> String {
    format!("{field}_{}.svg", date.format("%Y-%m-%d"))
}

/// Renders every map in `maps` for the rows of `date` into `dir`.
///
/// Returns the written paths in `maps` order.
///
/// # Errors
///
/// Returns [`RenderError`] on the first map that fails.
pub fn render_maps(
    dir: impl AsRef<Path>,
    rows: &[EnrichedRecord<'_>],
    date: NaiveDate,
    maps: &[MapSpec],
    style: &MapStyle,
) -> Result<Vec<PathBuf>, RenderError> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(maps.len());

    for map in maps {
        let path = dir.join(map_file_name(map.field, date));
        render_to_file(&path, rows, map.field, map.scale, style)?;
        written.push(path);
    }

    log::info!("Rendered {} maps for {date} into {}", written.len(), dir.display());
    Ok(written)
}
