//! Stage orchestration for the `malaria_choco` binary.
//!
//! Stage A reads, filters, interpolates, and persists the case table.
//! Stage B joins the interpolated table onto the municipal boundaries, and
//! the joined rows of one month are rendered as maps.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use malaria_choco_cases::progress::ProgressCallback;
use malaria_choco_cases::{
    CaseColumns, CaseError, filter_species, read_case_table, write_case_table,
};
use malaria_choco_cases_models::{CaseTable, Covariate};
use malaria_choco_geography::{
    load_municipalities, select_date, spatial_join, write_enriched_geojson,
};
use malaria_choco_interpolate::{BoundaryPolicy, interpolate_table, sort_by_municipality_and_date};
use malaria_choco_render::{MapSpec, MapStyle, render_maps};

use crate::config::PipelineConfig;

/// Stage A settings.
#[derive(Debug, Clone)]
pub struct InterpolateOptions<'a> {
    /// Structural column names.
    pub columns: &'a CaseColumns,
    /// Disease label to keep.
    pub species: &'a str,
    /// Covariates to fill.
    pub covariates: &'a [Covariate],
    /// Gap handling at the series ends.
    pub policy: BoundaryPolicy,
}

/// Counts reported by [`run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows written to the interpolated CSV.
    pub interpolated_rows: usize,
    /// Rows produced by the join.
    pub joined_rows: usize,
    /// Rendered map files.
    pub maps: Vec<PathBuf>,
}

/// Reads `input`, keeps one species, and interpolates its covariates.
///
/// The returned table is ordered by municipality and date.
///
/// # Errors
///
/// Returns [`CaseError`] if the table cannot be read.
pub fn interpolate_cases(
    input: &Path,
    options: &InterpolateOptions<'_>,
    progress: &dyn ProgressCallback,
) -> Result<CaseTable, CaseError> {
    let table = read_case_table(input, options.columns)?;
    let mut table = filter_species(table, options.species);
    interpolate_table(&mut table, options.covariates, options.policy, progress);
    sort_by_municipality_and_date(&mut table);

    Ok(table)
}

/// Stage A: interpolates `input` and writes the result to `output`.
///
/// # Errors
///
/// Returns [`CaseError`] if reading or writing fails.
pub fn interpolate(
    input: &Path,
    output: &Path,
    options: &InterpolateOptions<'_>,
    progress: &dyn ProgressCallback,
) -> Result<usize, CaseError> {
    let table = interpolate_cases(input, options, progress)?;
    write_case_table(output, &table, options.columns)?;
    Ok(table.len())
}

/// Stage B: joins an interpolated table onto the boundaries and writes the
/// joined rows as `GeoJSON`, optionally restricted to one month.
///
/// # Errors
///
/// Returns an error if any input cannot be read or the output cannot be
/// written.
pub fn join(
    cases: &Path,
    municipalities: &Path,
    output: &Path,
    date: Option<NaiveDate>,
    columns: &CaseColumns,
    code_property: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let table = read_case_table(cases, columns)?;
    let polygons = load_municipalities(municipalities, code_property)?;
    let joined = spatial_join(&polygons, &table)?;

    let rows = match date {
        Some(date) => select_date(&joined.rows, date),
        None => joined.rows,
    };

    write_enriched_geojson(output, &rows, columns)?;
    Ok(rows.len())
}

/// Stage B followed by rendering of each map in `maps` for `date`.
///
/// # Errors
///
/// Returns an error if any input cannot be read, no row falls in `date`,
/// or a map cannot be written.
pub fn map(
    cases: &Path,
    municipalities: &Path,
    date: NaiveDate,
    out_dir: &Path,
    maps: &[MapSpec],
    columns: &CaseColumns,
    code_property: &str,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let table = read_case_table(cases, columns)?;
    let polygons = load_municipalities(municipalities, code_property)?;
    let joined = spatial_join(&polygons, &table)?;
    let selected = select_date(&joined.rows, date);

    log::info!("{} joined rows fall in {date}", selected.len());

    Ok(render_maps(out_dir, &selected, date, maps, &MapStyle::default())?)
}

/// Runs the whole pipeline described by `config`.
///
/// `steps` tracks the three stages; `groups` tracks interpolation.
///
/// # Errors
///
/// Returns the first error from any stage.
pub fn run(
    config: &PipelineConfig,
    steps: &dyn ProgressCallback,
    groups: &dyn ProgressCallback,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    steps.set_total(3);

    steps.set_message("Interpolating covariates".to_owned());
    let options = InterpolateOptions {
        columns: &config.columns,
        species: &config.species,
        covariates: &config.covariates,
        policy: config.boundary_policy,
    };
    let table = interpolate_cases(&config.cases_path, &options, groups)?;
    write_case_table(&config.output_path, &table, &config.columns)?;
    steps.inc(1);

    steps.set_message("Joining onto municipalities".to_owned());
    let polygons = load_municipalities(&config.municipalities_path, &config.code_property)?;
    let joined = spatial_join(&polygons, &table)?;
    if let Some(path) = &config.joined_path {
        write_enriched_geojson(path, &joined.rows, &config.columns)?;
    }
    steps.inc(1);

    steps.set_message("Rendering maps".to_owned());
    let selected = select_date(&joined.rows, config.map_date);
    let maps = render_maps(
        &config.map_dir,
        &selected,
        config.map_date,
        &config.maps,
        &MapStyle::default(),
    )?;
    steps.inc(1);
    steps.finish(format!("Pipeline complete: {} maps", maps.len()));

    Ok(RunSummary {
        interpolated_rows: table.len(),
        joined_rows: joined.summary.rows,
        maps,
    })
}
