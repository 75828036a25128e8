#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal gap filling of environmental covariates.
//!
//! Records are partitioned by municipality, each partition is ordered by
//! date, and every target covariate is linearly interpolated along that
//! order. Values never cross municipality boundaries, and by default gaps
//! before the first or after the last observation stay missing.

pub mod series;

use std::collections::BTreeMap;

use malaria_choco_cases::progress::ProgressCallback;
use malaria_choco_cases_models::{CaseTable, Covariate, MunicipalityCode};

pub use series::{BoundaryPolicy, interpolate_series};

/// Outcome of [`interpolate_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpolationSummary {
    /// Number of municipality groups processed.
    pub groups: usize,
    /// Number of records processed (equal to the input length).
    pub records: usize,
    /// Cells filled, per covariate.
    pub filled: BTreeMap<Covariate, usize>,
    /// Cells still missing after interpolation, per covariate.
    pub still_missing: BTreeMap<Covariate, usize>,
}

impl InterpolationSummary {
    /// Total cells filled across all covariates.
    #[must_use]
    pub fn total_filled(&self) -> usize {
        self.filled.values().sum()
    }

    /// Total cells still missing across all covariates.
    #[must_use]
    pub fn total_still_missing(&self) -> usize {
        self.still_missing.values().sum()
    }
}

/// Partitions record positions by municipality, each partition ordered by
/// date. Ties keep file order.
#[must_use]
pub fn group_by_municipality(table: &CaseTable) -> BTreeMap<MunicipalityCode, Vec<usize>> {
    let mut groups: BTreeMap<MunicipalityCode, Vec<usize>> = BTreeMap::new();
    for (i, record) in table.records.iter().enumerate() {
        groups.entry(record.municipality).or_default().push(i);
    }
    for positions in groups.values_mut() {
        positions.sort_by_key(|&i| table.records[i].date);
    }
    groups
}

/// Linearly interpolates `targets` within each municipality, in place.
///
/// The table keeps its length, order, and row identities; only missing
/// target cells change.
pub fn interpolate_table(
    table: &mut CaseTable,
    targets: &[Covariate],
    policy: BoundaryPolicy,
    progress: &dyn ProgressCallback,
) -> InterpolationSummary {
    let groups = group_by_municipality(table);

    let mut summary = InterpolationSummary {
        groups: groups.len(),
        records: table.len(),
        ..InterpolationSummary::default()
    };

    progress.set_total(groups.len() as u64);
    progress.set_message(format!("Interpolating {} covariates", targets.len()));

    let mut series: Vec<Option<f64>> = Vec::new();

    for (code, positions) in &groups {
        for &covariate in targets {
            series.clear();
            series.extend(
                positions
                    .iter()
                    .map(|&i| table.records[i].covariates.get(covariate)),
            );

            let filled = interpolate_series(&mut series, policy);
            let missing = series.iter().filter(|v| v.is_none()).count();

            if filled > 0 {
                for (&i, value) in positions.iter().zip(&series) {
                    table.records[i].covariates.set(covariate, *value);
                }
                log::debug!("Municipality {code}: filled {filled} {covariate} cells");
            }

            *summary.filled.entry(covariate).or_default() += filled;
            *summary.still_missing.entry(covariate).or_default() += missing;
        }
        progress.inc(1);
    }

    progress.finish(format!(
        "Filled {} cells across {} municipalities",
        summary.total_filled(),
        summary.groups
    ));

    log::info!(
        "Interpolated {} records in {} municipalities: {} cells filled, {} still missing",
        summary.records,
        summary.groups,
        summary.total_filled(),
        summary.total_still_missing()
    );

    summary
}

/// Orders records by municipality, then date, then original row.
///
/// This is the order in which the interpolated table is written.
pub fn sort_by_municipality_and_date(table: &mut CaseTable) {
    table
        .records
        .sort_by_key(|r| (r.municipality, r.date, r.row));
}
