//! Left join of case records onto municipal boundaries.
//!
//! Every polygon appears in the output at least once: once per matching case
//! record, or once with no case record. Case records whose municipality has
//! no polygon are dropped. Keys compare exactly, which is why
//! [`spatial_join`] coerces both sides to [`MunicipalityCode`] first; a raw
//! join of `"005"` against `5` finds nothing.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use chrono::NaiveDate;
use malaria_choco_cases_models::{CaseRecord, CaseTable, MunicipalityCode};
use malaria_choco_geography_models::{EnrichedRecord, MunicipalPolygon};

use crate::GeoError;

/// Counts describing a completed join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSummary {
    /// Polygons on the left side.
    pub polygons: usize,
    /// Polygons with at least one case record.
    pub matched_polygons: usize,
    /// Output rows.
    pub rows: usize,
    /// Case records with no polygon (dropped).
    pub dropped_records: usize,
}

impl JoinSummary {
    /// Polygons that matched no case record.
    #[must_use]
    pub const fn unmatched_polygons(&self) -> usize {
        self.polygons - self.matched_polygons
    }
}

/// Output of [`spatial_join`].
#[derive(Debug, Clone)]
pub struct SpatialJoin<'a> {
    /// Joined rows, in polygon order and then case-table order.
    pub rows: Vec<EnrichedRecord<'a>>,
    /// Join counts.
    pub summary: JoinSummary,
}

/// Left outer join of `left` with `right` on an arbitrary key.
///
/// Output is in `left` order; each left item is followed by its matches in
/// `right` order, or paired with `None` when it has none.
pub fn left_join_by<'l, 'r, L, R, K>(
    left: &'l [L],
    right: &'r [R],
    left_key: impl Fn(&L) -> K,
    right_key: impl Fn(&R) -> K,
) -> Vec<(&'l L, Option<&'r R>)>
where
    K: Eq + Hash,
{
    let mut index: HashMap<K, Vec<&'r R>> = HashMap::new();
    for item in right {
        index.entry(right_key(item)).or_default().push(item);
    }

    let mut out = Vec::with_capacity(left.len().max(right.len()));
    for item in left {
        match index.get(&left_key(item)) {
            Some(matches) => out.extend(matches.iter().map(|m| (item, Some(*m)))),
            None => out.push((item, None)),
        }
    }
    out
}

/// Joins interpolated case records onto municipal boundaries.
///
/// Polygon codes are coerced to integers before matching; case codes were
/// coerced when the table was read.
///
/// # Errors
///
/// Returns [`GeoError::Code`] if a polygon code cannot be cast to an
/// integer.
pub fn spatial_join<'a>(
    polygons: &'a [MunicipalPolygon],
    table: &'a CaseTable,
) -> Result<SpatialJoin<'a>, GeoError> {
    let keyed = polygons
        .iter()
        .map(|p| {
            p.code
                .coerce()
                .map(|code| (code, p))
                .map_err(|source| GeoError::Code {
                    code: p.code.to_string(),
                    source,
                })
        })
        .collect::<Result<Vec<(MunicipalityCode, &MunicipalPolygon)>, _>>()?;

    let joined = left_join_by(
        &keyed,
        &table.records,
        |(code, _)| *code,
        |record: &CaseRecord| record.municipality,
    );

    let rows: Vec<EnrichedRecord<'a>> = joined
        .into_iter()
        .map(|(&(municipality, polygon), case)| EnrichedRecord {
            municipality,
            polygon,
            case,
        })
        .collect();

    let polygon_codes: BTreeSet<MunicipalityCode> = keyed.iter().map(|(c, _)| *c).collect();
    let matched: BTreeSet<MunicipalityCode> = rows
        .iter()
        .filter(|r| r.is_matched())
        .map(|r| r.municipality)
        .collect();
    let dropped_records = table
        .records
        .iter()
        .filter(|r| !polygon_codes.contains(&r.municipality))
        .count();

    let summary = JoinSummary {
        polygons: polygons.len(),
        matched_polygons: keyed.iter().filter(|(c, _)| matched.contains(c)).count(),
        rows: rows.len(),
        dropped_records,
    };

    log::info!(
        "Joined {} case records onto {} municipalities: {} rows, {} municipalities without cases",
        table.len(),
        summary.polygons,
        summary.rows,
        summary.unmatched_polygons()
    );

    if summary.unmatched_polygons() > 0 {
        let codes: Vec<String> = rows
            .iter()
            .filter(|r| !r.is_matched())
            .map(|r| match r.polygon.name() {
                Some(name) => format!("{} ({name})", r.municipality),
                None => r.municipality.to_string(),
            })
            .collect();
        log::warn!("Municipalities with no case records: {}", codes.join(", "));
    }

    if dropped_records > 0 {
        let orphan_codes: BTreeSet<MunicipalityCode> = table
            .municipalities()
            .difference(&polygon_codes)
            .copied()
            .collect();
        log::warn!(
            "Dropped {dropped_records} case records with no boundary (codes: {})",
            orphan_codes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(SpatialJoin { rows, summary })
}

/// Keeps the joined rows observed in `date`.
///
/// Unmatched polygons carry no date and are therefore excluded.
#[must_use]
pub fn select_date<'a>(rows: &[EnrichedRecord<'a>], date: NaiveDate) -> Vec<EnrichedRecord<'a>> {
    rows.iter().filter(|r| r.date() == Some(date)).copied().collect()
}
