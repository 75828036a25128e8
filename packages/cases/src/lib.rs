#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case table I/O for the Chocó malaria pipeline.
//!
//! Reads the monthly case/covariate CSV into a [`CaseTable`], narrows it to
//! one parasite species, and writes the (interpolated) table back out with
//! the same columns in the same order.

pub mod csv_io;
pub mod parsing;
pub mod progress;

use malaria_choco_cases_models::{CaseTable, CodeError};

pub use csv_io::{
    CaseColumns, read_case_table, read_case_table_from, write_case_table, write_case_table_to,
};

/// Species label kept by default.
pub const DEFAULT_SPECIES: &str = "MALARIA FALCIPARUM";

/// Errors that can occur while loading or writing case tables.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },

    /// A date cell is not `YYYY-MM` or `YYYY-MM-DD`.
    #[error("Line {line}: invalid date '{value}' (expected YYYY-MM)")]
    Date {
        /// One-based line number in the file.
        line: u64,
        /// The offending cell.
        value: String,
    },

    /// A numeric cell could not be parsed.
    #[error("Line {line}: invalid number '{value}' in column {column}")]
    Number {
        /// One-based line number in the file.
        line: u64,
        /// Column name.
        column: String,
        /// The offending cell.
        value: String,
    },

    /// The municipality code cell could not be cast to an integer.
    #[error("Line {line}: {source}")]
    Code {
        /// One-based line number in the file.
        line: u64,
        /// Underlying coercion failure.
        source: CodeError,
    },
}

/// Keeps only the records whose disease label equals `species` exactly.
///
/// Row identities are untouched, so a filtered record can still be traced
/// back to its line in the source file.
#[must_use]
pub fn filter_species(table: CaseTable, species: &str) -> CaseTable {
    let before = table.len();
    let records: Vec<_> = table
        .records
        .into_iter()
        .filter(|r| r.disease == species)
        .collect();

    log::info!(
        "Kept {} of {before} rows for species '{species}'",
        records.len()
    );

    if records.is_empty() {
        log::warn!("No rows matched species '{species}'");
    }

    CaseTable {
        columns: table.columns,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
COD_MUN,MALARIA,DATE2,CASES
27001,MALARIA FALCIPARUM,2018-01,4
27001,MALARIA VIVAX,2018-01,9
27006,MALARIA FALCIPARUM,2018-01,2
";

    #[test]
    fn filter_species_keeps_exact_matches_only() {
        let table = read_case_table_from(SAMPLE.as_bytes(), &CaseColumns::default()).unwrap();
        let filtered = filter_species(table, DEFAULT_SPECIES);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.records.iter().all(|r| r.disease == DEFAULT_SPECIES));
        let rows: Vec<usize> = filtered.records.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn filter_species_is_case_sensitive() {
        let table = read_case_table_from(SAMPLE.as_bytes(), &CaseColumns::default()).unwrap();
        let filtered = filter_species(table, "malaria falciparum");
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns.len(), 4);
    }

    #[test]
    fn filter_species_does_not_trim_labels() {
        let table = read_case_table_from(
            "COD_MUN,MALARIA,DATE2\n27001, MALARIA FALCIPARUM ,2018-01\n".as_bytes(),
            &CaseColumns::default(),
        )
        .unwrap();
        assert!(filter_species(table, DEFAULT_SPECIES).is_empty());
    }
}
