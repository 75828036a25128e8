//! CSV reading and writing of case tables.
//!
//! Known columns (code, disease, date, `CASES`, the covariates) are parsed
//! into typed fields; every other column rides along in
//! [`CaseRecord::extra`] so that the written file has exactly the columns of
//! the file that was read, in the same order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use malaria_choco_cases_models::{
    CASES_COLUMN, CaseRecord, CaseTable, Covariate, Covariates, RawMunicipalityCode,
};
use serde::Deserialize;

use crate::CaseError;
use crate::parsing::{format_date, format_value, parse_month, parse_value};

/// Names of the structural columns of a case table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseColumns {
    /// Municipality code column.
    pub code: String,
    /// Disease / species label column.
    pub disease: String,
    /// Observation month column.
    pub date: String,
}

impl Default for CaseColumns {
    fn default() -> Self {
        Self {
            code: "COD_MUN".to_owned(),
            disease: "MALARIA".to_owned(),
            date: "DATE2".to_owned(),
        }
    }
}

/// How a header column maps onto [`CaseRecord`].
#[derive(Debug, Clone, Copy)]
enum Slot {
    Code,
    Disease,
    Date,
    Cases,
    Covariate(Covariate),
    Extra,
}

impl CaseColumns {
    fn slot(&self, name: &str) -> Slot {
        if name == self.code {
            Slot::Code
        } else if name == self.disease {
            Slot::Disease
        } else if name == self.date {
            Slot::Date
        } else if name == CASES_COLUMN {
            Slot::Cases
        } else if let Ok(covariate) = Covariate::from_str(name) {
            Slot::Covariate(covariate)
        } else {
            Slot::Extra
        }
    }
}

/// Reads a case table from a CSV file.
///
/// # Errors
///
/// Returns [`CaseError`] if the file cannot be opened, a required column is
/// missing, or any cell fails to parse.
pub fn read_case_table(
    path: impl AsRef<Path>,
    columns: &CaseColumns,
) -> Result<CaseTable, CaseError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_case_table_from(file, columns)?;

    log::info!(
        "Loaded {} case rows ({} municipalities) from {}",
        table.len(),
        table.municipalities().len(),
        path.display()
    );

    Ok(table)
}

/// Reads a case table from any reader producing CSV.
///
/// # Errors
///
/// Returns [`CaseError`] if a required column is missing or any cell fails
/// to parse.
pub fn read_case_table_from<R: Read>(
    reader: R,
    columns: &CaseColumns,
) -> Result<CaseTable, CaseError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    for required in [&columns.code, &columns.disease, &columns.date] {
        if !headers.iter().any(|h| h == required) {
            return Err(CaseError::MissingColumn {
                column: required.clone(),
            });
        }
    }

    let slots: Vec<Slot> = headers.iter().map(|h| columns.slot(h)).collect();

    for covariate in Covariate::ALL {
        if !headers.iter().any(|h| h == covariate.column()) {
            log::warn!(
                "Column {} not present; it will be treated as all-missing",
                covariate.column()
            );
        }
    }

    let mut records = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);

        let mut municipality = None;
        let mut date = None;
        let mut disease = String::new();
        let mut cases = None;
        let mut covariates = Covariates::default();
        let mut extra = BTreeMap::new();

        for ((name, slot), cell) in headers.iter().zip(&slots).zip(record.iter()) {
            match slot {
                Slot::Code => {
                    let code = RawMunicipalityCode::from(cell)
                        .coerce()
                        .map_err(|source| CaseError::Code { line, source })?;
                    municipality = Some(code);
                }
                Slot::Disease => disease = cell.to_owned(),
                Slot::Date => {
                    date = Some(parse_month(cell).ok_or_else(|| CaseError::Date {
                        line,
                        value: cell.to_owned(),
                    })?);
                }
                Slot::Cases => cases = parse_number(cell, name, line)?,
                Slot::Covariate(covariate) => {
                    covariates.set(*covariate, parse_number(cell, name, line)?);
                }
                Slot::Extra => {
                    extra.insert(name.clone(), cell.to_owned());
                }
            }
        }

        let Some(municipality) = municipality else {
            return Err(CaseError::MissingColumn {
                column: columns.code.clone(),
            });
        };
        let Some(date) = date else {
            return Err(CaseError::MissingColumn {
                column: columns.date.clone(),
            });
        };

        records.push(CaseRecord {
            row,
            municipality,
            date,
            disease,
            cases,
            covariates,
            extra,
        });
    }

    Ok(CaseTable {
        columns: headers,
        records,
    })
}

fn parse_number(cell: &str, column: &str, line: u64) -> Result<Option<f64>, CaseError> {
    parse_value(cell).map_err(|_| CaseError::Number {
        line,
        column: column.to_owned(),
        value: cell.to_owned(),
    })
}

/// Writes a case table to a CSV file, without a row-number column.
///
/// # Errors
///
/// Returns [`CaseError`] if the file cannot be created or written.
pub fn write_case_table(
    path: impl AsRef<Path>,
    table: &CaseTable,
    columns: &CaseColumns,
) -> Result<(), CaseError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_case_table_to(file, table, columns)?;

    log::info!("Wrote {} case rows to {}", table.len(), path.display());
    Ok(())
}

/// Writes a case table as CSV to any writer.
///
/// # Errors
///
/// Returns [`CaseError`] if serialization or the underlying write fails.
pub fn write_case_table_to<W: Write>(
    writer: W,
    table: &CaseTable,
    columns: &CaseColumns,
) -> Result<(), CaseError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;

    let slots: Vec<Slot> = table.columns.iter().map(|h| columns.slot(h)).collect();

    for record in &table.records {
        let row: Vec<String> = table
            .columns
            .iter()
            .zip(&slots)
            .map(|(name, slot)| match slot {
                Slot::Code => record.municipality.to_string(),
                Slot::Disease => record.disease.clone(),
                Slot::Date => format_date(record.date),
                Slot::Cases => format_value(record.cases),
                Slot::Covariate(covariate) => format_value(record.covariates.get(*covariate)),
                Slot::Extra => record.extra.get(name).cloned().unwrap_or_default(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use malaria_choco_cases_models::MunicipalityCode;

    use super::*;

    const SAMPLE: &str = "\
COD_MUN,NOM_MUN,MALARIA,DATE2,CASES,MUN_ELV_MEAN,PREC_CUM_MONTH,mean_evi
27001,QUIBDO,MALARIA FALCIPARUM,2018-01,12,43.5,810.2,0.41
27001,QUIBDO,MALARIA FALCIPARUM,2018-02,9,43.5,,0.38
27006,ACANDI,MALARIA FALCIPARUM,2018-01,,112.0,NaN,
";

    fn sample() -> CaseTable {
        read_case_table_from(SAMPLE.as_bytes(), &CaseColumns::default()).unwrap()
    }

    #[test]
    fn reads_typed_columns() {
        let table = sample();
        assert_eq!(table.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.row, 0);
        assert_eq!(first.municipality, MunicipalityCode(27001));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(first.disease, "MALARIA FALCIPARUM");
        assert_eq!(first.cases, Some(12.0));
        assert_eq!(first.covariates.get(Covariate::ElevationMean), Some(43.5));
        assert_eq!(first.covariates.get(Covariate::VegetationIndex), Some(0.41));
    }

    #[test]
    fn missing_cells_and_absent_columns_are_none() {
        let table = sample();
        let third = &table.records[2];
        assert_eq!(third.cases, None);
        assert_eq!(third.covariates.get(Covariate::PrecipitationCumulative), None);
        assert_eq!(third.covariates.get(Covariate::VegetationIndex), None);
        // Not present in the header at all.
        assert_eq!(third.covariates.get(Covariate::ElevationMax), None);
    }

    #[test]
    fn keeps_unknown_columns_as_extra() {
        let table = sample();
        assert_eq!(
            table.records[2].extra.get("NOM_MUN").map(String::as_str),
            Some("ACANDI")
        );
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = read_case_table_from(
            "COD_MUN,DATE2\n27001,2018-01\n".as_bytes(),
            &CaseColumns::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CaseError::MissingColumn { ref column } if column == "MALARIA"));
    }

    #[test]
    fn bad_date_reports_line() {
        let text = "\
COD_MUN,MALARIA,DATE2
27001,MALARIA FALCIPARUM,2018-01
27001,MALARIA FALCIPARUM,enero
";
        let err = read_case_table_from(text.as_bytes(), &CaseColumns::default())
        .unwrap_err();
        assert!(matches!(err, CaseError::Date { line: 3, ref value } if value == "enero"));
    }

    #[test]
    fn bad_number_reports_column() {
        let err = read_case_table_from(
            "COD_MUN,MALARIA,DATE2,CASES\n27001,MALARIA FALCIPARUM,2018-01,many\n".as_bytes(),
            &CaseColumns::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CaseError::Number { ref column, .. } if column == "CASES"));
    }

    #[test]
    fn bad_code_is_an_error() {
        let err = read_case_table_from(
            "COD_MUN,MALARIA,DATE2\nQUIBDO,MALARIA FALCIPARUM,2018-01\n".as_bytes(),
            &CaseColumns::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CaseError::Code { line: 2, .. }));
    }

    #[test]
    fn custom_column_names() {
        let columns = CaseColumns {
            code: "municipio".to_owned(),
            disease: "especie".to_owned(),
            date: "fecha".to_owned(),
        };
        let table = read_case_table_from(
            "municipio,especie,fecha\n27001,MALARIA VIVAX,2019-03\n".as_bytes(),
            &columns,
        )
        .unwrap();
        assert_eq!(table.records[0].disease, "MALARIA VIVAX");
        assert_eq!(
            table.records[0].date,
            NaiveDate::from_ymd_opt(2019, 3, 1).unwrap()
        );
    }

    #[test]
    fn writes_same_columns_in_same_order() {
        let table = sample();
        let mut out = Vec::new();
        write_case_table_to(&mut out, &table, &CaseColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "COD_MUN,NOM_MUN,MALARIA,DATE2,CASES,MUN_ELV_MEAN,PREC_CUM_MONTH,mean_evi"
        );
        assert_eq!(
            lines.next().unwrap(),
            "27001,QUIBDO,MALARIA FALCIPARUM,2018-01-01,12,43.5,810.2,0.41"
        );
        assert_eq!(
            lines.next().unwrap(),
            "27001,QUIBDO,MALARIA FALCIPARUM,2018-02-01,9,43.5,,0.38"
        );
        assert_eq!(
            lines.next().unwrap(),
            "27006,ACANDI,MALARIA FALCIPARUM,2018-01-01,,112,,"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn disease_label_is_kept_verbatim() {
        let table = read_case_table_from(
            "COD_MUN,MALARIA,DATE2\n27001, MALARIA FALCIPARUM ,2018-01\n".as_bytes(),
            &CaseColumns::default(),
        )
        .unwrap();
        assert_eq!(table.records[0].disease, " MALARIA FALCIPARUM ");

        let mut out = Vec::new();
        write_case_table_to(&mut out, &table, &CaseColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("27001, MALARIA FALCIPARUM ,2018-01-01"));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("falciparum.csv");

        let table = sample();
        write_case_table(&path, &table, &CaseColumns::default()).unwrap();
        let reread = read_case_table(&path, &CaseColumns::default()).unwrap();

        assert_eq!(reread.columns, table.columns);
        assert_eq!(reread.records, table.records);
    }
}
