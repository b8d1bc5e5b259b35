//! Table dumps (CSV or JSON) for downstream chart code and scripts.
//!
//! Output goes to any writer (stdout in the CLI); nothing is persisted by the
//! pipeline itself. Column names come from the serde names on the row types.

use std::io::Write;

use serde::Serialize;

use crate::domain::TableFormat;
use crate::error::AppError;

/// Write rows to `out` in the requested format.
pub fn write_table<W: Write, T: Serialize>(out: W, rows: &[T], format: TableFormat) -> Result<(), AppError> {
    match format {
        TableFormat::Csv => write_csv(out, rows),
        TableFormat::Json => write_json(out, rows),
    }
}

fn write_csv<W: Write, T: Serialize>(out: W, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(4, format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV output: {e}")))?;
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut out: W, rows: &[T]) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, rows)
        .map_err(|e| AppError::new(4, format!("Failed to write JSON: {e}")))?;
    writeln!(out).map_err(|e| AppError::new(4, format!("Failed to write JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AffordabilityBand, BandCount};

    fn counts() -> Vec<BandCount> {
        vec![
            BandCount {
                year: 2012,
                affordability_rating: AffordabilityBand::Affordable,
                n_metros: 3,
            },
            BandCount {
                year: 2012,
                affordability_rating: AffordabilityBand::SeverelyUnaffordable,
                n_metros: 1,
            },
        ]
    }

    #[test]
    fn csv_uses_contract_column_names() {
        let mut buf = Vec::new();
        write_table(&mut buf, &counts(), TableFormat::Csv).unwrap();
        let text = String::from_utf8(buf).unwrap();
        pretty_assertions::assert_eq!(
            text,
            "year,affordability_rating,n_metros\n2012,Affordable,3\n2012,Severely Unaffordable,1\n"
        );
    }

    #[test]
    fn json_is_an_array_of_rows() {
        let mut buf = Vec::new();
        write_table(&mut buf, &counts(), TableFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[1]["affordability_rating"], "Severely Unaffordable");
        assert_eq!(value[0]["n_metros"], 3);
    }
}
