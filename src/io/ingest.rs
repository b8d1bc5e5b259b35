//! CSV ingest.
//!
//! This module only turns a delimited file into a `RawTable` of strings.
//! Schema checks and typing belong to the deriver (`analysis::derive`), so the
//! reader stays a dumb, reusable collaborator.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::domain::{RawRecord, RawTable};
use crate::error::AppError;

/// Read a CSV file from disk.
pub fn read_raw_table(path: &Path) -> Result<RawTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = parse_raw_table(file)?;
    info!(path = %path.display(), rows = table.len(), "loaded raw table");
    Ok(table)
}

/// Parse CSV content from any reader.
pub fn parse_raw_table<R: Read>(reader: R) -> Result<RawTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    let headers = normalize_headers(headers);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error: {e}")))?;
        // Records start on line 2 (after the header). Prefer the reader's own
        // position so quoted multi-line cells keep line numbers honest.
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        rows.push(RawRecord {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(RawTable { headers, rows })
}

fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. Column names are otherwise matched exactly (case included).
    headers
        .iter()
        .map(|name| name.trim().trim_start_matches('\u{feff}').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_headers_and_rows() {
        let csv = "\u{feff}date, Median Rent ,city_full\n2012-01-31,1000,\"Austin, TX\"\n";
        let table = parse_raw_table(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["date", "Median Rent", "city_full"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].cells, vec!["2012-01-31", "1000", "Austin, TX"]);
        assert_eq!(table.column_index("Median Rent"), Some(1));
        assert_eq!(table.column_index("median rent"), None);
    }

    #[test]
    fn short_rows_are_kept() {
        let table = parse_raw_table("a,b,c\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].cells.len(), 2);
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,city_full").unwrap();
        writeln!(file, "2012-01-31,A").unwrap();
        writeln!(file, "2012-02-29,B").unwrap();

        let table = read_raw_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_raw_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
