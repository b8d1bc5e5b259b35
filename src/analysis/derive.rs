//! Column derivation: raw rows → enriched observations.
//!
//! This is the only stage that types the raw cells, so it owns every schema
//! and parse failure. Everything downstream works on clean `Option<f64>` fields.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::analysis::classify;
use crate::domain::{EnrichedObservation, HOUSEHOLD_SIZE, RawRecord, RawTable};
use crate::error::PipelineError;

pub const COL_DATE: &str = "date";
pub const COL_PRICE: &str = "median_sale_price";
pub const COL_RENT: &str = "Median Rent";
pub const COL_INCOME: &str = "Per Capita Income";
pub const COL_METRO: &str = "city_full";
pub const COL_INVENTORY: &str = "inventory";
pub const COL_DOM: &str = "median_dom";
pub const COL_SALE_TO_LIST: &str = "avg_sale_to_list";

/// Columns the input must carry, by exact name.
pub const REQUIRED_COLUMNS: [&str; 5] = [COL_DATE, COL_PRICE, COL_RENT, COL_INCOME, COL_METRO];

/// Resolved column positions.
struct Columns {
    date: usize,
    price: usize,
    rent: usize,
    income: usize,
    metro: usize,
    inventory: Option<usize>,
    dom: Option<usize>,
    sale_to_list: Option<usize>,
}

impl Columns {
    fn resolve(raw: &RawTable) -> Result<Self, PipelineError> {
        let required = |name: &str| raw.column_index(name).ok_or_else(|| PipelineError::missing_column(name));
        Ok(Self {
            date: required(COL_DATE)?,
            price: required(COL_PRICE)?,
            rent: required(COL_RENT)?,
            income: required(COL_INCOME)?,
            metro: required(COL_METRO)?,
            inventory: raw.column_index(COL_INVENTORY),
            dom: raw.column_index(COL_DOM),
            sale_to_list: raw.column_index(COL_SALE_TO_LIST),
        })
    }
}

/// Enrich every raw row with `year`, the household income estimate, the three
/// ratios and the PTI band.
///
/// Any raw `year` column is ignored; `year` always comes from `date`.
pub fn derive(raw: &RawTable) -> Result<Vec<EnrichedObservation>, PipelineError> {
    let cols = Columns::resolve(raw)?;

    let mut out = Vec::with_capacity(raw.len());
    for record in &raw.rows {
        out.push(derive_row(record, &cols)?);
    }

    let rated = out.iter().filter(|o| o.affordability_rating.is_some()).count();
    debug!(rows = out.len(), rated, "derived columns");
    Ok(out)
}

fn derive_row(record: &RawRecord, cols: &Columns) -> Result<EnrichedObservation, PipelineError> {
    let metro = cell(record, cols.metro);
    if metro.is_empty() {
        return Err(PipelineError::DataFormat {
            message: format!("line {}: empty `{COL_METRO}`", record.line),
        });
    }

    let date_raw = cell(record, cols.date);
    let date = parse_date(date_raw).map_err(|message| PipelineError::Parse {
        line: record.line,
        column: COL_DATE.to_string(),
        value: date_raw.to_string(),
        message,
    })?;

    let median_sale_price = number(record, cols.price, COL_PRICE)?;
    let median_rent = number(record, cols.rent, COL_RENT)?;
    let per_capita_income = number(record, cols.income, COL_INCOME)?;
    let inventory = optional_number(record, cols.inventory, COL_INVENTORY)?;
    let median_dom = optional_number(record, cols.dom, COL_DOM)?;
    let avg_sale_to_list = optional_number(record, cols.sale_to_list, COL_SALE_TO_LIST)?;

    // A zero denominator is missing data, not a ratio of infinity.
    let income = non_zero(per_capita_income);
    let annual_rent = non_zero(median_rent).map(|r| r * 12.0);

    let household_income_estimate = income.map(|i| i * HOUSEHOLD_SIZE);
    let price_to_income = ratio(median_sale_price, household_income_estimate);
    let rent_to_income = ratio(annual_rent, household_income_estimate);
    let price_to_rent = ratio(median_sale_price, annual_rent);

    Ok(EnrichedObservation {
        city_full: metro.to_string(),
        date,
        year: date.year(),
        median_sale_price,
        median_rent,
        per_capita_income,
        inventory,
        median_dom,
        avg_sale_to_list,
        household_income_estimate,
        price_to_income,
        rent_to_income,
        price_to_rent,
        affordability_rating: classify(price_to_income),
    })
}

fn cell(record: &RawRecord, idx: usize) -> &str {
    record.cells.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn non_zero(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0)
}

fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    let den = non_zero(den)?;
    let r = num? / den;
    r.is_finite().then_some(r)
}

fn number(record: &RawRecord, idx: usize, column: &str) -> Result<Option<f64>, PipelineError> {
    let raw = cell(record, idx);
    parse_number(raw).map_err(|message| PipelineError::Parse {
        line: record.line,
        column: column.to_string(),
        value: raw.to_string(),
        message,
    })
}

fn optional_number(record: &RawRecord, idx: Option<usize>, column: &str) -> Result<Option<f64>, PipelineError> {
    match idx {
        Some(idx) => number(record, idx, column),
        None => Ok(None),
    }
}

/// Parse a numeric cell. Blank cells, the usual missing-value tokens and
/// non-finite values (`inf`, overflowing exponents) are null.
fn parse_number(s: &str) -> Result<Option<f64>, String> {
    if s.is_empty() || matches!(s.to_ascii_lowercase().as_str(), "nan" | "na" | "n/a" | "null" | "none") {
        return Ok(None);
    }
    let v = s.parse::<f64>().map_err(|e| e.to_string())?;
    Ok(v.is_finite().then_some(v))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Exports of the panel use ISO dates, sometimes with a midnight timestamp
    // attached. US-style month-first dates are accepted as well.
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err("expected YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY or YYYY-MM-DD HH:MM:SS".to_string())
}
