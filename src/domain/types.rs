//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the aggregation pipeline
//! - dumped as CSV/JSON tables with the column names chart code expects
//! - shown by the terminal front-ends

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Average household size used to scale per-capita income to a household estimate.
pub const HOUSEHOLD_SIZE: f64 = 2.51;

/// Inclusive upper PTI bounds for the first four bands, in band order.
///
/// Anything above the last bound is `ImpossiblyUnaffordable`. The last bound is
/// 8.9; narrative text that says "9.0" is rounding, not a second rule.
pub const BAND_THRESHOLDS: [f64; 4] = [3.0, 4.0, 5.0, 8.9];

/// Demographia affordability category, ordered from most to least affordable.
///
/// The derived `Ord` follows declaration order, which is the canonical band order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AffordabilityBand {
    #[serde(rename = "Affordable")]
    Affordable,
    #[serde(rename = "Moderately Unaffordable")]
    ModeratelyUnaffordable,
    #[serde(rename = "Seriously Unaffordable")]
    SeriouslyUnaffordable,
    #[serde(rename = "Severely Unaffordable")]
    SeverelyUnaffordable,
    #[serde(rename = "Impossibly Unaffordable")]
    ImpossiblyUnaffordable,
}

impl AffordabilityBand {
    pub const ALL: [AffordabilityBand; 5] = [
        AffordabilityBand::Affordable,
        AffordabilityBand::ModeratelyUnaffordable,
        AffordabilityBand::SeriouslyUnaffordable,
        AffordabilityBand::SeverelyUnaffordable,
        AffordabilityBand::ImpossiblyUnaffordable,
    ];

    /// Canonical name. Presentation code matches on these exact strings.
    pub fn display_name(self) -> &'static str {
        match self {
            AffordabilityBand::Affordable => "Affordable",
            AffordabilityBand::ModeratelyUnaffordable => "Moderately Unaffordable",
            AffordabilityBand::SeriouslyUnaffordable => "Seriously Unaffordable",
            AffordabilityBand::SeverelyUnaffordable => "Severely Unaffordable",
            AffordabilityBand::ImpossiblyUnaffordable => "Impossibly Unaffordable",
        }
    }

    /// Zero-based position in the band order.
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Hex colour used for this band in charts.
    pub fn hex_color(self) -> &'static str {
        match self {
            AffordabilityBand::Affordable => "#4CAF50",
            AffordabilityBand::ModeratelyUnaffordable => "#FFC107",
            AffordabilityBand::SeriouslyUnaffordable => "#FF9800",
            AffordabilityBand::SeverelyUnaffordable => "#E57373",
            AffordabilityBand::ImpossiblyUnaffordable => "#B71C1C",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            AffordabilityBand::Affordable => (0x4C, 0xAF, 0x50),
            AffordabilityBand::ModeratelyUnaffordable => (0xFF, 0xC1, 0x07),
            AffordabilityBand::SeriouslyUnaffordable => (0xFF, 0x98, 0x00),
            AffordabilityBand::SeverelyUnaffordable => (0xE5, 0x73, 0x73),
            AffordabilityBand::ImpossiblyUnaffordable => (0xB7, 0x1C, 0x1C),
        }
    }

    /// Human-readable PTI range, as quoted in the narrative.
    pub fn range_label(self) -> &'static str {
        match self {
            AffordabilityBand::Affordable => "PTI <= 3.0",
            AffordabilityBand::ModeratelyUnaffordable => "PTI 3.1-4.0",
            AffordabilityBand::SeriouslyUnaffordable => "PTI 4.1-5.0",
            AffordabilityBand::SeverelyUnaffordable => "PTI 5.1-8.9",
            AffordabilityBand::ImpossiblyUnaffordable => "PTI > 8.9",
        }
    }
}

impl fmt::Display for AffordabilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Raw input table as read from the source file.
///
/// Cells are kept as strings: typing and validation are the deriver's job, so
/// that a schema or parse failure is reported by the pipeline, not the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Header names with surrounding whitespace and any UTF-8 BOM removed.
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

/// One raw data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A raw observation enriched with derived ratios and a band.
///
/// Field names serialize to the column names of the input/output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedObservation {
    pub city_full: String,
    pub date: NaiveDate,
    /// Always the calendar year of `date`.
    pub year: i32,
    pub median_sale_price: Option<f64>,
    #[serde(rename = "Median Rent")]
    pub median_rent: Option<f64>,
    #[serde(rename = "Per Capita Income")]
    pub per_capita_income: Option<f64>,
    pub inventory: Option<f64>,
    pub median_dom: Option<f64>,
    pub avg_sale_to_list: Option<f64>,
    #[serde(rename = "median_household_income_est")]
    pub household_income_estimate: Option<f64>,
    pub price_to_income: Option<f64>,
    pub rent_to_income: Option<f64>,
    pub price_to_rent: Option<f64>,
    pub affordability_rating: Option<AffordabilityBand>,
}

/// One point of the cross-metro composite series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositePoint {
    pub date: NaiveDate,
    pub composite_price: Option<f64>,
    pub composite_income: Option<f64>,
    pub composite_pti: Option<f64>,
    pub price_index: Option<f64>,
    pub income_index: Option<f64>,
    pub year: i32,
    pub affordability_rating: Option<AffordabilityBand>,
}

/// One row per (metro, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetroYearSummary {
    pub city_full: String,
    pub year: i32,
    pub price_to_income: Option<f64>,
    pub rent_to_income: Option<f64>,
    /// Rating of the yearly mean PTI, not a vote over per-row ratings.
    pub affordability_rating: Option<AffordabilityBand>,
    #[serde(rename = "dom")]
    pub median_dom: Option<f64>,
    pub inventory: Option<f64>,
    #[serde(rename = "sale_to_list_ratio")]
    pub sale_to_list: Option<f64>,
}

/// Number of metros in one band in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCount {
    pub year: i32,
    pub affordability_rating: AffordabilityBand,
    pub n_metros: usize,
}

/// Which output table to dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    Enriched,
    Composite,
    Summary,
    Counts,
}

/// Table dump encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Csv,
    Json,
}

/// Which series the ASCII plot draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Composite price and income indices.
    Index,
    /// Composite price-to-income ratio with the highlighted metros.
    Pti,
    /// Mean rent-to-income by year with the most rent-burdened metro.
    Rent,
}

/// A full run's configuration as understood by the front-ends.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    /// Year used by the divergence/snapshot chapters; `None` means latest year.
    pub focus_year: Option<i32>,
    /// Number of metros highlighted at each end of the PTI ranking.
    pub highlight_n: usize,
    /// Number of metros in the rent-burden table.
    pub rent_top_n: usize,
    /// Number of metros annotated at each end of the snapshot ladder.
    pub snapshot_n: usize,
    pub change_from: i32,
    pub change_to: i32,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl AppConfig {
    pub fn with_data_path(data_path: PathBuf) -> Self {
        Self {
            data_path,
            focus_year: None,
            highlight_n: 7,
            rent_top_n: 10,
            snapshot_n: 5,
            change_from: 2019,
            change_to: 2022,
            plot_width: 100,
            plot_height: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_order_follows_declaration() {
        let mut shuffled = vec![
            AffordabilityBand::SeverelyUnaffordable,
            AffordabilityBand::Affordable,
            AffordabilityBand::ImpossiblyUnaffordable,
            AffordabilityBand::ModeratelyUnaffordable,
            AffordabilityBand::SeriouslyUnaffordable,
        ];
        shuffled.sort();
        assert_eq!(shuffled, AffordabilityBand::ALL.to_vec());
        for (i, band) in AffordabilityBand::ALL.iter().enumerate() {
            assert_eq!(band.rank(), i);
        }
    }

    #[test]
    fn band_serializes_to_canonical_name() {
        let json = serde_json::to_string(&AffordabilityBand::ModeratelyUnaffordable).unwrap();
        assert_eq!(json, "\"Moderately Unaffordable\"");
        for band in AffordabilityBand::ALL {
            assert_eq!(band.to_string(), band.display_name());
        }
    }
}
