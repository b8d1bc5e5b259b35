//! Command-line parsing for the housing affordability explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{ChartKind, TableFormat, TableKind};

pub mod picker;

/// Default location of the HouseTS extract.
pub const DEFAULT_DATA_PATH: &str = "data/HouseTS_reduced.csv";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "afford", version, about = "Housing affordability explorer (price-to-income by metro)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `AFFORD_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every chapter of the affordability story as text tables.
    Report(DataArgs),
    /// Write one pipeline table to stdout as CSV or JSON.
    Tables(TablesArgs),
    /// Render a composite series as an ASCII chart.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same pipeline as `afford report`, but renders each chapter
    /// with a chart in a terminal UI using Ratatui.
    Tui(DataArgs),
    /// Generate a synthetic HouseTS-shaped CSV panel.
    Sample(SampleArgs),
}

/// Data source and chapter options shared by every pipeline command.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Input CSV (defaults to `data/HouseTS_reduced.csv`, else an interactive picker).
    #[arg(short = 'f', long, env = "AFFORD_DATA", value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Focus year for the divergence, rent and snapshot chapters (default: latest).
    #[arg(long)]
    pub focus_year: Option<i32>,

    /// Metros highlighted at each end of the PTI ranking.
    #[arg(long, default_value_t = 7)]
    pub top: usize,

    /// Metros listed in the rent-burden table.
    #[arg(long, default_value_t = 10)]
    pub rent_top: usize,

    /// Metros annotated at each end of the snapshot ladder.
    #[arg(long, default_value_t = 5)]
    pub snapshot: usize,

    /// First year of the PTI change window.
    #[arg(long, default_value_t = 2019)]
    pub change_from: i32,

    /// Last year of the PTI change window.
    #[arg(long, default_value_t = 2022)]
    pub change_to: i32,
}

/// Options for dumping a table.
#[derive(Debug, Parser)]
pub struct TablesArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Which table to write.
    #[arg(short, long, value_enum, default_value_t = TableKind::Summary)]
    pub table: TableKind,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
    pub format: TableFormat,
}

/// Options for the ASCII chart.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Which series to draw.
    #[arg(long, value_enum, default_value_t = ChartKind::Index)]
    pub chart: ChartKind,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Number of metros.
    #[arg(short = 'n', long, default_value_t = 25)]
    pub metros: usize,

    /// First calendar year (monthly observations start in January).
    #[arg(long, default_value_t = 2012)]
    pub start_year: i32,

    /// Last calendar year (inclusive).
    #[arg(long, default_value_t = 2023)]
    pub end_year: i32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability that an income or rent cell is reported as zero.
    #[arg(long, default_value_t = 0.01)]
    pub zero_prob: f64,

    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}
