//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the input CSV
//! - runs the pipeline
//! - prints chapters, tables and plots, or hands over to the TUI

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Command, DEFAULT_DATA_PATH, DataArgs, PlotArgs, SampleArgs, TablesArgs};
use crate::domain::{AppConfig, TableKind};
use crate::error::AppError;
use crate::io::{read_raw_table, write_table};

pub mod pipeline;

/// Entry point for the `afford` binary.
pub fn run() -> Result<(), AppError> {
    // A local `.env` may carry `AFFORD_DATA` / `AFFORD_LOG`.
    dotenvy::dotenv().ok();

    // We want `afford` and `afford -f x.csv` to behave like `afford tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the screen; logs would corrupt it unless asked for explicitly.
    let default_level = match cli.command {
        Command::Tui(_) => "off",
        _ => crate::logging::default_directive(cli.verbose),
    };
    crate::logging::init(default_level);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Tables(args) => handle_tables(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_report(args: DataArgs) -> Result<(), AppError> {
    let config = config_from_args(&args, resolve_data_path(args.data.as_deref())?);
    let output = load_and_run(&config)?;
    print!("{}", crate::report::format_report(&output, &config));
    Ok(())
}

fn handle_tables(args: TablesArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.data, resolve_data_path(args.data.data.as_deref())?);
    let output = load_and_run(&config)?;

    let stdout = std::io::stdout();
    let out = stdout.lock();
    match args.table {
        TableKind::Enriched => write_table(out, &output.enriched, args.format),
        // The one table that can fail on its own; exit code 3 for a bad base.
        TableKind::Composite => {
            let composite = output.composite.map_err(AppError::from)?;
            write_table(out, &composite, args.format)
        }
        TableKind::Summary => write_table(out, &output.summary, args.format),
        TableKind::Counts => write_table(out, &output.counts, args.format),
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let mut config = config_from_args(&args.data, resolve_data_path(args.data.data.as_deref())?);
    config.plot_width = args.width;
    config.plot_height = args.height;

    let output = load_and_run(&config)?;
    let plot = crate::plot::render_chart(args.chart, &output, &config)?;
    println!("{plot}");
    Ok(())
}

fn handle_tui(args: DataArgs) -> Result<(), AppError> {
    let config = config_from_args(&args, resolve_data_path(args.data.as_deref())?);
    crate::tui::run(config)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        metros: args.metros,
        start_year: args.start_year,
        end_year: args.end_year,
        seed: args.seed,
        zero_prob: args.zero_prob,
    };
    let rows = crate::data::generate_panel(&config)?;

    match &args.out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
            write_table(std::io::BufWriter::new(file), &rows, crate::domain::TableFormat::Csv)?;
            info!(path = %path.display(), rows = rows.len(), "wrote sample panel");
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_table(&mut out, &rows, crate::domain::TableFormat::Csv)?;
            out.flush()
                .map_err(|e| AppError::new(4, format!("Failed to flush output: {e}")))?;
        }
    }
    Ok(())
}

fn load_and_run(config: &AppConfig) -> Result<pipeline::PipelineOutput, AppError> {
    let raw = read_raw_table(&config.data_path)?;
    let output = pipeline::run_pipeline(&raw)?;
    debug!(path = %config.data_path.display(), metros = output.metro_count(), "pipeline output ready");
    Ok(output)
}

/// Explicit path, else the default extract when present, else the picker.
pub fn resolve_data_path(explicit: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let default = Path::new(DEFAULT_DATA_PATH);
    if default.is_file() {
        return Ok(default.to_path_buf());
    }
    crate::cli::picker::prompt_for_csv_path()
}

pub fn config_from_args(args: &DataArgs, data_path: PathBuf) -> AppConfig {
    AppConfig {
        focus_year: args.focus_year,
        highlight_n: args.top,
        rent_top_n: args.rent_top,
        snapshot_n: args.snapshot,
        change_from: args.change_from,
        change_to: args.change_to,
        ..AppConfig::with_data_path(data_path)
    }
}

/// Rewrite argv so `afford` defaults to `afford tui`.
///
/// Rules:
/// - `afford`                      -> `afford tui`
/// - `afford -f x.csv ...`         -> `afford tui -f x.csv ...`
/// - `afford --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "tables" | "plot" | "tui" | "sample");
    if is_subcommand {
        return argv;
    }

    // Global verbosity flags stay in front; other flags belong to `tui`.
    if arg1.starts_with('-') && !is_verbosity_flag(&arg1) {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["afford"])), argv(&["afford", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["afford", "-f", "x.csv"])),
            argv(&["afford", "tui", "-f", "x.csv"])
        );
    }

    #[test]
    fn subcommands_help_and_verbosity_are_untouched() {
        for args in [
            &["afford", "report"][..],
            &["afford", "--help"][..],
            &["afford", "-vv", "report"][..],
            &["afford", "sample", "-n", "3"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = crate::cli::Cli::parse_from(["afford", "tables", "-f", "x.csv"]);
        let Command::Tables(args) = cli.command else {
            panic!("expected tables");
        };
        assert_eq!(args.table, TableKind::Summary);
        let config = config_from_args(&args.data, PathBuf::from("x.csv"));
        assert_eq!(config.highlight_n, 7);
        assert_eq!(config.rent_top_n, 10);
        assert_eq!((config.change_from, config.change_to), (2019, 2022));
        assert_eq!(config.focus_year, None);
    }

    #[test]
    fn explicit_path_wins() {
        let path = resolve_data_path(Some(Path::new("somewhere.csv"))).unwrap();
        assert_eq!(path, PathBuf::from("somewhere.csv"));
    }

    #[test]
    fn end_to_end_on_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,city_full,median_sale_price,Median Rent,Per Capita Income\n\
             2012-01-31,A,251000,1000,40000\n\
             2013-01-31,A,276100,1000,40000"
        )
        .unwrap();

        let config = AppConfig::with_data_path(file.path().to_path_buf());
        let output = load_and_run(&config).unwrap();
        assert_eq!(output.summary.len(), 2);
        let text = crate::report::format_report(&output, &config);
        assert!(text.contains("1. Prices vs Incomes (Macro Trend)"));
    }
}
