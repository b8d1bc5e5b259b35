//! Formatted terminal output for the chapters.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (the report tests compare exact text)
//!
//! Chapters are rendered as plain lines so the TUI can show the same text in a
//! side panel that `afford report` prints.

use std::collections::BTreeMap;

use crate::analysis::insights::{
    MetroGroup, affordability_ladder, composite_rent_to_income, dense_band_grid, dominant_band,
    highlight_metros, market_tightness, pti_change, top_rent_burden,
};
use crate::app::pipeline::PipelineOutput;
use crate::domain::{AffordabilityBand, AppConfig, CompositePoint, MetroYearSummary};
use crate::report::Chapter;

/// Dataset header printed once above the chapters.
pub fn format_header(output: &PipelineOutput, config: &AppConfig) -> String {
    let mut out = String::new();
    out.push_str("=== afford - Housing Affordability Explorer ===\n");
    out.push_str(&format!("Data: {}\n", config.data_path.display()));

    let years = year_span(&output.summary);
    let span = match years {
        Some((lo, hi)) => format!("{lo}-{hi}"),
        None => "-".to_string(),
    };
    out.push_str(&format!(
        "Rows: n={} | metros={} | years={span}\n",
        output.enriched.len(),
        output.metro_count(),
    ));
    out
}

/// Every chapter, in story order.
pub fn format_report(output: &PipelineOutput, config: &AppConfig) -> String {
    let mut out = format_header(output, config);
    for chapter in Chapter::ALL {
        out.push('\n');
        for line in chapter_lines(chapter, output, config) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Title, intro, tables and notes of one chapter.
pub fn chapter_lines(chapter: Chapter, output: &PipelineOutput, config: &AppConfig) -> Vec<String> {
    let mut lines = vec![
        format!("{}. {}", chapter.number(), chapter.title()),
        String::new(),
        chapter.intro().to_string(),
        String::new(),
    ];

    let focus = output.focus_year(config);
    match chapter {
        Chapter::MacroTrend => macro_trend(&mut lines, output),
        Chapter::MetroDivergence => divergence(&mut lines, output, config, focus),
        Chapter::AffordabilityBands => bands(&mut lines, output),
        Chapter::RentBurden => rent_burden(&mut lines, output, config, focus),
        Chapter::Snapshot => snapshot(&mut lines, output, config, focus),
    }

    lines.push(String::new());
    lines.push("What we notice:".to_string());
    for note in chapter.notes() {
        lines.push(format!("- {note}"));
    }
    lines
}

fn macro_trend(lines: &mut Vec<String>, output: &PipelineOutput) {
    match &output.composite {
        Ok(points) => {
            lines.push(row(&["year", "price_idx", "income_idx", "gap", "US PTI", "band"], &[6, 10, 10, 8, 8, 24]));
            lines.push(rule(&[6, 10, 10, 8, 8, 24]));
            for p in year_end_points(points) {
                let gap = p.price_index.zip(p.income_index).map(|(a, b)| a - b);
                lines.push(row(
                    &[
                        &p.year.to_string(),
                        &fmt_opt(p.price_index, 1),
                        &fmt_opt(p.income_index, 1),
                        &fmt_opt(gap, 1),
                        &fmt_opt(p.composite_pti, 2),
                        band_name(p.affordability_rating),
                    ],
                    &[6, 10, 10, 8, 8, 24],
                ));
            }
        }
        Err(err) => lines.push(unavailable("Composite series", err)),
    }

    let tightness = market_tightness(&output.summary);
    if tightness.iter().any(|t| t.median_dom.is_some() || t.inventory.is_some() || t.sale_to_list.is_some()) {
        lines.push(String::new());
        lines.push("Market tightness (metro means):".to_string());
        lines.push(row(&["year", "dom", "inventory", "sale/list"], &[6, 8, 10, 10]));
        lines.push(rule(&[6, 8, 10, 10]));
        for t in tightness {
            lines.push(row(
                &[
                    &t.year.to_string(),
                    &fmt_opt(t.median_dom, 1),
                    &fmt_opt(t.inventory, 0),
                    &fmt_opt(t.sale_to_list, 3),
                ],
                &[6, 8, 10, 10],
            ));
        }
    }
}

fn divergence(lines: &mut Vec<String>, output: &PipelineOutput, config: &AppConfig, focus: Option<i32>) {
    let Some(year) = focus else {
        lines.push("No metro-year summary rows.".to_string());
        return;
    };
    let n = config.highlight_n;
    let highlights = highlight_metros(&output.summary, year, n);

    lines.push(format!("Metros highlighted in {year}:"));
    lines.push(format!("{} - highest PTI:", MetroGroup::LeastAffordable.label(n)));
    push_metro_table(lines, &highlights.least_affordable);
    lines.push(String::new());
    lines.push(format!("{} - lowest PTI:", MetroGroup::MostAffordable.label(n)));
    push_metro_table(lines, &highlights.most_affordable);

    let changes = pti_change(&output.summary, config.change_from, config.change_to);
    lines.push(String::new());
    if changes.is_empty() {
        lines.push(format!(
            "PTI change {}-{}: no metro has PTI in both years.",
            config.change_from, config.change_to
        ));
        return;
    }
    lines.push(format!("Largest PTI increases {}-{}:", config.change_from, config.change_to));
    let widths = [32, 8, 8, 8];
    lines.push(row(&["metro", &config.change_from.to_string(), &config.change_to.to_string(), "chg%"], &widths));
    lines.push(rule(&widths));
    for c in changes.iter().take(n) {
        lines.push(row(
            &[
                &truncate(&c.city_full, 32),
                &format!("{:.2}", c.pti_base),
                &format!("{:.2}", c.pti_follow),
                &format!("{:+.1}", c.pct_change),
            ],
            &widths,
        ));
    }
}

fn bands(lines: &mut Vec<String>, output: &PipelineOutput) {
    let grid = dense_band_grid(&output.counts);
    if grid.is_empty() {
        lines.push("No rated metro-years.".to_string());
        return;
    }

    let us_pti: BTreeMap<i32, Option<f64>> = match &output.composite {
        Ok(points) => year_end_points(points).into_iter().map(|p| (p.year, p.composite_pti)).collect(),
        Err(_) => BTreeMap::new(),
    };

    let widths = [6, 5, 5, 5, 5, 5, 6, 8, 24];
    lines.push(row(&["year", "AFF", "MOD", "SER", "SEV", "IMP", "total", "US PTI", "dominant"], &widths));
    lines.push(rule(&widths));
    for g in &grid {
        let mut cells: Vec<String> = vec![g.year.to_string()];
        cells.extend(g.counts.iter().map(|c| c.to_string()));
        cells.push(g.total().to_string());
        cells.push(fmt_opt(us_pti.get(&g.year).copied().flatten(), 2));
        cells.push(band_name(dominant_band(g)).to_string());
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        lines.push(row(&refs, &widths));
    }

    lines.push(String::new());
    for band in AffordabilityBand::ALL {
        lines.push(format!("  {:<3} {:<24} {}", abbrev(band), band.display_name(), band.range_label()));
    }
    if let Err(err) = &output.composite {
        lines.push(unavailable("Composite series", err));
    }
}

fn rent_burden(lines: &mut Vec<String>, output: &PipelineOutput, config: &AppConfig, focus: Option<i32>) {
    let rti = composite_rent_to_income(&output.summary);
    if rti.is_empty() {
        lines.push("No rent-to-income values.".to_string());
    } else {
        lines.push("Mean rent-to-income across metros:".to_string());
        lines.push(row(&["year", "RTI"], &[6, 8]));
        lines.push(rule(&[6, 8]));
        for p in &rti {
            lines.push(row(&[&p.year.to_string(), &format!("{:.3}", p.value)], &[6, 8]));
        }
    }

    let Some(year) = focus else {
        return;
    };
    let top = top_rent_burden(&output.summary, year, config.rent_top_n);
    if top.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("Highest rent burden in {year}:"));
    let widths = [32, 8, 8];
    lines.push(row(&["metro", "RTI", "PTI"], &widths));
    lines.push(rule(&widths));
    for r in &top {
        lines.push(row(
            &[
                &truncate(&r.city_full, 32),
                &fmt_opt(r.rent_to_income, 3),
                &fmt_opt(r.price_to_income, 2),
            ],
            &widths,
        ));
    }
}

fn snapshot(lines: &mut Vec<String>, output: &PipelineOutput, config: &AppConfig, focus: Option<i32>) {
    let Some(year) = focus else {
        lines.push("No metro-year summary rows.".to_string());
        return;
    };
    let mut ladder = affordability_ladder(&output.summary, year);
    if ladder.is_empty() {
        lines.push(format!("No metro has a PTI in {year}."));
        return;
    }
    ladder.reverse();

    let n = config.snapshot_n;
    let len = ladder.len();
    lines.push(format!("{year}: {len} metros, least affordable first."));
    let widths = [2, 32, 8, 24];
    lines.push(row(&["", "metro", "PTI", "band"], &widths));
    lines.push(rule(&widths));
    for (i, r) in ladder.iter().enumerate() {
        let marker = if i < n {
            "^"
        } else if i + n >= len {
            "v"
        } else {
            ""
        };
        lines.push(row(
            &[
                marker,
                &truncate(&r.city_full, 32),
                &fmt_opt(r.price_to_income, 2),
                band_name(r.affordability_rating),
            ],
            &widths,
        ));
    }
}

fn push_metro_table(lines: &mut Vec<String>, rows: &[MetroYearSummary]) {
    let widths = [32, 8, 24];
    lines.push(row(&["metro", "PTI", "band"], &widths));
    lines.push(rule(&widths));
    for r in rows {
        lines.push(row(
            &[
                &truncate(&r.city_full, 32),
                &fmt_opt(r.price_to_income, 2),
                band_name(r.affordability_rating),
            ],
            &widths,
        ));
    }
}

/// Last composite point of each year.
pub fn year_end_points(points: &[CompositePoint]) -> Vec<&CompositePoint> {
    let mut by_year: BTreeMap<i32, &CompositePoint> = BTreeMap::new();
    for p in points {
        by_year.insert(p.year, p);
    }
    by_year.into_values().collect()
}

fn year_span(summary: &[MetroYearSummary]) -> Option<(i32, i32)> {
    let lo = summary.iter().map(|r| r.year).min()?;
    let hi = summary.iter().map(|r| r.year).max()?;
    Some((lo, hi))
}

fn unavailable(component: &str, err: &impl std::fmt::Display) -> String {
    format!("{component} unavailable: {err}")
}

/// Left-align the first column, right-align the rest (text columns excepted).
fn row(cells: &[&str], widths: &[usize]) -> String {
    let mut out = String::new();
    for (i, (cell, &w)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let is_text = i == 0 || (cell.chars().any(|c| c.is_alphabetic()) && cell.parse::<f64>().is_err());
        if is_text {
            out.push_str(&format!("{cell:<w$}"));
        } else {
            out.push_str(&format!("{cell:>w$}"));
        }
    }
    out.trim_end().to_string()
}

fn rule(widths: &[usize]) -> String {
    widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join(" ")
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}

fn band_name(band: Option<AffordabilityBand>) -> &'static str {
    band.map(AffordabilityBand::display_name).unwrap_or("-")
}

fn abbrev(band: AffordabilityBand) -> &'static str {
    match band {
        AffordabilityBand::Affordable => "AFF",
        AffordabilityBand::ModeratelyUnaffordable => "MOD",
        AffordabilityBand::SeriouslyUnaffordable => "SER",
        AffordabilityBand::SeverelyUnaffordable => "SEV",
        AffordabilityBand::ImpossiblyUnaffordable => "IMP",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
