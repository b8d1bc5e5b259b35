//! Chart series built from pipeline output.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::analysis::insights::{composite_rent_to_income, highlight_metros, metro_pti_series, metro_rent_series, top_rent_burden};
use crate::app::pipeline::PipelineOutput;
use crate::domain::{AppConfig, ChartKind, CompositePoint};
use crate::error::PipelineError;
use crate::plot::{PlotSeries, render_line_plot};

/// Fractional year: `2012-01-01` -> `2012.0`, `2012-07-02` -> `~2012.5`.
pub fn date_to_x(date: NaiveDate) -> f64 {
    let days = NaiveDate::from_ymd_opt(date.year(), 12, 31).map_or(365, |d| d.ordinal());
    date.year() as f64 + date.ordinal0() as f64 / days as f64
}

/// Title and series of one chart.
///
/// Only the index chart depends on the composite series; the others drop the
/// composite line when it is unavailable.
pub fn chart_series(
    kind: ChartKind,
    output: &PipelineOutput,
    config: &AppConfig,
) -> Result<(String, Vec<PlotSeries>), PipelineError> {
    match kind {
        ChartKind::Index => {
            let points = output.composite.as_ref().map_err(Clone::clone)?;
            Ok(("Composite price vs income (first year = 100)".to_string(), index_series(points)))
        }
        ChartKind::Pti => {
            let year = output.focus_year(config);
            let title = match year {
                Some(y) => format!("Price-to-income, metros highlighted in {y}"),
                None => "Price-to-income".to_string(),
            };
            Ok((title, pti_series(output, config, year)))
        }
        ChartKind::Rent => Ok(("Rent-to-income".to_string(), rent_series(output, config))),
    }
}

/// Render one chart as ASCII at the configured size.
pub fn render_chart(kind: ChartKind, output: &PipelineOutput, config: &AppConfig) -> Result<String, PipelineError> {
    let (title, series) = chart_series(kind, output, config)?;
    Ok(render_line_plot(&title, &series, config.plot_width, config.plot_height))
}

/// Home price and household income indices.
pub fn index_series(points: &[CompositePoint]) -> Vec<PlotSeries> {
    let price = points.iter().map(|p| opt_point(date_to_x(p.date), p.price_index)).collect();
    let income = points.iter().map(|p| opt_point(date_to_x(p.date), p.income_index)).collect();
    vec![
        PlotSeries::new("Home price index", '#', price),
        PlotSeries::new("Household income index", '+', income),
    ]
}

/// Composite PTI plus one line per highlighted metro.
pub fn pti_series(output: &PipelineOutput, config: &AppConfig, focus_year: Option<i32>) -> Vec<PlotSeries> {
    let mut out = Vec::new();
    if let Ok(points) = &output.composite {
        out.push(PlotSeries::new(
            "U.S. composite PTI",
            '*',
            points.iter().map(|p| opt_point(date_to_x(p.date), p.composite_pti)).collect(),
        ));
    }

    let Some(year) = focus_year else {
        return out;
    };
    let highlights = highlight_metros(&output.summary, year, config.highlight_n);

    let mut by_metro: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for p in metro_pti_series(&output.enriched) {
        by_metro.entry(p.city_full).or_default().push((date_to_x(p.date), p.price_to_income));
    }

    let least = highlights.least_affordable.iter().map(|r| (r, '^', "least affordable"));
    let most = highlights.most_affordable.iter().map(|r| (r, 'v', "most affordable"));
    let mut seen: Vec<&str> = Vec::new();
    for (row, glyph, tag) in least.chain(most) {
        if seen.contains(&row.city_full.as_str()) {
            continue;
        }
        seen.push(row.city_full.as_str());
        if let Some(points) = by_metro.get(&row.city_full) {
            out.push(PlotSeries::new(format!("{} ({tag})", row.city_full), glyph, points.clone()));
        }
    }
    out
}

/// Mean RTI by year plus the most rent-burdened metro of the focus year.
pub fn rent_series(output: &PipelineOutput, config: &AppConfig) -> Vec<PlotSeries> {
    let mean = composite_rent_to_income(&output.summary)
        .into_iter()
        .map(|v| (v.year as f64 + 0.5, v.value))
        .collect();
    let mut out = vec![PlotSeries::new("Mean rent-to-income (all metros)", '*', mean)];

    let top = output
        .focus_year(config)
        .and_then(|year| top_rent_burden(&output.summary, year, 1).into_iter().next());
    if let Some(top) = top {
        let points = metro_rent_series(&output.enriched, &top.city_full)
            .into_iter()
            .map(|p| opt_point(date_to_x(p.date), p.rent_to_income))
            .collect();
        out.push(PlotSeries::new(format!("{} rent-to-income", top.city_full), 'o', points));
    }
    out
}

fn opt_point(x: f64, y: Option<f64>) -> (f64, f64) {
    (x, y.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::enriched;
    use crate::analysis::{count_bands, summarize};

    fn output() -> PipelineOutput {
        let enriched = vec![
            enriched("A", (2012, 1, 1), Some(3.0), Some(0.20)),
            enriched("A", (2013, 1, 1), Some(3.5), Some(0.22)),
            enriched("B", (2012, 1, 1), Some(8.0), Some(0.30)),
            enriched("B", (2013, 1, 1), Some(9.0), None),
            enriched("C", (2013, 1, 1), Some(5.0), Some(0.25)),
        ];
        let summary = summarize(&enriched);
        let counts = count_bands(&summary);
        PipelineOutput {
            enriched,
            composite: Err(PipelineError::invalid_base("empty input")),
            summary,
            counts,
        }
    }

    fn config() -> AppConfig {
        let mut c = AppConfig::with_data_path("x.csv".into());
        c.highlight_n = 1;
        c
    }

    #[test]
    fn date_to_x_is_fractional_year() {
        assert_eq!(date_to_x(NaiveDate::from_ymd_opt(2012, 1, 1).unwrap()), 2012.0);
        let mid = date_to_x(NaiveDate::from_ymd_opt(2013, 7, 2).unwrap());
        assert!((mid - 2013.4986).abs() < 1e-3);
        assert!(date_to_x(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap()) < 2014.0);
    }

    #[test]
    fn index_chart_needs_the_composite() {
        let err = chart_series(ChartKind::Index, &output(), &config()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBase { .. }));
    }

    #[test]
    fn pti_chart_draws_highlighted_metros_only() {
        let (title, series) = chart_series(ChartKind::Pti, &output(), &config()).unwrap();
        assert_eq!(title, "Price-to-income, metros highlighted in 2013");
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["B (least affordable)", "A (most affordable)"]);
        assert_eq!(series[0].points, vec![(2012.0, 8.0), (2013.0, 9.0)]);
    }

    #[test]
    fn rent_chart_follows_top_burden_metro() {
        let series = rent_series(&output(), &config());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].points.len(), 2);
        // B has no RTI in 2013, so C (0.25) tops the burden ranking.
        assert_eq!(series[1].label, "C rent-to-income");
        assert_eq!(series[1].points, vec![(2013.0, 0.25)]);
    }

    #[test]
    fn render_chart_uses_plot_size() {
        let mut c = config();
        c.plot_width = 20;
        c.plot_height = 6;
        let txt = render_chart(ChartKind::Rent, &output(), &c).unwrap();
        assert!(txt.starts_with("Plot: Rent-to-income |"));
        assert_eq!(txt.lines().count(), 1 + 6 + 2);
    }
}
