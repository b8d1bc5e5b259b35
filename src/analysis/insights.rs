//! Chapter-level views over the pipeline tables.
//!
//! Each function here prepares the data behind one chart or table of the
//! narrative. They read the pipeline outputs and never modify them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::Mean;
use crate::domain::{AffordabilityBand, BandCount, EnrichedObservation, MetroYearSummary};

/// Metro-level PTI at one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetroPtiPoint {
    pub city_full: String,
    pub date: NaiveDate,
    pub price_to_income: f64,
}

/// Least and most affordable metros in one year.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetroHighlights {
    pub year: i32,
    /// Highest PTI first.
    pub least_affordable: Vec<MetroYearSummary>,
    /// Lowest PTI first.
    pub most_affordable: Vec<MetroYearSummary>,
}

/// Line grouping for the divergence chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetroGroup {
    LeastAffordable,
    MostAffordable,
    Other,
}

impl MetroGroup {
    pub fn label(self, n: usize) -> String {
        match self {
            MetroGroup::LeastAffordable => format!("Top {n} (Least Affordable)"),
            MetroGroup::MostAffordable => format!("Bottom {n} (Most Affordable)"),
            MetroGroup::Other => "Other".to_string(),
        }
    }
}

impl MetroHighlights {
    /// A metro in both lists (fewer than `2n` metros) counts as least affordable.
    pub fn group_of(&self, city: &str) -> MetroGroup {
        if self.least_affordable.iter().any(|r| r.city_full == city) {
            MetroGroup::LeastAffordable
        } else if self.most_affordable.iter().any(|r| r.city_full == city) {
            MetroGroup::MostAffordable
        } else {
            MetroGroup::Other
        }
    }
}

/// A per-year value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// A metro's rent burden at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RentPoint {
    pub date: NaiveDate,
    pub rent_to_income: Option<f64>,
}

/// PTI change of one metro between two years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PtiChange {
    pub city_full: String,
    pub pti_base: f64,
    pub pti_follow: f64,
    pub pct_change: f64,
}

/// Composite market-tightness signals for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketTightness {
    pub year: i32,
    pub median_dom: Option<f64>,
    pub inventory: Option<f64>,
    pub sale_to_list: Option<f64>,
}

/// Dense band counts for one year, indexed by `AffordabilityBand::rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandGridRow {
    pub year: i32,
    pub counts: [usize; 5],
}

impl BandGridRow {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Latest year present in the summary.
pub fn latest_year(summary: &[MetroYearSummary]) -> Option<i32> {
    summary.iter().map(|r| r.year).max()
}

/// Mean PTI per (metro, date), dropping points whose mean is null.
///
/// Input may hold several rows per metro and date (e.g. ZIP-level panels).
pub fn metro_pti_series(enriched: &[EnrichedObservation]) -> Vec<MetroPtiPoint> {
    let mut groups: BTreeMap<(&str, NaiveDate), Mean> = BTreeMap::new();
    for obs in enriched {
        groups
            .entry((obs.city_full.as_str(), obs.date))
            .or_default()
            .push(obs.price_to_income);
    }

    groups
        .into_iter()
        .filter_map(|((city, date), m)| {
            m.value().map(|price_to_income| MetroPtiPoint {
                city_full: city.to_string(),
                date,
                price_to_income,
            })
        })
        .collect()
}

/// Top-`n` least and most affordable metros by PTI in `year`.
pub fn highlight_metros(summary: &[MetroYearSummary], year: i32, n: usize) -> MetroHighlights {
    let ladder = affordability_ladder(summary, year);

    let most_affordable = ladder.iter().take(n).cloned().collect();
    let least_affordable = ladder.iter().rev().take(n).cloned().collect();

    MetroHighlights {
        year,
        least_affordable,
        most_affordable,
    }
}

/// Rows of `year` with a PTI, ascending by PTI.
pub fn affordability_ladder(summary: &[MetroYearSummary], year: i32) -> Vec<MetroYearSummary> {
    let mut rows: Vec<MetroYearSummary> = summary
        .iter()
        .filter(|r| r.year == year && r.price_to_income.is_some())
        .cloned()
        .collect();
    rows.sort_by(|a, b| cmp_opt(a.price_to_income, b.price_to_income));
    rows
}

/// Mean rent-to-income across metros, per year.
pub fn composite_rent_to_income(summary: &[MetroYearSummary]) -> Vec<YearValue> {
    let mut groups: BTreeMap<i32, Mean> = BTreeMap::new();
    for row in summary {
        groups.entry(row.year).or_default().push(row.rent_to_income);
    }
    groups
        .into_iter()
        .filter_map(|(year, m)| m.value().map(|value| YearValue { year, value }))
        .collect()
}

/// Rent-to-income observations of one metro, in input order.
pub fn metro_rent_series(enriched: &[EnrichedObservation], metro: &str) -> Vec<RentPoint> {
    enriched
        .iter()
        .filter(|o| o.city_full == metro)
        .map(|o| RentPoint {
            date: o.date,
            rent_to_income: o.rent_to_income,
        })
        .collect()
}

/// The `n` metros with the highest rent burden in `year`.
pub fn top_rent_burden(summary: &[MetroYearSummary], year: i32, n: usize) -> Vec<MetroYearSummary> {
    let mut rows: Vec<MetroYearSummary> = summary
        .iter()
        .filter(|r| r.year == year && r.rent_to_income.is_some())
        .cloned()
        .collect();
    rows.sort_by(|a, b| cmp_opt(b.rent_to_income, a.rent_to_income));
    rows.truncate(n);
    rows
}

/// Percentage PTI change per metro from `from` to `to`, largest rise first.
///
/// Only metros present in both years with a defined change are returned.
pub fn pti_change(summary: &[MetroYearSummary], from: i32, to: i32) -> Vec<PtiChange> {
    let base: HashMap<&str, f64> = summary
        .iter()
        .filter(|r| r.year == from)
        .filter_map(|r| r.price_to_income.map(|p| (r.city_full.as_str(), p)))
        .collect();

    let mut out: Vec<PtiChange> = summary
        .iter()
        .filter(|r| r.year == to)
        .filter_map(|r| {
            let pti_follow = r.price_to_income?;
            let pti_base = *base.get(r.city_full.as_str())?;
            let pct_change = (pti_follow - pti_base) / pti_base * 100.0;
            pct_change.is_finite().then(|| PtiChange {
                city_full: r.city_full.clone(),
                pti_base,
                pti_follow,
                pct_change,
            })
        })
        .collect();

    out.sort_by(|a, b| b.pct_change.partial_cmp(&a.pct_change).unwrap_or(Ordering::Equal));
    out
}

/// Yearly means of the market-tightness fields across metros.
pub fn market_tightness(summary: &[MetroYearSummary]) -> Vec<MarketTightness> {
    let mut groups: BTreeMap<i32, [Mean; 3]> = BTreeMap::new();
    for row in summary {
        let g = groups.entry(row.year).or_default();
        g[0].push(row.median_dom);
        g[1].push(row.inventory);
        g[2].push(row.sale_to_list);
    }
    groups
        .into_iter()
        .map(|(year, [dom, inventory, stl])| MarketTightness {
            year,
            median_dom: dom.value(),
            inventory: inventory.value(),
            sale_to_list: stl.value(),
        })
        .collect()
}

/// Reindex sparse band counts onto every year × band, filling zeros.
///
/// Years come from the counts themselves; a year with no rated metro at all
/// does not appear.
pub fn dense_band_grid(counts: &[BandCount]) -> Vec<BandGridRow> {
    let mut grid: BTreeMap<i32, [usize; 5]> = BTreeMap::new();
    for c in counts {
        grid.entry(c.year).or_insert([0; 5])[c.affordability_rating.rank()] += c.n_metros;
    }
    grid.into_iter().map(|(year, counts)| BandGridRow { year, counts }).collect()
}

/// Band with the most metros in a grid row (first in band order on ties).
pub fn dominant_band(row: &BandGridRow) -> Option<AffordabilityBand> {
    let mut best: Option<(AffordabilityBand, usize)> = None;
    for band in AffordabilityBand::ALL {
        let n = row.counts[band.rank()];
        if n > 0 && best.is_none_or(|(_, m)| n > m) {
            best = Some((band, n));
        }
    }
    best.map(|(band, _)| band)
}

fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::enriched;
    use crate::analysis::{classify, count_bands, summarize};
    use AffordabilityBand::*;

    fn row(city: &str, year: i32, pti: Option<f64>, rti: Option<f64>) -> MetroYearSummary {
        MetroYearSummary {
            city_full: city.to_string(),
            year,
            price_to_income: pti,
            rent_to_income: rti,
            affordability_rating: classify(pti),
            median_dom: None,
            inventory: None,
            sale_to_list: None,
        }
    }

    fn cities(rows: &[MetroYearSummary]) -> Vec<&str> {
        rows.iter().map(|r| r.city_full.as_str()).collect()
    }

    #[test]
    fn highlights_both_ends() {
        let summary = vec![
            row("A", 2023, Some(3.0), None),
            row("B", 2023, Some(9.0), None),
            row("C", 2023, Some(5.0), None),
            row("D", 2023, None, None),
            row("E", 2022, Some(20.0), None),
        ];
        let h = highlight_metros(&summary, 2023, 2);
        assert_eq!(cities(&h.least_affordable), vec!["B", "C"]);
        assert_eq!(cities(&h.most_affordable), vec!["A", "C"]);
        assert_eq!(h.group_of("B"), MetroGroup::LeastAffordable);
        assert_eq!(h.group_of("A"), MetroGroup::MostAffordable);
        assert_eq!(h.group_of("E"), MetroGroup::Other);
    }

    #[test]
    fn metro_series_averages_duplicate_dates() {
        let rows = vec![
            enriched("A", (2012, 1, 31), Some(2.0), None),
            enriched("A", (2012, 1, 31), Some(4.0), None),
            enriched("A", (2012, 2, 29), None, None),
        ];
        let series = metro_pti_series(&rows);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].price_to_income, 3.0);
    }

    #[test]
    fn rent_views() {
        let summary = vec![
            row("A", 2012, None, Some(0.2)),
            row("B", 2012, None, Some(0.4)),
            row("C", 2012, None, None),
            row("A", 2013, None, Some(0.3)),
        ];
        let comp = composite_rent_to_income(&summary);
        assert_eq!(comp.len(), 2);
        assert!((comp[0].value - 0.3).abs() < 1e-12);
        assert_eq!(comp[1].year, 2013);

        assert_eq!(cities(&top_rent_burden(&summary, 2012, 1)), vec!["B"]);
        assert_eq!(cities(&top_rent_burden(&summary, 2012, 10)), vec!["B", "A"]);
    }

    #[test]
    fn metro_rent_series_filters_by_metro() {
        let rows = vec![
            enriched("A", (2012, 1, 31), None, Some(0.2)),
            enriched("B", (2012, 1, 31), None, Some(0.5)),
            enriched("A", (2012, 2, 29), None, None),
        ];
        let series = metro_rent_series(&rows, "A");
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].rent_to_income, None);
    }

    #[test]
    fn pti_change_inner_joins_and_sorts() {
        let summary = vec![
            row("A", 2019, Some(4.0), None),
            row("A", 2022, Some(5.0), None),
            row("B", 2019, Some(5.0), None),
            row("B", 2022, Some(7.5), None),
            row("C", 2022, Some(9.0), None),
            row("D", 2019, Some(0.0), None),
            row("D", 2022, Some(1.0), None),
        ];
        let change = pti_change(&summary, 2019, 2022);
        let got: Vec<(&str, f64)> = change.iter().map(|c| (c.city_full.as_str(), c.pct_change)).collect();
        assert_eq!(got, vec![("B", 50.0), ("A", 25.0)]);
    }

    #[test]
    fn dense_grid_fills_zeros() {
        let summary = vec![row("A", 2012, Some(2.0), None), row("B", 2013, Some(9.5), None)];
        let grid = dense_band_grid(&count_bands(&summary));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].counts, [1, 0, 0, 0, 0]);
        assert_eq!(grid[1].counts, [0, 0, 0, 0, 1]);
        assert_eq!(dominant_band(&grid[1]), Some(ImpossiblyUnaffordable));
    }

    #[test]
    fn market_tightness_by_year() {
        let rows = vec![
            {
                let mut r = enriched("A", (2012, 1, 31), Some(3.0), None);
                r.median_dom = Some(20.0);
                r
            },
            {
                let mut r = enriched("B", (2012, 1, 31), Some(3.0), None);
                r.median_dom = Some(40.0);
                r.inventory = Some(100.0);
                r
            },
        ];
        let t = market_tightness(&summarize(&rows));
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].median_dom, Some(30.0));
        assert_eq!(t[0].inventory, Some(100.0));
        assert_eq!(t[0].sale_to_list, None);
    }

    #[test]
    fn latest_year_of_empty_is_none() {
        assert_eq!(latest_year(&[]), None);
        assert_eq!(latest_year(&[row("A", 2012, None, Some(0.1)), row("A", 2015, None, Some(0.1))]), Some(2015));
    }
}
