//! Metro-year summary: one row per (metro, year).

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::{Mean, classify};
use crate::domain::{EnrichedObservation, MetroYearSummary};

#[derive(Debug, Default)]
struct MetroYearGroup {
    pti: Mean,
    rti: Mean,
    dom: Mean,
    inventory: Mean,
    sale_to_list: Mean,
}

/// Average each metro's ratios within a calendar year and classify the mean PTI.
///
/// The rating is a fresh classification of the yearly mean. Groups where both
/// PTI and RTI are entirely null produce no row. Rows are ordered by metro, then year.
pub fn summarize(enriched: &[EnrichedObservation]) -> Vec<MetroYearSummary> {
    let mut groups: BTreeMap<(&str, i32), MetroYearGroup> = BTreeMap::new();
    for obs in enriched {
        let g = groups.entry((obs.city_full.as_str(), obs.year)).or_default();
        g.pti.push(obs.price_to_income);
        g.rti.push(obs.rent_to_income);
        g.dom.push(obs.median_dom);
        g.inventory.push(obs.inventory);
        g.sale_to_list.push(obs.avg_sale_to_list);
    }

    let out: Vec<MetroYearSummary> = groups
        .into_iter()
        .filter_map(|((city, year), g)| {
            let price_to_income = g.pti.value();
            let rent_to_income = g.rti.value();
            if price_to_income.is_none() && rent_to_income.is_none() {
                return None;
            }
            Some(MetroYearSummary {
                city_full: city.to_string(),
                year,
                price_to_income,
                rent_to_income,
                affordability_rating: classify(price_to_income),
                median_dom: g.dom.value(),
                inventory: g.inventory.value(),
                sale_to_list: g.sale_to_list.value(),
            })
        })
        .collect();

    debug!(rows = out.len(), "summarized metro-years");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::enriched;
    use crate::domain::AffordabilityBand;

    #[test]
    fn rates_the_yearly_mean_not_the_rows() {
        // 2.9 and 3.3 are one Affordable and one Moderately row; the mean 3.1 is Moderately.
        let rows = vec![
            enriched("A", (2012, 1, 31), Some(2.9), Some(0.2)),
            enriched("A", (2012, 7, 31), Some(3.3), Some(0.4)),
        ];
        let s = summarize(&rows);
        assert_eq!(s.len(), 1);
        assert!((s[0].price_to_income.unwrap() - 3.1).abs() < 1e-9);
        assert!((s[0].rent_to_income.unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(s[0].affordability_rating, Some(AffordabilityBand::ModeratelyUnaffordable));
    }

    #[test]
    fn row_count_matches_non_null_metro_years() {
        let rows = vec![
            enriched("B", (2013, 1, 31), Some(5.0), None),
            enriched("A", (2012, 1, 31), None, Some(0.3)),
            enriched("A", (2012, 2, 28), Some(4.0), None),
            enriched("A", (2013, 1, 31), None, None),
            enriched("C", (2012, 1, 31), None, None),
        ];
        let s = summarize(&rows);

        let keys: Vec<(&str, i32)> = s.iter().map(|r| (r.city_full.as_str(), r.year)).collect();
        assert_eq!(keys, vec![("A", 2012), ("B", 2013)]);
        assert_eq!(s[1].rent_to_income, None);
        assert_eq!(s[1].affordability_rating, Some(AffordabilityBand::SeriouslyUnaffordable));
    }

    #[test]
    fn null_pti_group_keeps_row_without_rating() {
        let s = summarize(&[enriched("A", (2012, 1, 31), None, Some(0.25))]);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].price_to_income, None);
        assert_eq!(s[0].affordability_rating, None);
    }

    #[test]
    fn averages_market_tightness_fields() {
        let mut a = enriched("A", (2012, 1, 31), Some(3.0), None);
        a.median_dom = Some(30.0);
        let mut b = enriched("A", (2012, 2, 28), Some(3.0), None);
        b.median_dom = Some(50.0);
        b.avg_sale_to_list = Some(0.98);

        let s = summarize(&[a, b]);
        assert_eq!(s[0].median_dom, Some(40.0));
        assert_eq!(s[0].sale_to_list, Some(0.98));
        assert_eq!(s[0].inventory, None);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(summarize(&[]).is_empty());
    }
}
