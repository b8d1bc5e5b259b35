//! Composite (simple cross-metro average) series, indexed to the first year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::analysis::{Mean, classify};
use crate::domain::{CompositePoint, EnrichedObservation};
use crate::error::PipelineError;

#[derive(Debug, Default)]
struct DateGroup {
    price: Mean,
    income: Mean,
    pti: Mean,
}

/// Average price, household income and PTI across metros at each date, then
/// rescale price and income so the base row equals 100.
///
/// The base row is the first composite row (ascending date) of the earliest
/// year. It is a single date, not a yearly average.
pub fn composite(enriched: &[EnrichedObservation]) -> Result<Vec<CompositePoint>, PipelineError> {
    let mut groups: BTreeMap<NaiveDate, DateGroup> = BTreeMap::new();
    for obs in enriched {
        let g = groups.entry(obs.date).or_default();
        g.price.push(obs.median_sale_price);
        g.income.push(obs.household_income_estimate);
        g.pti.push(obs.price_to_income);
    }

    let mut rows: Vec<CompositePoint> = groups
        .into_iter()
        .map(|(date, g)| {
            let composite_pti = g.pti.value();
            CompositePoint {
                date,
                composite_price: g.price.value(),
                composite_income: g.income.value(),
                composite_pti,
                price_index: None,
                income_index: None,
                year: date.year(),
                affordability_rating: classify(composite_pti),
            }
        })
        .collect();

    let first_year = rows
        .iter()
        .map(|r| r.year)
        .min()
        .ok_or_else(|| PipelineError::invalid_base("no observations to build a composite from"))?;
    let base = rows
        .iter()
        .find(|r| r.year == first_year)
        .ok_or_else(|| PipelineError::invalid_base(format!("no composite row in {first_year}")))?;

    let base_date = base.date;
    let base_price = usable_base(base.composite_price)
        .ok_or_else(|| PipelineError::invalid_base(format!("composite price on {base_date} is zero or missing")))?;
    let base_income = usable_base(base.composite_income)
        .ok_or_else(|| PipelineError::invalid_base(format!("composite income on {base_date} is zero or missing")))?;

    for row in &mut rows {
        row.price_index = index(row.composite_price, base_price);
        row.income_index = index(row.composite_income, base_income);
    }

    debug!(points = rows.len(), %base_date, "built composite series");
    Ok(rows)
}

fn usable_base(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0 && v.is_finite())
}

fn index(value: Option<f64>, base: f64) -> Option<f64> {
    value.map(|v| v / base * 100.0)
}
