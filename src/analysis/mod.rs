//! The affordability pipeline.
//!
//! Data flows one way:
//!
//! ```text
//! RawTable ──derive──▶ enriched ──┬──composite──▶ composite series
//!                                 └──summarize──▶ metro-year summary ──count_bands──▶ band counts
//! ```
//!
//! Every stage borrows its input and returns a new table. Grouped aggregates are
//! explicit `BTreeMap` groupings, so output order is the sorted group key.

pub mod classify;
pub mod composite;
pub mod counts;
pub mod derive;
pub mod insights;
pub mod summary;

pub use classify::classify;
pub use composite::composite;
pub use counts::count_bands;
pub use derive::{REQUIRED_COLUMNS, derive};
pub use summary::summarize;

/// Running mean that skips nulls.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub(crate) fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when every pushed value was null.
    pub(crate) fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Datelike, NaiveDate};

    use crate::domain::EnrichedObservation;

    /// Build an enriched row with only the fields the aggregators read.
    pub(crate) fn enriched(city: &str, date: (i32, u32, u32), pti: Option<f64>, rti: Option<f64>) -> EnrichedObservation {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        EnrichedObservation {
            city_full: city.to_string(),
            date,
            year: date.year(),
            median_sale_price: None,
            median_rent: None,
            per_capita_income: None,
            inventory: None,
            median_dom: None,
            avg_sale_to_list: None,
            household_income_estimate: None,
            price_to_income: pti,
            rent_to_income: rti,
            price_to_rent: None,
            affordability_rating: super::classify(pti),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_nulls() {
        let mut m = Mean::default();
        assert_eq!(m.value(), None);
        m.push(None);
        assert_eq!(m.value(), None);
        m.push(Some(2.0));
        m.push(None);
        m.push(Some(4.0));
        assert_eq!(m.value(), Some(3.0));
    }
}
