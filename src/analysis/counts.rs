//! Number of metros per affordability band per year.

use std::collections::BTreeMap;

use crate::domain::{AffordabilityBand, BandCount, MetroYearSummary};

/// Count summary rows by (year, band).
///
/// Unrated rows are skipped. The result is sparse: a band with no metros in a
/// year has no row. Ordered by year, then band order.
pub fn count_bands(summary: &[MetroYearSummary]) -> Vec<BandCount> {
    let mut counts: BTreeMap<(i32, AffordabilityBand), usize> = BTreeMap::new();
    for row in summary {
        if let Some(band) = row.affordability_rating {
            *counts.entry((row.year, band)).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|((year, affordability_rating), n_metros)| BandCount {
            year,
            affordability_rating,
            n_metros,
        })
        .collect()
}
