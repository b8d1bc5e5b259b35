//! Shared pipeline logic used by the CLI report, table dumps and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw table -> derive -> {composite, summary -> band counts}
//!
//! The front-ends can then focus on presentation (printing vs widgets).

use tracing::{debug, warn};

use crate::analysis::insights::latest_year;
use crate::analysis::{composite, count_bands, derive, summarize};
use crate::domain::{AppConfig, BandCount, CompositePoint, EnrichedObservation, MetroYearSummary, RawTable};
use crate::error::PipelineError;

/// All computed tables of one pipeline run.
///
/// The composite series can fail on its own (bad index base); the summary and
/// band counts are still available in that case.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub enriched: Vec<EnrichedObservation>,
    pub composite: Result<Vec<CompositePoint>, PipelineError>,
    pub summary: Vec<MetroYearSummary>,
    pub counts: Vec<BandCount>,
}

impl PipelineOutput {
    pub fn latest_year(&self) -> Option<i32> {
        latest_year(&self.summary)
    }

    /// The configured focus year, or the latest year in the summary.
    pub fn focus_year(&self, config: &AppConfig) -> Option<i32> {
        config.focus_year.or_else(|| self.latest_year())
    }

    /// Distinct metros in the enriched table.
    pub fn metro_count(&self) -> usize {
        let mut metros: Vec<&str> = self.enriched.iter().map(|o| o.city_full.as_str()).collect();
        metros.sort_unstable();
        metros.dedup();
        metros.len()
    }
}

/// Execute the full pipeline over a raw table.
///
/// Derivation errors abort the run; a composite failure is captured in the
/// output so independent tables still render.
pub fn run_pipeline(raw: &RawTable) -> Result<PipelineOutput, PipelineError> {
    // 1) Enrich raw rows.
    let enriched = derive(raw)?;

    // 2) National composite (may fail independently).
    let composite = composite(&enriched);
    if let Err(err) = &composite {
        warn!(error = %err, "composite series unavailable");
    }

    // 3) Metro-year summary and band counts.
    let summary = summarize(&enriched);
    let counts = count_bands(&summary);

    debug!(
        enriched = enriched.len(),
        summary = summary.len(),
        counts = counts.len(),
        "pipeline finished"
    );

    Ok(PipelineOutput {
        enriched,
        composite,
        summary,
        counts,
    })
}
