//! Chart data and ASCII rendering.
//!
//! `series` turns pipeline tables into x/y polylines (x is a fractional
//! year); `ascii` draws them on a character grid. The TUI reuses `series`.

pub mod ascii;
pub mod series;

pub use ascii::render_line_plot;
pub use series::{chart_series, date_to_x, render_chart};

/// One named polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub glyph: char,
    /// `(x, y)`; a non-finite `y` marks a gap.
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    pub fn new(label: impl Into<String>, glyph: char, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            glyph,
            points,
        }
    }
}
