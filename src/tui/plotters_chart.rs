//! Plotters-powered chapter chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - filled rectangles for the band and snapshot bar charts
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A polyline; non-finite `y` values split it into segments.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub color: (u8, u8, u8),
}

/// A filled rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBar {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub color: (u8, u8, u8),
}

/// Lines plotted against their own y range, drawn on a right-hand scale.
#[derive(Debug, Clone, Copy)]
pub struct SecondaryLines<'a> {
    pub lines: &'a [ChartLine],
    pub y_bounds: [f64; 2],
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct ChapterPlottersChart<'a> {
    pub lines: &'a [ChartLine],
    pub bars: &'a [ChartBar],
    pub secondary: Option<SecondaryLines<'a>>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for ChapterPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        // Secondary lines share the primary coordinates once rescaled.
        let rescaled: Vec<ChartLine> = self
            .secondary
            .map(|sec| {
                sec.lines
                    .iter()
                    .map(|line| ChartLine {
                        label: line.label.clone(),
                        points: line
                            .points
                            .iter()
                            .map(|&(x, y)| (x, rescale(y, sec.y_bounds, self.y_bounds)))
                            .collect(),
                        color: line.color,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are noise at terminal resolution; axes + labels suffice.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart.draw_series(self.bars.iter().map(|b| {
                let (r, g, bl) = b.color;
                Rectangle::new([(b.x[0], b.y[0]), (b.x[1], b.y[1])], RGBColor(r, g, bl).filled())
            }))?;

            for line in self.lines.iter().chain(rescaled.iter()) {
                let (r, g, b) = line.color;
                let color = RGBColor(r, g, b);
                for segment in finite_segments(&line.points) {
                    if segment.len() == 1 {
                        chart.draw_series(segment.iter().map(|&p| Pixel::new(p, color)))?;
                    } else {
                        chart.draw_series(LineSeries::new(segment.iter().copied(), &color))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Map `v` linearly from the `from` range onto the `to` range.
///
/// A degenerate `from` range maps everything to the middle of `to`.
pub fn rescale(v: f64, from: [f64; 2], to: [f64; 2]) -> f64 {
    let span = from[1] - from[0];
    if span == 0.0 || !span.is_finite() {
        return (to[0] + to[1]) / 2.0;
    }
    to[0] + (v - from[0]) / span * (to[1] - to[0])
}

/// Runs of consecutive finite points.
pub fn finite_segments(points: &[(f64, f64)]) -> Vec<&[(f64, f64)]> {
    points
        .split(|(x, y)| !x.is_finite() || !y.is_finite())
        .filter(|s| !s.is_empty())
        .collect()
}
