//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a polyline with its own glyph. Series are drawn in
//! order and never overwrite cells already taken, so the first series wins
//! where lines cross.

use crate::plot::PlotSeries;

/// Render series on a shared grid, with a header and a legend.
pub fn render_line_plot(title: &str, series: &[PlotSeries], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = axis_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = axis_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for s in series {
        draw_series(&mut grid, &s.points, s.glyph, (x_min, x_max), (y_min, y_max));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {title} | x=[{x_min:.2}, {x_max:.2}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    for s in series {
        out.push_str(&format!("  {} {}\n", s.glyph, s.label));
    }
    out
}

fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        // A single value still gets a visible span.
        Some((min - 0.5, max + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], points: &[(f64, f64)], glyph: char, x: (f64, f64), y: (f64, f64)) {
    let height = grid.len();
    let Some(width) = grid.first().map(Vec::len) else {
        return;
    };

    let mut prev = None;
    for &(px, py) in points {
        if !px.is_finite() || !py.is_finite() {
            // Gap in the series: restart the polyline.
            prev = None;
            continue;
        }
        let cx = map_x(px, x.0, x.1, width);
        let cy = map_y(py, y.0, y.1, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, cx, cy, glyph),
            None => {
                if grid[cy][cx] == ' ' {
                    grid[cy][cx] = glyph;
                }
            }
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plot_golden_snapshot_small() {
        let series = vec![
            PlotSeries::new("Home price index", '#', vec![(2012.0, 100.0), (2013.0, 110.0)]),
            PlotSeries::new("Household income index", '+', vec![(2012.0, 100.0), (2013.0, 100.0)]),
        ];

        let txt = render_line_plot("index", &series, 10, 5);
        let expected = concat!(
            "Plot: index | x=[2012.00, 2013.00] | y=[99.50, 110.50]\n",
            "        ##\n",
            "      ##\n",
            "    ##\n",
            "  ##\n",
            "##++++++++\n",
            "  # Home price index\n",
            "  + Household income index\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn gaps_restart_the_line() {
        let series = vec![PlotSeries::new(
            "gappy",
            'o',
            vec![(0.0, 0.0), (1.0, f64::NAN), (2.0, 0.0)],
        )];
        let txt = render_line_plot("gaps", &series, 10, 5);
        let middle = txt.lines().nth(3).unwrap();
        assert_eq!(middle, "o        o");
    }

    #[test]
    fn empty_series_renders_blank_grid() {
        let txt = render_line_plot("empty", &[], 10, 5);
        assert!(txt.starts_with("Plot: empty | x=[0.00, 1.00]"));
        assert_eq!(txt.lines().count(), 6);
    }
}
