//! Ratatui-based terminal UI.
//!
//! One tab per chapter: a Plotters chart on the left and the chapter text
//! (the same lines `afford report` prints) on the right. Data is loaded
//! through the raw-table cache, so `r` only re-runs the pipeline when the
//! file changed.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tracing::info;

use crate::analysis::insights::{MetroGroup, affordability_ladder, dense_band_grid, highlight_metros, metro_pti_series};
use crate::app::pipeline::{PipelineOutput, run_pipeline};
use crate::domain::{AffordabilityBand, AppConfig};
use crate::error::AppError;
use crate::io::RawTableCache;
use crate::plot::PlotSeries;
use crate::plot::series::{date_to_x, index_series, rent_series};
use crate::report::format::year_end_points;
use crate::report::{Chapter, chapter_lines};

mod plotters_chart;

use plotters_chart::{ChapterPlottersChart, ChartBar, ChartLine, SecondaryLines};

/// Start the TUI.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    // Load before touching the terminal so input errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: AppConfig,
    cache: RawTableCache,
    output: PipelineOutput,
    chapter: Chapter,
    scroll: u16,
    status: String,
}

impl App {
    fn new(config: AppConfig) -> Result<Self, AppError> {
        let cache = RawTableCache::new();
        let loaded = cache.load(&config.data_path)?;
        let output = run_pipeline(&loaded.table)?;
        let status = format!("Loaded {} rows.", loaded.table.len());
        Ok(Self {
            config,
            cache,
            output,
            chapter: Chapter::MacroTrend,
            scroll: 0,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.select(self.chapter.prev()),
            KeyCode::Right | KeyCode::Tab => self.select(self.chapter.next()),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(chapter) = c.to_digit(10).and_then(|d| Chapter::from_number(d as usize)) {
                    self.select(chapter);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_focus_year(1),
            KeyCode::Char('-') => self.step_focus_year(-1),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn select(&mut self, chapter: Chapter) {
        self.chapter = chapter;
        self.scroll = 0;
    }

    fn step_focus_year(&mut self, delta: i32) {
        let years = summary_years(&self.output);
        let current = self.output.focus_year(&self.config);
        match step_year(&years, current, delta) {
            Some(year) => {
                self.config.focus_year = Some(year);
                self.status = format!("Focus year: {year}");
            }
            None => self.status = "No years available.".to_string(),
        }
    }

    fn reload(&mut self) {
        let result = self
            .cache
            .load(&self.config.data_path)
            .and_then(|loaded| {
                let output = run_pipeline(&loaded.table)?;
                Ok((loaded, output))
            });
        match result {
            Ok((loaded, output)) => {
                info!(hit = loaded.hit, rows = loaded.table.len(), "reloaded data");
                self.status = if loaded.hit {
                    "File unchanged (cached).".to_string()
                } else {
                    format!("Reloaded {} rows.", loaded.table.len())
                };
                self.output = output;
            }
            // Keep showing the last good data.
            Err(err) => self.status = format!("Reload failed: {err}"),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let focus = self
            .output
            .focus_year(&self.config)
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(vec![
                Span::styled("afford", Style::default().fg(Color::Cyan)),
                Span::raw(" - housing affordability explorer"),
            ]),
            Line::from(Span::styled(
                format!(
                    "data: {} | rows: {} | metros: {} | focus year: {focus}",
                    self.config.data_path.display(),
                    self.output.enriched.len(),
                    self.output.metro_count(),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = Chapter::ALL
            .iter()
            .map(|c| Line::from(format!("{} {}", c.number(), c.tab_label())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.chapter.index())
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_text(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.chapter.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let data = match chapter_chart(self.chapter, &self.output, &self.config) {
            Ok(data) => data,
            Err(msg) => {
                let p = Paragraph::new(msg)
                    .style(Style::default().fg(Color::Yellow))
                    .wrap(Wrap { trim: true });
                frame.render_widget(p, inner);
                return;
            }
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(inner);

        let (chart_rect, insets) = chart_layout(rows[0], data.secondary.is_some());
        let widget = ChapterPlottersChart {
            lines: &data.lines,
            bars: &data.bars,
            secondary: data.secondary.as_ref().map(|sec| SecondaryLines {
                lines: &sec.lines,
                y_bounds: sec.y_bounds,
            }),
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: data.x_label,
            y_label: data.y_label,
            fmt_x: data.fmt_x,
            fmt_y: data.fmt_y,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, rows[0], chart_rect, insets, &data);
        }

        let mut spans = Vec::new();
        for (label, (r, g, b)) in &data.legend {
            spans.push(Span::styled("■ ", Style::default().fg(Color::Rgb(*r, *g, *b))));
            spans.push(Span::raw(format!("{label}  ")));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), rows[1]);
    }

    fn draw_text(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines: Vec<Line> = chapter_lines(self.chapter, &self.output, &self.config)
            .into_iter()
            .map(Line::from)
            .collect();
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Story").borders(Borders::ALL))
            .scroll((self.scroll, 0));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ or 1-5 chapter  +/- focus year  ↑/↓ scroll  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Everything the chart widget needs for one chapter.
struct ChartData {
    lines: Vec<ChartLine>,
    bars: Vec<ChartBar>,
    legend: Vec<(String, (u8, u8, u8))>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_label: &'static str,
    y_label: &'static str,
    fmt_x: fn(f64) -> String,
    fmt_y: fn(f64) -> String,
    secondary: Option<SecondaryAxis>,
}

/// Lines read off a right-hand axis with their own range.
struct SecondaryAxis {
    lines: Vec<ChartLine>,
    y_bounds: [f64; 2],
    y_label: &'static str,
    fmt_y: fn(f64) -> String,
}

const PRICE_COLOR: (u8, u8, u8) = (255, 99, 71);
const INCOME_COLOR: (u8, u8, u8) = (0, 255, 255);
const COMPOSITE_COLOR: (u8, u8, u8) = (255, 255, 255);
const OTHER_COLOR: (u8, u8, u8) = (90, 90, 90);
const LEAST_COLOR: (u8, u8, u8) = (229, 57, 53);
const MOST_COLOR: (u8, u8, u8) = (67, 160, 71);
const METRO_COLOR: (u8, u8, u8) = (255, 193, 7);

/// Chart data for a chapter, or a message explaining why there is none.
fn chapter_chart(chapter: Chapter, output: &PipelineOutput, config: &AppConfig) -> Result<ChartData, String> {
    match chapter {
        Chapter::MacroTrend => {
            let points = output
                .composite
                .as_ref()
                .map_err(|e| format!("Composite series unavailable: {e}"))?;
            let colors = [PRICE_COLOR, INCOME_COLOR];
            Ok(line_chart(
                index_series(points).into_iter().zip(colors).collect(),
                "year",
                "index",
            ))
        }
        Chapter::MetroDivergence => {
            let year = output.focus_year(config).ok_or("No metro-year summary rows.")?;
            let highlights = highlight_metros(&output.summary, year, config.highlight_n);

            let mut by_metro: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
            for p in metro_pti_series(&output.enriched) {
                by_metro.entry(p.city_full).or_default().push((date_to_x(p.date), p.price_to_income));
            }

            // Grey first so highlighted metros are drawn on top.
            let mut series: Vec<(PlotSeries, (u8, u8, u8))> = Vec::new();
            for group in [MetroGroup::Other, MetroGroup::MostAffordable, MetroGroup::LeastAffordable] {
                let color = match group {
                    MetroGroup::Other => OTHER_COLOR,
                    MetroGroup::MostAffordable => MOST_COLOR,
                    MetroGroup::LeastAffordable => LEAST_COLOR,
                };
                for (city, points) in &by_metro {
                    if highlights.group_of(city) == group {
                        series.push((PlotSeries::new(group.label(config.highlight_n), '.', points.clone()), color));
                    }
                }
            }
            if let Ok(points) = &output.composite {
                let composite = points.iter().map(|p| (date_to_x(p.date), p.composite_pti.unwrap_or(f64::NAN)));
                series.push((PlotSeries::new("U.S. composite PTI", '*', composite.collect()), COMPOSITE_COLOR));
            }
            Ok(line_chart(series, "year", "PTI"))
        }
        Chapter::AffordabilityBands => {
            let grid = dense_band_grid(&output.counts);
            let (first, last) = match (grid.first(), grid.last()) {
                (Some(f), Some(l)) => (f.year, l.year),
                _ => return Err("No rated metro-years.".to_string()),
            };
            let mut bars = Vec::new();
            for row in &grid {
                let mut base = 0.0;
                for band in AffordabilityBand::ALL {
                    let n = row.counts[band.rank()] as f64;
                    if n > 0.0 {
                        let x = row.year as f64;
                        bars.push(ChartBar {
                            x: [x - 0.4, x + 0.4],
                            y: [base, base + n],
                            color: band.rgb(),
                        });
                    }
                    base += n;
                }
            }
            let max_total = grid.iter().map(|r| r.total()).max().unwrap_or(1) as f64;
            let mut legend = band_legend();
            let secondary = us_pti_overlay(output);
            if secondary.is_some() {
                legend.push(("U.S. composite PTI".to_string(), COMPOSITE_COLOR));
            }
            Ok(ChartData {
                lines: Vec::new(),
                bars,
                legend,
                x_bounds: [first as f64 - 0.6, last as f64 + 0.6],
                y_bounds: [0.0, max_total * 1.05],
                x_label: "year",
                y_label: "metros",
                fmt_x: fmt_year,
                fmt_y: fmt_count,
                secondary,
            })
        }
        Chapter::RentBurden => {
            let colors = [COMPOSITE_COLOR, METRO_COLOR];
            let series: Vec<_> = rent_series(output, config).into_iter().zip(colors).collect();
            Ok(line_chart(series, "year", "rent / income"))
        }
        Chapter::Snapshot => {
            let year = output.focus_year(config).ok_or("No metro-year summary rows.")?;
            let mut ladder = affordability_ladder(&output.summary, year);
            if ladder.is_empty() {
                return Err(format!("No metro has a PTI in {year}."));
            }
            ladder.reverse();
            let bars: Vec<ChartBar> = ladder
                .iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    let pti = r.price_to_income?;
                    let color = r.affordability_rating.map_or(OTHER_COLOR, AffordabilityBand::rgb);
                    Some(ChartBar {
                        x: [i as f64 + 0.1, i as f64 + 0.9],
                        y: [0.0, pti],
                        color,
                    })
                })
                .collect();
            let max = bars.iter().map(|b| b.y[1]).fold(0.0_f64, f64::max);
            Ok(ChartData {
                lines: Vec::new(),
                bars,
                legend: band_legend(),
                x_bounds: [0.0, ladder.len() as f64],
                y_bounds: [0.0, (max * 1.05).max(1.0)],
                x_label: "metro rank",
                y_label: "PTI",
                fmt_x: fmt_rank,
                fmt_y: fmt_ratio,
                secondary: None,
            })
        }
    }
}

fn line_chart(series: Vec<(PlotSeries, (u8, u8, u8))>, x_label: &'static str, y_label: &'static str) -> ChartData {
    let mut legend: Vec<(String, (u8, u8, u8))> = Vec::new();
    for (s, color) in &series {
        if !legend.iter().any(|(l, _)| *l == s.label) {
            legend.push((s.label.clone(), *color));
        }
    }

    let points = || series.iter().flat_map(|(s, _)| s.points.iter()).filter(|(x, y)| x.is_finite() && y.is_finite());
    let x_bounds = padded_bounds(points().map(|p| p.0), 0.0);
    let y_bounds = padded_bounds(points().map(|p| p.1), 0.05);

    let lines = series
        .into_iter()
        .map(|(s, color)| ChartLine {
            label: s.label,
            points: s.points,
            color,
        })
        .collect();

    ChartData {
        lines,
        bars: Vec::new(),
        legend,
        x_bounds,
        y_bounds,
        x_label,
        y_label,
        fmt_x: fmt_year,
        fmt_y: fmt_ratio,
        secondary: None,
    }
}

/// Year-end U.S. composite PTI at each bar's year, on its own scale.
fn us_pti_overlay(output: &PipelineOutput) -> Option<SecondaryAxis> {
    let points: Vec<(f64, f64)> = year_end_points(output.composite.as_ref().ok()?)
        .into_iter()
        .map(|p| (p.year as f64, p.composite_pti.unwrap_or(f64::NAN)))
        .collect();
    if !points.iter().any(|(_, y)| y.is_finite()) {
        return None;
    }
    let y_bounds = padded_bounds(points.iter().map(|p| p.1).filter(|y| y.is_finite()), 0.1);
    Some(SecondaryAxis {
        lines: vec![ChartLine {
            label: "U.S. composite PTI".to_string(),
            points,
            color: COMPOSITE_COLOR,
        }],
        y_bounds,
        y_label: "US PTI",
        fmt_y: fmt_ratio,
    })
}

fn padded_bounds(values: impl Iterator<Item = f64>, frac: f64) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 0.5, hi + 0.5];
    }
    let pad = ((hi - lo) * frac).max(1e-12);
    [lo - pad, hi + pad]
}

fn band_legend() -> Vec<(String, (u8, u8, u8))> {
    AffordabilityBand::ALL
        .iter()
        .map(|b| (b.display_name().to_string(), b.rgb()))
        .collect()
}

fn summary_years(output: &PipelineOutput) -> Vec<i32> {
    let mut years: Vec<i32> = output.summary.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Move `delta` steps through the available years, clamping at the ends.
fn step_year(years: &[i32], current: Option<i32>, delta: i32) -> Option<i32> {
    let last = years.len().checked_sub(1)?;
    let pos = match current.map(|c| years.binary_search(&c)) {
        Some(Ok(i)) => i as i64,
        // Between two years: stepping down lands on the lower one.
        Some(Err(i)) if delta < 0 => i as i64,
        Some(Err(i)) => i as i64 - 1,
        None => last as i64,
    };
    let next = (pos + delta as i64).clamp(0, last as i64) as usize;
    years.get(next).copied()
}

fn fmt_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_ratio(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_count(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_rank(v: f64) -> String {
    format!("#{:.0}", v + 1.0)
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect, right_axis: bool) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: if right_axis { 8 } else { 2 },
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets, data: &ChartData) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let (x_bounds, y_bounds) = (data.x_bounds, data.y_bounds);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = (data.fmt_x)(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = (data.fmt_y)(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(data.x_label)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(data.y_label)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);

    let Some(sec) = &data.secondary else {
        return;
    };
    let right = chart.x + chart.width + 1;
    let width = (inner.x + inner.width).saturating_sub(right);
    if width == 0 {
        return;
    }
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = sec.y_bounds[0] + u * (sec.y_bounds[1] - sec.y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        frame.render_widget(
            Paragraph::new((sec.fmt_y)(y_val)).style(style),
            Rect {
                x: right,
                y,
                width,
                height: 1,
            },
        );
    }
    let sec_label = Paragraph::new(sec.y_label)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    frame.render_widget(
        sec_label,
        Rect {
            x: right,
            y: inner.y,
            width,
            height: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::enriched;
    use crate::analysis::{count_bands, summarize};
    use crate::domain::CompositePoint;
    use crate::error::PipelineError;

    fn output() -> PipelineOutput {
        let enriched = vec![
            enriched("A", (2012, 1, 31), Some(2.5), Some(0.2)),
            enriched("B", (2012, 1, 31), Some(9.5), Some(0.3)),
            enriched("A", (2014, 1, 31), Some(3.5), Some(0.2)),
            enriched("B", (2014, 1, 31), Some(4.5), Some(0.3)),
            enriched("C", (2014, 1, 31), Some(6.0), None),
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
    fn step_year_clamps_and_snaps() {
        let years = [2012, 2014, 2016];
        assert_eq!(step_year(&years, Some(2014), 1), Some(2016));
        assert_eq!(step_year(&years, Some(2016), 1), Some(2016));
        assert_eq!(step_year(&years, Some(2012), -1), Some(2012));
        assert_eq!(step_year(&years, None, -1), Some(2014));
        assert_eq!(step_year(&years, Some(2013), 1), Some(2014));
        assert_eq!(step_year(&years, Some(2013), -1), Some(2012));
        assert_eq!(step_year(&years, Some(2030), -1), Some(2016));
        assert_eq!(step_year(&[], Some(2012), 1), None);
    }

    #[test]
    fn macro_chapter_reports_composite_failure() {
        let err = chapter_chart(Chapter::MacroTrend, &output(), &config()).err().unwrap();
        assert_eq!(err, "Composite series unavailable: invalid index base: empty input");
    }

    #[test]
    fn band_bars_stack_per_year() {
        let data = chapter_chart(Chapter::AffordabilityBands, &output(), &config()).ok().unwrap();
        // 2012: Affordable + Impossibly; 2014: Moderately + Seriously + Severely.
        assert_eq!(data.bars.len(), 5);
        let y2014: Vec<[f64; 2]> = data.bars.iter().filter(|b| b.x[0] > 2013.0).map(|b| b.y).collect();
        assert_eq!(y2014, vec![[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]);
        assert_eq!(data.y_bounds, [0.0, 3.0 * 1.05]);
    }

    #[test]
    fn band_chart_overlays_us_pti_when_composite_is_available() {
        let mut out = output();
        assert!(chapter_chart(Chapter::AffordabilityBands, &out, &config()).ok().unwrap().secondary.is_none());

        let point = |(y, m, d): (i32, u32, u32), pti: f64| CompositePoint {
            date: chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            composite_price: None,
            composite_income: None,
            composite_pti: Some(pti),
            price_index: None,
            income_index: None,
            year: y,
            affordability_rating: None,
        };
        out.composite = Ok(vec![
            point((2012, 1, 31), 4.0),
            point((2012, 12, 31), 4.5),
            point((2014, 12, 31), 5.5),
        ]);

        let data = chapter_chart(Chapter::AffordabilityBands, &out, &config()).ok().unwrap();
        let sec = data.secondary.unwrap();
        assert_eq!(sec.lines.len(), 1);
        assert_eq!(sec.lines[0].points, vec![(2012.0, 4.5), (2014.0, 5.5)]);
        assert!((sec.y_bounds[0] - 4.4).abs() < 1e-9 && (sec.y_bounds[1] - 5.6).abs() < 1e-9);
        assert!(data.legend.iter().any(|(l, c)| l == "U.S. composite PTI" && *c == COMPOSITE_COLOR));
    }

    #[test]
    fn snapshot_bars_are_least_affordable_first() {
        let data = chapter_chart(Chapter::Snapshot, &output(), &config()).ok().unwrap();
        let heights: Vec<f64> = data.bars.iter().map(|b| b.y[1]).collect();
        assert_eq!(heights, vec![6.0, 4.5, 3.5]);
        assert_eq!(data.bars[0].color, AffordabilityBand::SeverelyUnaffordable.rgb());
    }

    #[test]
    fn divergence_draws_every_metro_once() {
        let data = chapter_chart(Chapter::MetroDivergence, &output(), &config()).ok().unwrap();
        assert_eq!(data.lines.len(), 3);
        assert_eq!(data.lines.last().unwrap().color, LEAST_COLOR);
        let labels: Vec<&str> = data.legend.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Other", "Bottom 1 (Most Affordable)", "Top 1 (Least Affordable)"]);
    }

    #[test]
    fn padded_bounds_handle_degenerate_input() {
        assert_eq!(padded_bounds(std::iter::empty(), 0.05), [0.0, 1.0]);
        assert_eq!(padded_bounds([2.0, 2.0].into_iter(), 0.05), [1.5, 2.5]);
    }
}
