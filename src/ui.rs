use std::collections::{BTreeMap, HashMap};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, List,
        ListItem, ListState, Paragraph, Wrap,
    },
    Frame,
};

use crate::{
    app::{App, DisplayMode, Focus},
    map_draw::{ramp, MapView},
    plot::PlotSpec,
    render::{RenderDispatcher, Surface},
    state::{DashboardError, NO_DATA_MESSAGE},
};

const SERIES_COLOURS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceContent {
    Plot(PlotSpec),
    Message(String),
}

/// Keeps the latest content of every surface; [`draw`] paints them.
#[derive(Default)]
pub struct TerminalDispatcher {
    surfaces: BTreeMap<Surface, SurfaceContent>,
    map: Option<MapView>,
}

impl TerminalDispatcher {
    pub fn new(map: Option<MapView>) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            map,
        }
    }

    pub fn content(&self, surface: Surface) -> Option<&SurfaceContent> {
        self.surfaces.get(&surface)
    }
}

impl RenderDispatcher for TerminalDispatcher {
    fn render(&mut self, surface: Surface, spec: &PlotSpec) {
        self.surfaces
            .insert(surface, SurfaceContent::Plot(spec.clone()));
    }

    fn show_message(&mut self, surface: Surface, message: &str) {
        self.surfaces
            .insert(surface, SurfaceContent::Message(message.to_string()));
    }
}

impl DisplayMode {
    fn base(self) -> Style {
        match self {
            DisplayMode::Dark => Style::default().fg(Color::White).bg(Color::Black),
            DisplayMode::Light => Style::default().fg(Color::Black).bg(Color::White),
        }
    }

    fn accent(self) -> Color {
        match self {
            DisplayMode::Dark => Color::Red,
            DisplayMode::Light => Color::Blue,
        }
    }
}

fn block(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title.to_string())
}

/// Frame shown while the yearly files are being read.
pub fn draw_loading(f: &mut Frame, message: &str) {
    let p = Paragraph::new(message.to_string())
        .block(block("Happiness Atlas"))
        .wrap(Wrap { trim: true });
    f.render_widget(p, f.area());
}

/// Screen shown instead of the dashboard when nothing could be loaded.
pub fn draw_no_data(f: &mut Frame, err: &DashboardError) {
    let source = match err {
        DashboardError::Data { source } => source.to_string(),
        other => other.to_string(),
    };
    draw_loading(f, &format!("{}\n\n{}\n\nq quit", NO_DATA_MESSAGE, source));
}

/// Whole dashboard: controls on the left, map with trend and correlation
/// below it in the middle, ranking on the right.
pub fn draw(f: &mut Frame, app: &App) {
    let mode = app.mode;
    f.render_widget(Block::default().style(mode.base()), f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(55),
            Constraint::Percentage(25),
        ])
        .split(f.area());

    draw_controls(f, chunks[0], app);

    let center = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(center[1]);

    let dispatcher = app.dashboard.dispatcher();
    let selected = app.dashboard.filter().selected_countries();
    for (surface, area) in [
        (Surface::Choropleth, center[0]),
        (Surface::Trend, bottom[0]),
        (Surface::Correlation, bottom[1]),
        (Surface::Ranking, chunks[2]),
    ] {
        match dispatcher.content(surface) {
            Some(SurfaceContent::Plot(spec)) => match surface {
                Surface::Trend => draw_lines(f, area, spec),
                Surface::Choropleth => {
                    draw_choropleth(f, area, spec, dispatcher.map.as_ref(), selected)
                }
                Surface::Ranking => draw_ranking(f, area, spec, mode),
                Surface::Correlation => draw_scatter(f, area, spec),
            },
            Some(SurfaceContent::Message(msg)) => {
                f.render_widget(Paragraph::new(msg.clone()).block(block(surface.id())), area)
            }
            None => f.render_widget(block(surface.id()), area),
        }
    }
}

/// Search box, country picker and key help.
fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(9),
        ])
        .split(area);
    let accent = app.mode.accent();

    let search_style = if app.focus == Focus::Search {
        Style::default().fg(accent)
    } else {
        Style::default()
    };
    let search = Paragraph::new(app.search.clone())
        .style(search_style)
        .block(block("Search (/)"));
    f.render_widget(search, rows[0]);

    let chosen = app.dashboard.filter().selected_countries();
    let visible = app.visible_countries();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|c| {
            let mark = if chosen.contains(c) { "[x] " } else { "[ ] " };
            ListItem::new(format!("{}{}", mark, c))
        })
        .collect();
    let mut list_state = ListState::default();
    if !visible.is_empty() {
        list_state.select(Some(app.selected));
    }
    let list = List::new(items)
        .block(block(&format!("Countries ({}/5)", chosen.len())))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(accent));
    f.render_stateful_widget(list, rows[1], &mut list_state);

    let info = format!(
        "Year: {}\n{}\n\n←/→ year  / search\n↑/↓ move  space pick\nc clear  t mode  q quit",
        app.dashboard.filter().selected_year(),
        app.status
    );
    let info = Paragraph::new(info)
        .block(block("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, rows[2]);
}

fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(0.1);
    [lo - pad, hi + pad]
}

fn axis_labels(b: [f64; 2], decimals: usize) -> Vec<String> {
    let mid = (b[0] + b[1]) / 2.0;
    [b[0], mid, b[1]]
        .iter()
        .map(|v| format!("{:.*}", decimals, v))
        .collect()
}

/// Splits a series at missing values so no gap is bridged.
fn segments(x: &[f64], y: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = vec![Vec::new()];
    for (x, y) in x.iter().zip(y.iter()) {
        match y {
            Some(y) => {
                if let Some(seg) = out.last_mut() {
                    seg.push((*x, *y));
                }
            }
            None => out.push(Vec::new()),
        }
    }
    out.retain(|s| !s.is_empty());
    out
}

/// Line chart of every line trace, one colour per series.
fn draw_lines(f: &mut Frame, area: Rect, spec: &PlotSpec) {
    let series: Vec<(String, Color, Vec<Vec<(f64, f64)>>)> = spec
        .line_traces()
        .enumerate()
        .map(|(i, t)| {
            (
                t.name.clone(),
                SERIES_COLOURS[i % SERIES_COLOURS.len()],
                segments(&t.x, &t.y),
            )
        })
        .collect();

    let mut datasets = Vec::new();
    for (name, colour, segs) in &series {
        for (i, seg) in segs.iter().enumerate() {
            let mut ds = Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*colour))
                .data(seg);
            if i == 0 {
                ds = ds.name(name.clone());
            }
            datasets.push(ds);
        }
    }

    let all = || series.iter().flat_map(|(_, _, s)| s.iter().flatten());
    let xb = bounds(all().map(|p| p.0));
    let yb = bounds(all().map(|p| p.1));
    let chart = Chart::new(datasets)
        .block(block(&spec.layout.title))
        .x_axis(
            Axis::default()
                .title(spec.layout.x_title.clone().unwrap_or_default())
                .bounds(xb)
                .labels(axis_labels(xb, 0)),
        )
        .y_axis(
            Axis::default()
                .title(spec.layout.y_title.clone().unwrap_or_default())
                .bounds(yb)
                .labels(axis_labels(yb, 1)),
        );
    f.render_widget(chart, area);
}

/// Bubble chart without bubble sizes, plus the fitted line.
fn draw_scatter(f: &mut Frame, area: Rect, spec: &PlotSpec) {
    // Freedom buckets stand in for the colour scale.
    let mut buckets: [Vec<(f64, f64)>; 4] = Default::default();
    for s in spec.scatter_traces() {
        for ((x, y), colour) in s.x.iter().zip(s.y.iter()).zip(s.marker_color.iter()) {
            let idx = match colour {
                Some(c) if *c >= 0.5 => 2,
                Some(c) if *c >= 0.3 => 1,
                Some(_) => 0,
                None => 3,
            };
            buckets[idx].push((*x, *y));
        }
    }
    let overlays: Vec<(String, Vec<(f64, f64)>)> = spec
        .line_traces()
        .map(|t| {
            let pts = t
                .x
                .iter()
                .zip(t.y.iter())
                .filter_map(|(x, y)| y.map(|y| (*x, y)))
                .collect();
            (t.name.clone(), pts)
        })
        .collect();

    let names = ["freedom < 0.3", "freedom < 0.5", "freedom ≥ 0.5", "freedom n/a"];
    let colours = [ramp(0.0), ramp(0.5), ramp(1.0), Color::DarkGray];
    let mut datasets: Vec<Dataset> = buckets
        .iter()
        .zip(names.iter().zip(colours.iter()))
        .filter(|(b, _)| !b.is_empty())
        .map(|(b, (name, colour))| {
            Dataset::default()
                .name(name.to_string())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(*colour))
                .data(b)
        })
        .collect();
    for (name, pts) in &overlays {
        datasets.push(
            Dataset::default()
                .name(name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(pts),
        );
    }

    let xb = bounds(buckets.iter().flatten().map(|p| p.0));
    let yb = bounds(buckets.iter().flatten().map(|p| p.1));
    let chart = Chart::new(datasets)
        .block(block(&spec.layout.title))
        .x_axis(
            Axis::default()
                .title(spec.layout.x_title.clone().unwrap_or_default())
                .bounds(xb)
                .labels(axis_labels(xb, 2)),
        )
        .y_axis(
            Axis::default()
                .title(spec.layout.y_title.clone().unwrap_or_default())
                .bounds(yb)
                .labels(axis_labels(yb, 1)),
        );
    f.render_widget(chart, area);
}

/// One horizontal bar per country; the bar length is the sum of the
/// factors and the text lists each of them.
fn draw_ranking(f: &mut Frame, area: Rect, spec: &PlotSpec, mode: DisplayMode) {
    let traces: Vec<_> = spec.bar_traces().collect();
    let countries = traces.first().map(|t| t.x.clone()).unwrap_or_default();

    let bars: Vec<Bar> = countries
        .iter()
        .enumerate()
        .map(|(i, country)| {
            let parts: Vec<(char, f64)> = traces
                .iter()
                .filter_map(|t| {
                    let initial = t.name.chars().next().unwrap_or('?');
                    t.y.get(i).copied().flatten().map(|v| (initial, v))
                })
                .collect();
            let total: f64 = parts.iter().map(|(_, v)| v).sum();
            let text = parts
                .iter()
                .map(|(c, v)| format!("{}{:.2}", c, v))
                .collect::<Vec<_>>()
                .join(" ");
            Bar::default()
                .value((total * 100.0).round() as u64)
                .label(Line::from(country.clone()))
                .text_value(text)
                .style(Style::default().fg(mode.accent()))
        })
        .collect();

    let mut b = block(&spec.layout.title);
    if let Some(note) = &spec.layout.note {
        b = b.title_bottom(note.clone());
    }
    let chart = BarChart::default()
        .block(b)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

/// World map coloured by value, or a ranked list without outlines.
fn draw_choropleth(
    f: &mut Frame,
    area: Rect,
    spec: &PlotSpec,
    map: Option<&MapView>,
    selected: &[String],
) {
    let values: HashMap<String, f64> = spec
        .choropleth_traces()
        .flat_map(|t| t.locations.iter().zip(t.z.iter()))
        .filter_map(|(country, z)| z.map(|z| (country.clone(), z)))
        .collect();

    if let Some(map) = map {
        map.render(f, area, &spec.layout.title, &values, selected);
        return;
    }

    // Without outlines, list the values instead.
    let mut rows: Vec<(&String, f64)> = values.iter().map(|(k, v)| (k, *v)).collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let (lo, hi) = rows
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
            (lo.min(*v), hi.max(*v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let items: Vec<ListItem> = rows
        .iter()
        .map(|(country, v)| {
            ListItem::new(format!("{:>6.3}  {}", v, country))
                .style(Style::default().fg(ramp((v - lo) / span)))
        })
        .collect();
    f.render_widget(List::new(items).block(block(&spec.layout.title)), area);
}
