//! One pure builder per dashboard view.
//!
//! Each builder reads the dataset and a filter snapshot and returns the plot
//! specification for its surface. None of them hold state.

use std::collections::HashMap;

use crate::{
    data::Dataset,
    plot::{
        BarMode, BarTrace, ChoroplethTrace, Layout, LineTrace, PlotSpec, ScatterTrace, Trace,
    },
    regression::{fit, pearson},
    render::Surface,
    schema::Record,
    state::FilterSnapshot,
};

/// Number of countries shown in the ranking.
pub const TOP_N: usize = 10;

/// Marker size per unit of the health indicator (which ranges over roughly
/// 0 to 1.1), giving bubbles between 0 and about 22 px.
pub const BUBBLE_SIZE_SCALE: f64 = 20.0;

pub const FACTOR_NOTE: &str = "Factor bars are approximate contributions; \
they do not add up to the published happiness score.";

pub type ViewBuilder = fn(&Dataset, &FilterSnapshot) -> PlotSpec;

/// Every view of the dashboard, in drawing order.
pub const VIEWS: [(Surface, ViewBuilder); 4] = [
    (Surface::Trend, trend as ViewBuilder),
    (Surface::Choropleth, choropleth as ViewBuilder),
    (Surface::Ranking, ranking as ViewBuilder),
    (Surface::Correlation, correlation as ViewBuilder),
];

pub fn build_all(dataset: &Dataset, filter: &FilterSnapshot) -> Vec<(Surface, PlotSpec)> {
    VIEWS
        .iter()
        .map(|(surface, build)| (*surface, build(dataset, filter)))
        .collect()
}

/// Mean of the present values, `None` when there are none.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Case-insensitive "contains"; an empty needle matches everything.
pub fn matches_substring(country: &str, needle: &str) -> bool {
    needle.is_empty() || country.to_lowercase().contains(&needle.to_lowercase())
}

pub fn trend(dataset: &Dataset, filter: &FilterSnapshot) -> PlotSpec {
    let years = dataset.all_years();
    let x: Vec<f64> = years.iter().map(|y| *y as f64).collect();

    let traces = if filter.selected_countries.is_empty() {
        let y = years
            .iter()
            .map(|year| {
                mean(
                    dataset
                        .records_for_year(*year)
                        .iter()
                        .filter_map(|r| r.happiness_score),
                )
            })
            .collect();
        vec![Trace::Line(LineTrace {
            name: "Global average".to_string(),
            x,
            y,
        })]
    } else {
        filter
            .selected_countries
            .iter()
            .map(|country| {
                let by_year: HashMap<i32, Option<f64>> = dataset
                    .records_for_country(country)
                    .into_iter()
                    .map(|r| (r.year, r.happiness_score))
                    .collect();
                let y = years
                    .iter()
                    .map(|year| by_year.get(year).copied().flatten())
                    .collect();
                Trace::Line(LineTrace {
                    name: country.clone(),
                    x: x.clone(),
                    y,
                })
            })
            .collect()
    };

    let title = if filter.selected_countries.is_empty() {
        "Global Happiness Over Time".to_string()
    } else {
        "Happiness Over Time by Country".to_string()
    };
    PlotSpec {
        traces,
        layout: Layout::titled(title).axes("Year", "Happiness Score"),
    }
}

pub fn choropleth(dataset: &Dataset, filter: &FilterSnapshot) -> PlotSpec {
    let records = dataset.records_for_year(filter.selected_year);
    let trace = ChoroplethTrace {
        name: "Happiness Score".to_string(),
        locations: records.iter().map(|r| r.country.clone()).collect(),
        z: records.iter().map(|r| r.happiness_score).collect(),
    };
    PlotSpec {
        traces: vec![Trace::Choropleth(trace)],
        layout: Layout::titled(format!("Happiness Score by Country ({})", filter.selected_year)),
    }
}

/// Records of `year` with a score, best first, ties by country name.
pub fn ranked(dataset: &Dataset, year: i32) -> Vec<(&Record, f64)> {
    let mut scored: Vec<(&Record, f64)> = dataset
        .records_for_year(year)
        .into_iter()
        .filter_map(|r| r.happiness_score.map(|s| (r, s)))
        .collect();
    scored.sort_by(|(ra, a), (rb, b)| b.total_cmp(a).then_with(|| ra.country.cmp(&rb.country)));
    scored
}

pub fn ranking(dataset: &Dataset, filter: &FilterSnapshot) -> PlotSpec {
    let top: Vec<&Record> = ranked(dataset, filter.selected_year)
        .into_iter()
        .take(TOP_N)
        .map(|(r, _)| r)
        .collect();
    let countries: Vec<String> = top.iter().map(|r| r.country.clone()).collect();

    let factors: [(&str, fn(&Record) -> Option<f64>); 4] = [
        ("Economy", |r| r.economy_gdp_per_capita),
        ("Health", |r| r.health_life_expectancy),
        ("Freedom", |r| r.freedom),
        ("Generosity", |r| r.generosity),
    ];
    let traces = factors
        .iter()
        .map(|(name, get)| {
            Trace::Bar(BarTrace {
                name: name.to_string(),
                x: countries.clone(),
                y: top.iter().map(|r| get(r)).collect(),
            })
        })
        .collect();

    let mut layout = Layout::titled(format!(
        "Top {} Happiest Countries ({})",
        TOP_N, filter.selected_year
    ))
    .axes("Country", "Factor contribution");
    layout.bar_mode = Some(BarMode::Stack);
    layout.note = Some(FACTOR_NOTE.to_string());
    PlotSpec { traces, layout }
}

pub fn correlation(dataset: &Dataset, filter: &FilterSnapshot) -> PlotSpec {
    let visible: Vec<&Record> = dataset
        .records_for_year(filter.selected_year)
        .into_iter()
        .filter(|r| matches_substring(&r.country, &filter.country_substring))
        .filter(|r| r.economy_gdp_per_capita.is_some() && r.happiness_score.is_some())
        .collect();

    let mut scatter = ScatterTrace {
        name: "Countries".to_string(),
        text: Vec::with_capacity(visible.len()),
        x: Vec::with_capacity(visible.len()),
        y: Vec::with_capacity(visible.len()),
        marker_size: Vec::with_capacity(visible.len()),
        marker_color: Vec::with_capacity(visible.len()),
    };
    let mut points = Vec::with_capacity(visible.len());
    for r in &visible {
        if let (Some(x), Some(y)) = (r.economy_gdp_per_capita, r.happiness_score) {
            scatter.text.push(r.country.clone());
            scatter.x.push(x);
            scatter.y.push(y);
            scatter
                .marker_size
                .push(r.health_life_expectancy.map(|h| h * BUBBLE_SIZE_SCALE));
            scatter.marker_color.push(r.freedom);
            points.push((x, y));
        }
    }

    let mut traces = vec![Trace::Scatter(scatter)];
    if let Some(line) = fit(&points) {
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let name = match pearson(&points) {
            Some(r) => format!("Trend (r = {:.2})", r),
            None => "Trend".to_string(),
        };
        traces.push(Trace::Line(LineTrace {
            name,
            x: vec![min_x, max_x],
            y: vec![Some(line.predict(min_x)), Some(line.predict(max_x))],
        }));
    }

    PlotSpec {
        traces,
        layout: Layout::titled(format!(
            "GDP per Capita vs Happiness Score ({})",
            filter.selected_year
        ))
        .axes("GDP per Capita", "Happiness Score"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(country: &str, year: i32, score: Option<f64>) -> Record {
        Record {
            country: country.to_string(),
            year,
            happiness_score: score,
            economy_gdp_per_capita: score.map(|s| s / 5.0),
            health_life_expectancy: Some(0.8),
            freedom: Some(0.5),
            generosity: Some(0.2),
        }
    }

    fn filter(year: i32) -> FilterSnapshot {
        FilterSnapshot {
            selected_year: year,
            country_substring: String::new(),
            selected_countries: Vec::new(),
        }
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            rec("Norway", 2015, Some(7.5)),
            rec("Chad", 2015, Some(3.5)),
            rec("Norway", 2016, None),
            rec("Chad", 2016, None),
            rec("Norway", 2017, Some(7.6)),
            rec("Chad", 2017, Some(3.9)),
            rec("Peru", 2017, Some(5.7)),
        ])
    }

    fn only_line(spec: &PlotSpec) -> &LineTrace {
        let lines: Vec<&LineTrace> = spec.line_traces().collect();
        assert_eq!(lines.len(), 1);
        lines[0]
    }

    #[test]
    fn global_trend_skips_missing_scores_per_year() {
        let spec = trend(&sample(), &filter(2017));
        let line = only_line(&spec);
        assert_eq!(line.x, vec![2015.0, 2016.0, 2017.0]);
        assert_eq!(line.y[0], Some(5.5));
        assert_eq!(line.y[1], None);
        assert!((line.y[2].unwrap() - (7.6 + 3.9 + 5.7) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn country_trend_leaves_gaps() {
        let mut f = filter(2017);
        f.selected_countries = vec!["Peru".to_string(), "Norway".to_string()];
        let spec = trend(&sample(), &f);
        let lines: Vec<&LineTrace> = spec.line_traces().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Peru");
        assert_eq!(lines[0].y, vec![None, None, Some(5.7)]);
        assert_eq!(lines[1].y, vec![Some(7.5), None, Some(7.6)]);
    }

    #[test]
    fn choropleth_is_for_the_selected_year() {
        let spec = choropleth(&sample(), &filter(2016));
        let map: Vec<&ChoroplethTrace> = spec.choropleth_traces().collect();
        assert_eq!(map[0].locations, vec!["Norway", "Chad"]);
        assert_eq!(map[0].z, vec![None, None]);
    }

    #[test]
    fn ranking_breaks_ties_by_name() {
        let ds = Dataset::from_records(vec![
            rec("Zambia", 2019, Some(7.0)),
            rec("Austria", 2019, Some(7.0)),
            rec("Brazil", 2019, Some(7.2)),
            rec("Mali", 2019, None),
        ]);
        let spec = ranking(&ds, &filter(2019));
        let bars: Vec<&BarTrace> = spec.bar_traces().collect();
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].x, vec!["Brazil", "Austria", "Zambia"]);
        assert_eq!(spec.layout.bar_mode, Some(BarMode::Stack));
        assert!(spec.layout.note.is_some());
    }

    #[test]
    fn ranking_keeps_top_ten() {
        let records = (0..15)
            .map(|i| rec(&format!("C{:02}", i), 2018, Some(i as f64)))
            .collect();
        let spec = ranking(&Dataset::from_records(records), &filter(2018));
        let first = spec.bar_traces().next().unwrap();
        assert_eq!(first.x.len(), TOP_N);
        assert_eq!(first.x[0], "C14");
        assert_eq!(first.x[9], "C05");
    }

    #[test]
    fn correlation_filters_by_substring_and_fits() {
        let mut f = filter(2017);
        f.country_substring = "A".to_string();
        let spec = correlation(&sample(), &f);
        let scatter = spec.scatter_traces().next().unwrap();
        assert_eq!(scatter.text, vec!["Norway".to_string(), "Chad".to_string()]);
        assert_eq!(scatter.marker_size, vec![Some(16.0), Some(16.0)]);
        assert_eq!(scatter.marker_color, vec![Some(0.5), Some(0.5)]);

        let overlay = only_line(&spec);
        assert_eq!(overlay.x, vec![3.9 / 5.0, 7.6 / 5.0]);
        assert!((overlay.y[0].unwrap() - 3.9).abs() < 1e-9);
        assert!(overlay.name.starts_with("Trend (r = 1.00"));
    }

    #[test]
    fn correlation_without_enough_points_has_no_overlay() {
        let mut f = filter(2017);
        f.country_substring = "peru".to_string();
        let spec = correlation(&sample(), &f);
        assert_eq!(spec.scatter_traces().next().unwrap().x.len(), 1);
        assert_eq!(spec.line_traces().count(), 0);

        let spec = correlation(&sample(), &filter(2016));
        assert!(spec.scatter_traces().next().unwrap().x.is_empty());
        assert_eq!(spec.line_traces().count(), 0);
    }

    #[test]
    fn build_all_covers_every_surface() {
        let specs = build_all(&sample(), &filter(2017));
        let surfaces: Vec<Surface> = specs.iter().map(|(s, _)| *s).collect();
        assert_eq!(surfaces, Surface::ALL.to_vec());
    }
}
