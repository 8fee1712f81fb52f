use happiness_atlas::{
    data::{read_rows, DataError, DatasetStore, YearSource},
    render::{JsonLinesDispatcher, RecordingDispatcher, RenderCall, Surface},
    state::{Dashboard, DashboardError, NO_DATA_MESSAGE},
    views::BUBBLE_SIZE_SCALE,
};

const CSV_2015: &str = "\
Country,Region,Happiness Rank,Happiness Score,Economy (GDP per Capita),Health (Life Expectancy),Freedom,Generosity
Norway,Western Europe,1,7.5,1.45,0.88,0.66,0.35
Finland,Western Europe,2,7.4,1.29,0.89,0.64,0.23
Chad,Sub-Saharan Africa,3,3.6,0.34,0.15,0.24,0.19
";

// Nobody has a score this year, and one row has no country at all.
const CSV_2016: &str = "\
Country,Happiness Score,Economy (GDP per Capita),Health (Life Expectancy),Freedom,Generosity
Chad,,0.3,,0.1,
Niger,,0.2,,,
,5.0,1.0,0.5,0.5,0.1
";

const CSV_2017: &str = "\
Country,Happiness.Rank,Happiness.Score,Economy..GDP.per.Capita.,Health..Life.Expectancy.,Freedom,Generosity
Norway,1,7.5,1.62,0.80,0.64,0.36
Finland,2,7.5,1.44,0.86,0.61,0.25
";

const CSV_2018: &str = "\
Nation,Score,GDP,Health,Freedom,Generosity
Finland,7.6,1.30,0.87,0.68,0.20
";

const CSV_2019: &str = "\
Overall rank,Country or region,Score,GDP per capita,Social support,Healthy life expectancy,Freedom to make life choices,Generosity
1,Finland,7.8,1.34,1.59,1.00,0.60,0.15
2,Denmark,7.6,1.38,1.57,0.99,0.59,0.25
3,Norway,7.5,1.49,1.58,1.03,0.60,0.27
4,Iceland,7.5,1.38,1.62,1.03,0.59,0.35
5,Netherlands,7.4,1.40,1.52,1.00,0.56,0.32
6,Switzerland,7.4,1.45,1.53,1.05,0.57,0.26
7,Sweden,7.3,1.39,1.49,1.01,0.57,0.27
8,New Zealand,7.3,1.30,1.56,1.03,0.58,0.33
9,Canada,7.2,1.37,1.50,1.04,0.58,0.29
10,Austria,7.2,1.40,1.49,1.02,0.53,0.24
11,Australia,7.1,1.37,1.55,1.04,0.56,0.33
12,Israel,7.0,1.28,1.46,1.03,0.37,0.15
";

fn sources() -> Vec<YearSource> {
    [
        (2015, CSV_2015),
        (2016, CSV_2016),
        (2017, CSV_2017),
        (2018, CSV_2018),
        (2019, CSV_2019),
    ]
    .iter()
    .map(|(year, csv)| YearSource {
        year: *year,
        rows: read_rows(csv.as_bytes()).unwrap(),
    })
    .collect()
}

fn dashboard() -> Dashboard<RecordingDispatcher> {
    Dashboard::bootstrap(sources(), RecordingDispatcher::new()).unwrap()
}

#[test]
fn unreadable_year_does_not_block_the_others() {
    let d = dashboard();
    assert_eq!(d.years(), [2015, 2016, 2017, 2019]);
    assert_eq!(d.filter().selected_year(), 2019);

    let report = d.report();
    assert_eq!(report.years.len(), 5);
    let y2018 = report.years.iter().find(|y| y.year == 2018).unwrap();
    assert_eq!(y2018.accepted, 0);
    assert_eq!(y2018.unknown_schema, 1);
    assert_eq!(y2018.missing_field.as_deref(), Some("country"));
    let y2016 = report.years.iter().find(|y| y.year == 2016).unwrap();
    assert_eq!(y2016.malformed, 1);
    assert_eq!(report.accepted(), 3 + 2 + 2 + 12);
}

#[test]
fn every_view_is_drawn_on_startup() {
    let d = dashboard();
    for surface in Surface::ALL {
        assert!(d.dispatcher().latest(surface).is_some(), "{:?}", surface);
    }
    assert_eq!(d.dispatcher().plot_count(), 4);
}

#[test]
fn global_trend_has_a_gap_for_a_year_without_scores() {
    let d = dashboard();
    let spec = d.dispatcher().latest(Surface::Trend).unwrap();
    let line = spec.line_traces().next().unwrap();
    assert_eq!(line.name, "Global average");
    assert_eq!(line.x, vec![2015.0, 2016.0, 2017.0, 2019.0]);
    assert!(line.y[0].is_some());
    assert_eq!(line.y[1], None);
    assert_eq!(line.y[2], Some(7.5));
}

#[test]
fn ranking_keeps_ten_and_breaks_ties_by_name() {
    let d = dashboard();
    let spec = d.dispatcher().latest(Surface::Ranking).unwrap();
    let bars: Vec<_> = spec.bar_traces().collect();
    assert_eq!(bars.len(), 4);
    assert_eq!(
        bars[0].x,
        vec![
            "Finland",
            "Denmark",
            "Iceland",
            "Norway",
            "Netherlands",
            "Switzerland",
            "New Zealand",
            "Sweden",
            "Austria",
            "Canada",
        ]
    );
    assert!(spec.layout.note.is_some());
}

#[test]
fn comparison_is_capped_at_five_countries() {
    let mut d = dashboard();
    let picked: Vec<String> = [
        "Finland", "Denmark", "Norway", "Iceland", "Sweden", "Canada", "Israel",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    d.set_selected_countries(picked).unwrap();
    assert_eq!(
        d.filter().selected_countries(),
        ["Finland", "Denmark", "Norway", "Iceland", "Sweden"]
    );

    let spec = d.dispatcher().latest(Surface::Trend).unwrap();
    let names: Vec<&str> = spec.line_traces().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Finland", "Denmark", "Norway", "Iceland", "Sweden"]);
    let norway = spec.line_traces().nth(2).unwrap();
    assert_eq!(norway.y, vec![Some(7.5), None, Some(7.5), Some(7.5)]);
}

#[test]
fn substring_narrows_the_bubble_chart() {
    let mut d = dashboard();
    d.set_country_substring("LAND").unwrap();
    let spec = d.dispatcher().latest(Surface::Correlation).unwrap();
    let scatter = spec.scatter_traces().next().unwrap();
    assert_eq!(
        scatter.text,
        ["Finland", "Iceland", "Netherlands", "Switzerland", "New Zealand"]
    );
    assert_eq!(scatter.marker_size[0], Some(1.0 * BUBBLE_SIZE_SCALE));
    assert_eq!(spec.line_traces().count(), 1);

    // The map keeps every country of the year.
    let map = d.dispatcher().latest(Surface::Choropleth).unwrap();
    assert_eq!(map.choropleth_traces().next().unwrap().locations.len(), 12);
}

#[test]
fn unknown_year_changes_nothing() {
    let mut d = dashboard();
    d.dispatcher_mut().clear();
    let err = d.set_year(2018).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidYear { year: 2018 }));
    assert_eq!(d.filter().selected_year(), 2019);
    assert_eq!(d.dispatcher().plot_count(), 0);

    d.set_year(2015).unwrap();
    assert_eq!(d.dispatcher().plot_count(), 4);
    let map = d.dispatcher().latest(Surface::Choropleth).unwrap();
    assert_eq!(map.layout.title, "Happiness Score by Country (2015)");
}

#[test]
fn nothing_loadable_shows_no_data() {
    let only_bad = vec![YearSource {
        year: 2018,
        rows: read_rows(CSV_2018.as_bytes()).unwrap(),
    }];
    let mut recorder = RecordingDispatcher::new();
    let err = Dashboard::bootstrap(only_bad, &mut recorder).err().unwrap();
    assert!(matches!(
        err,
        DashboardError::Data {
            source: DataError::EmptyDataset
        }
    ));
    assert_eq!(recorder.plot_count(), 0);
    assert_eq!(
        recorder.calls.last(),
        Some(&RenderCall::Message(
            Surface::Correlation,
            NO_DATA_MESSAGE.to_string()
        ))
    );
}

#[test]
fn queries_before_loading_are_refused() {
    let store = DatasetStore::new();
    assert!(!store.is_ready());
    assert!(matches!(
        store.records_for_year(2019),
        Err(DataError::NotReady)
    ));
    assert!(matches!(store.unique_countries(), Err(DataError::NotReady)));
}

#[test]
fn json_dump_names_every_surface() {
    let mut out = JsonLinesDispatcher::new(Vec::new());
    Dashboard::bootstrap(sources(), &mut out).unwrap();
    let text = String::from_utf8(out.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 8);
    let surfaces: Vec<&str> = lines[4..]
        .iter()
        .map(|l| l["surface"].as_str().unwrap())
        .collect();
    assert_eq!(
        surfaces,
        ["lineChart", "choroplethMap", "barChart", "scatterPlot"]
    );
    assert_eq!(lines[0]["message"], "Loading…");
    assert_eq!(lines[6]["spec"]["layout"]["barMode"], "stack");
}

#[test]
fn two_files_for_one_year_do_not_double_the_trend() {
    let mut all = sources();
    all.push(YearSource {
        year: 2017,
        rows: read_rows(CSV_2017.as_bytes()).unwrap(),
    });
    let mut d = Dashboard::bootstrap(all, RecordingDispatcher::new()).unwrap();
    assert_eq!(d.years(), [2015, 2016, 2017, 2019]);
    let y2017: Vec<_> = d.report().years.iter().filter(|y| y.year == 2017).collect();
    assert_eq!(y2017.len(), 1);
    assert_eq!(y2017[0].accepted, 2);
    assert_eq!(y2017[0].duplicates, 2);

    d.set_selected_countries(vec!["Norway".to_string()]).unwrap();
    let spec = d.dispatcher().latest(Surface::Trend).unwrap();
    let norway = spec.line_traces().next().unwrap();
    assert_eq!(norway.y, vec![Some(7.5), None, Some(7.5), Some(7.5)]);
}

#[test]
fn json_dump_of_a_chosen_year_holds_one_pass() {
    let mut out = JsonLinesDispatcher::new(Vec::new());
    Dashboard::bootstrap_at(sources(), &mut out, Some(2017)).unwrap();
    let text = String::from_utf8(out.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(
        lines[5]["spec"]["layout"]["title"],
        "Happiness Score by Country (2017)"
    );
}
