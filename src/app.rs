use crossterm::event::KeyCode;
use log::warn;

use crate::{
    state::{Dashboard, DashboardResult},
    ui::TerminalDispatcher,
    views::matches_substring,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Picker,
    Search,
}

/// Purely cosmetic; the data core never sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Dark,
    Light,
}

/// Terminal session: the dashboard plus the picker and search box around it.
pub struct App {
    pub dashboard: Dashboard<TerminalDispatcher>,
    pub countries: Vec<String>,
    /// Highlighted row of the picker, an index into `visible_countries()`.
    pub selected: usize,
    pub focus: Focus,
    pub search: String,
    pub mode: DisplayMode,
    pub status: String,
}

impl App {
    pub fn new(dashboard: Dashboard<TerminalDispatcher>) -> Self {
        let countries: Vec<String> = dashboard
            .store()
            .unique_countries()
            .map(|c| c.into_iter().collect())
            .unwrap_or_default();
        let report = dashboard.report();
        let status = format!(
            "{} records, {} rows dropped",
            report.accepted(),
            report.dropped()
        );
        Self {
            dashboard,
            countries,
            selected: 0,
            focus: Focus::Picker,
            search: String::new(),
            mode: DisplayMode::Dark,
            status,
        }
    }

    /// Countries matching the search text, in name order.
    pub fn visible_countries(&self) -> Vec<String> {
        self.countries
            .iter()
            .filter(|c| matches_substring(c, &self.search))
            .cloned()
            .collect()
    }

    fn report(&mut self, res: DashboardResult<()>) {
        if let Err(e) = res {
            warn!("handle_input: {}", e);
            self.status = e.to_string();
        }
    }

    fn apply_search(&mut self) {
        let res = self.dashboard.set_country_substring(&self.search);
        self.report(res);
        let visible = self.visible_countries().len();
        self.selected = self.selected.min(visible.saturating_sub(1));
    }

    /// Returns true when the user asked to quit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        if self.focus == Focus::Search {
            match key {
                Enter | Esc | Tab => self.focus = Focus::Picker,
                Backspace => {
                    self.search.pop();
                    self.apply_search();
                }
                Char(c) => {
                    self.search.push(c);
                    self.apply_search();
                }
                _ => {}
            }
            return false;
        }

        match key {
            Char('q') => return true,
            Char('/') | Tab => self.focus = Focus::Search,
            Left => {
                let res = self.dashboard.step_year(-1);
                self.report(res);
            }
            Right => {
                let res = self.dashboard.step_year(1);
                self.report(res);
            }
            Up => self.selected = self.selected.saturating_sub(1),
            Down => {
                if self.selected + 1 < self.visible_countries().len() {
                    self.selected += 1;
                }
            }
            Char(' ') | Enter => {
                if let Some(country) = self.visible_countries().get(self.selected) {
                    let res = self.dashboard.toggle_country(country);
                    self.report(res);
                }
            }
            Char('c') => {
                let res = self.dashboard.set_selected_countries(Vec::new());
                self.report(res);
            }
            Char('t') => {
                self.mode = match self.mode {
                    DisplayMode::Dark => DisplayMode::Light,
                    DisplayMode::Light => DisplayMode::Dark,
                };
            }
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{read_rows, YearSource},
        render::Surface,
        ui::SurfaceContent,
    };

    const CSV: &str = "\
Country,Happiness Score,Economy (GDP per Capita),Health (Life Expectancy),Freedom,Generosity
Norway,7.5,1.4,0.9,0.6,0.3
Nepal,4.5,0.4,0.5,0.4,0.3
Chad,3.5,0.3,0.2,0.1,0.2
";

    fn app() -> App {
        let sources = [2016, 2017]
            .iter()
            .map(|y| YearSource {
                year: *y,
                rows: read_rows(CSV.as_bytes()).unwrap(),
            })
            .collect();
        let dashboard = Dashboard::bootstrap(sources, TerminalDispatcher::new(None)).unwrap();
        App::new(dashboard)
    }

    fn trend_names(app: &App) -> Vec<String> {
        match app.dashboard.dispatcher().content(Surface::Trend) {
            Some(SurfaceContent::Plot(spec)) => spec.line_traces().map(|t| t.name.clone()).collect(),
            other => panic!("unexpected trend content {:?}", other),
        }
    }

    #[test]
    fn starts_on_latest_year_with_global_trend() {
        let app = app();
        assert_eq!(app.dashboard.filter().selected_year(), 2017);
        assert_eq!(app.countries, vec!["Chad", "Nepal", "Norway"]);
        assert_eq!(trend_names(&app), vec!["Global average"]);
        assert_eq!(app.status, "6 records, 0 rows dropped");
    }

    #[test]
    fn arrows_change_year() {
        let mut app = app();
        assert!(!app.handle_input(KeyCode::Left));
        assert_eq!(app.dashboard.filter().selected_year(), 2016);
        app.handle_input(KeyCode::Left);
        assert_eq!(app.dashboard.filter().selected_year(), 2016);
        app.handle_input(KeyCode::Right);
        assert_eq!(app.dashboard.filter().selected_year(), 2017);
    }

    #[test]
    fn search_filters_picker_and_views() {
        let mut app = app();
        app.handle_input(KeyCode::Char('/'));
        for c in "NE".chars() {
            app.handle_input(KeyCode::Char(c));
        }
        assert_eq!(app.dashboard.filter().country_substring(), "NE");
        assert_eq!(app.visible_countries(), vec!["Nepal"]);
        app.handle_input(KeyCode::Backspace);
        assert_eq!(app.visible_countries(), vec!["Nepal", "Norway"]);
        app.handle_input(KeyCode::Enter);
        assert_eq!(app.focus, Focus::Picker);
    }

    #[test]
    fn space_toggles_comparison() {
        let mut app = app();
        app.handle_input(KeyCode::Down);
        app.handle_input(KeyCode::Char(' '));
        assert_eq!(app.dashboard.filter().selected_countries(), ["Nepal"]);
        assert_eq!(trend_names(&app), vec!["Nepal"]);
        app.handle_input(KeyCode::Char('c'));
        assert!(app.dashboard.filter().selected_countries().is_empty());
    }

    #[test]
    fn mode_toggle_and_quit() {
        let mut app = app();
        app.handle_input(KeyCode::Char('t'));
        assert_eq!(app.mode, DisplayMode::Light);
        assert!(app.handle_input(KeyCode::Char('q')));
    }
}
