use log::{debug, info, warn};
use snafu::{ensure, ResultExt, Snafu};

use crate::{
    data::{DataError, Dataset, DatasetStore, LoadReport, YearSource},
    render::{RenderDispatcher, Surface},
    views,
};

/// Size of the comparison selection.
pub const MAX_SELECTED_COUNTRIES: usize = 5;

pub const LOADING_MESSAGE: &str = "Loading…";
pub const NO_DATA_MESSAGE: &str = "No data available";

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("year {year} is not in the dataset"))]
    InvalidYear { year: i32 },

    #[snafu(display("dataset error"))]
    Data { source: DataError },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Immutable copy of the filters, read by the views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSnapshot {
    pub selected_year: i32,
    pub country_substring: String,
    pub selected_countries: Vec<String>,
}

/// What the dashboard currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    selected_year: i32,
    country_substring: String,
    selected_countries: Vec<String>,
}

impl FilterState {
    /// Defaults: latest year, no search text, nothing selected.
    pub fn new(dataset: &Dataset) -> Self {
        Self {
            selected_year: dataset.latest_year().unwrap_or_default(),
            country_substring: String::new(),
            selected_countries: Vec::new(),
        }
    }

    pub fn selected_year(&self) -> i32 {
        self.selected_year
    }

    pub fn country_substring(&self) -> &str {
        &self.country_substring
    }

    pub fn selected_countries(&self) -> &[String] {
        &self.selected_countries
    }

    pub fn set_year(&mut self, year: i32, known: &[i32]) -> DashboardResult<()> {
        ensure!(known.contains(&year), InvalidYearSnafu { year });
        self.selected_year = year;
        Ok(())
    }

    pub fn set_country_substring(&mut self, text: &str) {
        self.country_substring = text.to_string();
    }

    /// Keeps the first [`MAX_SELECTED_COUNTRIES`] entries, in order.
    pub fn set_selected_countries(&mut self, countries: Vec<String>) {
        if countries.len() > MAX_SELECTED_COUNTRIES {
            debug!(
                "set_selected_countries: keeping {} of {} countries",
                MAX_SELECTED_COUNTRIES,
                countries.len()
            );
        }
        self.selected_countries = countries
            .into_iter()
            .take(MAX_SELECTED_COUNTRIES)
            .collect();
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            selected_year: self.selected_year,
            country_substring: self.country_substring.clone(),
            selected_countries: self.selected_countries.clone(),
        }
    }
}

/// Session controller: owns the dataset, the filters and the dispatcher, and
/// redraws every view after each accepted filter change.
pub struct Dashboard<D: RenderDispatcher> {
    store: DatasetStore,
    filter: FilterState,
    years: Vec<i32>,
    dispatcher: D,
}

impl<D: RenderDispatcher> Dashboard<D> {
    /// Loads every source, then draws the initial state. Until loading
    /// completes each surface shows the pending message.
    pub fn bootstrap(sources: Vec<YearSource>, dispatcher: D) -> DashboardResult<Self> {
        Self::bootstrap_at(sources, dispatcher, None)
    }

    /// Like [`Dashboard::bootstrap`], but the first published year is
    /// `initial_year` when it was loaded. Any other year is logged and the
    /// latest one is shown instead.
    pub fn bootstrap_at(
        sources: Vec<YearSource>,
        mut dispatcher: D,
        initial_year: Option<i32>,
    ) -> DashboardResult<Self> {
        for surface in Surface::ALL {
            dispatcher.show_message(surface, LOADING_MESSAGE);
        }

        let mut store = DatasetStore::new();
        if let Err(e) = store.load(sources) {
            warn!("bootstrap: {}", e);
            for surface in Surface::ALL {
                dispatcher.show_message(surface, NO_DATA_MESSAGE);
            }
            return Err(e).context(DataSnafu);
        }

        let dataset = store.dataset().context(DataSnafu)?;
        let mut filter = FilterState::new(dataset);
        let years = dataset.all_years();
        if let Some(year) = initial_year {
            if let Err(e) = filter.set_year(year, &years) {
                warn!("bootstrap: {}, starting on {}", e, filter.selected_year());
            }
        }
        info!(
            "bootstrap: {} years, {} countries, showing {}",
            years.len(),
            dataset.unique_countries().len(),
            filter.selected_year()
        );

        let mut dashboard = Self {
            store,
            filter,
            years,
            dispatcher,
        };
        dashboard.publish()?;
        Ok(dashboard)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn report(&self) -> &LoadReport {
        self.store.report()
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    /// Selects `year`. An unknown year leaves everything as it was.
    pub fn set_year(&mut self, year: i32) -> DashboardResult<()> {
        if let Err(e) = self.filter.set_year(year, &self.years) {
            warn!("set_year: {}, keeping {}", e, self.filter.selected_year());
            return Err(e);
        }
        self.publish()
    }

    pub fn set_country_substring(&mut self, text: &str) -> DashboardResult<()> {
        self.filter.set_country_substring(text);
        self.publish()
    }

    pub fn set_selected_countries(&mut self, countries: Vec<String>) -> DashboardResult<()> {
        self.filter.set_selected_countries(countries);
        self.publish()
    }

    /// Moves to the neighbouring loaded year; stays put at either end.
    pub fn step_year(&mut self, delta: isize) -> DashboardResult<()> {
        let current = self
            .years
            .iter()
            .position(|y| *y == self.filter.selected_year())
            .unwrap_or(0);
        let target = current
            .saturating_add_signed(delta)
            .min(self.years.len().saturating_sub(1));
        match self.years.get(target).copied() {
            Some(year) if target != current => self.set_year(year),
            _ => Ok(()),
        }
    }

    /// Adds `country` to the comparison, or removes it if already there.
    pub fn toggle_country(&mut self, country: &str) -> DashboardResult<()> {
        let mut selection = self.filter.selected_countries().to_vec();
        if let Some(idx) = selection.iter().position(|c| c == country) {
            selection.remove(idx);
        } else {
            selection.push(country.to_string());
        }
        self.set_selected_countries(selection)
    }

    /// Recomputes every view from the current filters and draws it.
    pub fn publish(&mut self) -> DashboardResult<()> {
        let dataset = self.store.dataset().context(DataSnafu)?;
        let snapshot = self.filter.snapshot();
        debug!("publish: {:?}", snapshot);
        for (surface, spec) in views::build_all(dataset, &snapshot) {
            self.dispatcher.render(surface, &spec);
        }
        Ok(())
    }
}
