use std::{
    collections::{BTreeSet, HashSet},
    fs::File,
    io::Read,
    path::Path,
};

use log::{debug, info, warn};
use snafu::{ensure, OptionExt, ResultExt, Snafu};

use crate::schema::{normalize, RawRow, RawValue, Record, SchemaError};

#[derive(Debug, Snafu)]
pub enum DataError {
    #[snafu(display("no data available: no file yielded a valid row"))]
    EmptyDataset,

    #[snafu(display("dataset queried before loading finished"))]
    NotReady,

    #[snafu(display("dataset is already loaded"))]
    AlreadyLoaded,

    #[snafu(display("error opening file {path}"))]
    OpenCsv { source: csv::Error, path: String },

    #[snafu(display("error reading csv data"))]
    ReadCsv { source: csv::Error },

    #[snafu(display("cannot find a year in file name {path}"))]
    NoYearInFileName { path: String },
}

pub type DataResult<T> = Result<T, DataError>;

/// Raw rows of one yearly file.
#[derive(Clone, Debug)]
pub struct YearSource {
    pub year: i32,
    pub rows: Vec<RawRow>,
}

/// What happened to the rows of one year during loading.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct YearReport {
    pub year: i32,
    pub rows_read: usize,
    pub accepted: usize,
    pub malformed: usize,
    pub unknown_schema: usize,
    pub duplicates: usize,
    /// First logical field that could not be resolved, if any.
    pub missing_field: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub years: Vec<YearReport>,
}

impl LoadReport {
    pub fn accepted(&self) -> usize {
        self.years.iter().map(|y| y.accepted).sum()
    }

    pub fn dropped(&self) -> usize {
        self.years
            .iter()
            .map(|y| y.malformed + y.unknown_schema + y.duplicates)
            .sum()
    }

    pub fn rows_read(&self) -> usize {
        self.years.iter().map(|y| y.rows_read).sum()
    }
}

/// The merged, immutable collection of records of every year.
#[derive(Clone, Debug)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    #[cfg(test)]
    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_for_year(&self, year: i32) -> Vec<&Record> {
        self.records.iter().filter(|r| r.year == year).collect()
    }

    pub fn all_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        years.into_iter().collect()
    }

    pub fn unique_countries(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.country.clone()).collect()
    }

    pub fn records_for_country(&self, country: &str) -> Vec<&Record> {
        let mut found: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.country == country)
            .collect();
        found.sort_by_key(|r| r.year);
        found
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }
}

/// Owner of the dataset. Every query fails with [`DataError::NotReady`]
/// until [`DatasetStore::load`] has completed.
#[derive(Debug, Default)]
pub struct DatasetStore {
    dataset: Option<Dataset>,
    report: LoadReport,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.dataset.is_some()
    }

    /// Normalizes and merges every source. Bad rows are dropped and counted;
    /// loading only fails when nothing at all survives.
    pub fn load(&mut self, mut sources: Vec<YearSource>) -> DataResult<&LoadReport> {
        ensure!(self.dataset.is_none(), AlreadyLoadedSnafu);
        sources.sort_by_key(|s| s.year);

        // Sources sharing a year are read as one file, so (country, year)
        // stays unique and each year gets a single report.
        let mut merged: Vec<YearSource> = Vec::with_capacity(sources.len());
        for source in sources {
            if merged.last().is_some_and(|last| last.year == source.year) {
                debug!("load: {}: merging another source", source.year);
                if let Some(last) = merged.last_mut() {
                    last.rows.extend(source.rows);
                }
            } else {
                merged.push(source);
            }
        }

        let mut records = Vec::new();
        let mut report = LoadReport::default();
        for source in merged {
            let mut yr = YearReport {
                year: source.year,
                rows_read: source.rows.len(),
                ..Default::default()
            };
            let mut seen: HashSet<String> = HashSet::new();
            for (idx, row) in source.rows.iter().enumerate() {
                match normalize(row, source.year) {
                    Ok(record) => {
                        if !seen.insert(record.country.clone()) {
                            warn!(
                                "load: {} row {}: duplicate entry for {}, dropped",
                                source.year, idx, record.country
                            );
                            yr.duplicates += 1;
                            continue;
                        }
                        yr.accepted += 1;
                        records.push(record);
                    }
                    Err(SchemaError::MalformedRow { .. }) => {
                        debug!("load: {} row {}: no country name", source.year, idx);
                        yr.malformed += 1;
                    }
                    Err(SchemaError::UnknownSchema { field, .. }) => {
                        yr.unknown_schema += 1;
                        yr.missing_field.get_or_insert_with(|| field.to_string());
                    }
                }
            }
            if yr.malformed > 0 {
                warn!(
                    "load: {}: dropped {} rows without a country name",
                    yr.year, yr.malformed
                );
            }
            if let Some(field) = &yr.missing_field {
                warn!(
                    "load: {}: dropped {} rows, no column for {}",
                    yr.year, yr.unknown_schema, field
                );
            }
            info!(
                "load: {}: {} of {} rows accepted",
                yr.year, yr.accepted, yr.rows_read
            );
            report.years.push(yr);
        }

        self.report = report;
        ensure!(!records.is_empty(), EmptyDatasetSnafu);
        info!(
            "load: dataset ready, {} records, {} rows dropped",
            records.len(),
            self.report.dropped()
        );
        self.dataset = Some(Dataset { records });
        Ok(&self.report)
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn dataset(&self) -> DataResult<&Dataset> {
        self.dataset.as_ref().context(NotReadySnafu)
    }

    pub fn records_for_year(&self, year: i32) -> DataResult<Vec<&Record>> {
        Ok(self.dataset()?.records_for_year(year))
    }

    pub fn all_years(&self) -> DataResult<Vec<i32>> {
        Ok(self.dataset()?.all_years())
    }

    pub fn unique_countries(&self) -> DataResult<BTreeSet<String>> {
        Ok(self.dataset()?.unique_countries())
    }

    pub fn records_for_country(&self, country: &str) -> DataResult<Vec<&Record>> {
        Ok(self.dataset()?.records_for_country(country))
    }
}

/// Reads CSV text into rows keyed by header.
pub fn read_rows<R: Read>(reader: R) -> DataResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .byte_headers()
        .context(ReadCsvSnafu)?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    // Cells are decoded one by one so a stray non-UTF-8 byte only mangles
    // that cell instead of failing the whole file.
    let mut rows = Vec::new();
    for line in rdr.byte_records() {
        let line = line.context(ReadCsvSnafu)?;
        if line.iter().any(|cell| std::str::from_utf8(cell).is_err()) {
            warn!(
                "read_rows: line {}: invalid UTF-8 replaced",
                line.position().map(|p| p.line()).unwrap_or_default()
            );
        }
        let row: RawRow = headers
            .iter()
            .cloned()
            .zip(
                line.iter()
                    .map(|cell| RawValue::from(String::from_utf8_lossy(cell).as_ref())),
            )
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_year_file<P: AsRef<Path>>(path: P, year: i32) -> DataResult<YearSource> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(csv::Error::from)
        .context(OpenCsvSnafu {
            path: path.display().to_string(),
        })?;
    let rows = read_rows(file)?;
    debug!("read_year_file: {} rows from {}", rows.len(), path.display());
    Ok(YearSource { year, rows })
}

/// The first run of four digits in the file stem, e.g. `2017.csv` or
/// `world-happiness-2017.csv`.
pub fn year_from_path<P: AsRef<Path>>(path: P) -> DataResult<i32> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let digits: Vec<char> = stem.chars().collect();
    digits
        .windows(4)
        .enumerate()
        .find(|(i, w)| {
            w.iter().all(char::is_ascii_digit)
                && !digits.get(i + 4).is_some_and(char::is_ascii_digit)
                && (*i == 0 || !digits[i - 1].is_ascii_digit())
        })
        .and_then(|(_, w)| w.iter().collect::<String>().parse().ok())
        .context(NoYearInFileNameSnafu {
            path: path.display().to_string(),
        })
}
