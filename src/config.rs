use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::data::{read_year_file, year_from_path, YearSource};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_YEARS: [i32; 5] = [2015, 2016, 2017, 2018, 2019];
pub const DEFAULT_LOG_FILE: &str = "happiness-atlas.log";

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("error opening config {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("error parsing config {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Taken from the file name when absent.
    pub year: Option<i32>,
    pub path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "dataDir", default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    #[serde(rename = "worldGeojson")]
    pub world_geojson: Option<String>,
    #[serde(rename = "logFile")]
    pub log_file: Option<String>,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sources: Vec::new(),
            world_geojson: None,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(path: &str) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
        debug!("read config: {:?}", contents);
        serde_json::from_str(&contents).context(ParsingConfigSnafu { path })
    }

    /// Sources to read: the configured ones, or one `<year>.csv` per default
    /// year. Relative paths are resolved against the data directory.
    pub fn source_files(&self) -> Vec<(Option<i32>, PathBuf)> {
        let base = Path::new(&self.data_dir);
        if self.sources.is_empty() {
            return DEFAULT_YEARS
                .iter()
                .map(|y| (Some(*y), base.join(format!("{}.csv", y))))
                .collect();
        }
        self.sources
            .iter()
            .map(|s| {
                let p = Path::new(&s.path);
                let full = if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    base.join(p)
                };
                (s.year, full)
            })
            .collect()
    }

    /// Reads every source file. A file that cannot be read is logged and
    /// skipped; the others still load.
    pub fn read_sources(&self) -> Vec<YearSource> {
        let mut sources = Vec::new();
        for (year, path) in self.source_files() {
            let year = match year.map(Ok).unwrap_or_else(|| year_from_path(&path)) {
                Ok(y) => y,
                Err(e) => {
                    warn!("read_sources: skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            match read_year_file(&path, year) {
                Ok(source) => sources.push(source),
                Err(e) => warn!("read_sources: skipping {}: {}", path.display(), e),
            }
        }
        sources
    }
}
