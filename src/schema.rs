//! Per-year schema reconciliation.
//!
//! Every yearly release of the survey renames some of its columns. Each
//! logical field below owns an alias table, tried in order, so a row from any
//! known release maps onto the same [`Record`].

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use snafu::{ensure, OptionExt, Snafu};

/// A single cell as handed over by the CSV reader.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(n: Option<f64>) -> Self {
        n.map(RawValue::Number).unwrap_or(RawValue::Null)
    }
}

impl RawValue {
    /// Best-effort numeric reading. Anything that is not a finite number is
    /// `None`, never zero.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        n.is_finite().then_some(n)
    }

    fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            RawValue::Number(n) if n.is_finite() => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One source row, headers as keys.
pub type RawRow = BTreeMap<String, RawValue>;

#[derive(Debug, Snafu, PartialEq)]
pub enum SchemaError {
    #[snafu(display("row from {year} has no country name"))]
    MalformedRow { year: i32 },

    #[snafu(display("no column for {field} in the {year} schema"))]
    UnknownSchema { field: &'static str, year: i32 },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalField {
    Country,
    HappinessScore,
    Economy,
    Health,
    Freedom,
    Generosity,
}

impl LogicalField {
    pub const ALL: [LogicalField; 6] = [
        LogicalField::Country,
        LogicalField::HappinessScore,
        LogicalField::Economy,
        LogicalField::Health,
        LogicalField::Freedom,
        LogicalField::Generosity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogicalField::Country => "country",
            LogicalField::HappinessScore => "happiness score",
            LogicalField::Economy => "economy (GDP per capita)",
            LogicalField::Health => "health (life expectancy)",
            LogicalField::Freedom => "freedom",
            LogicalField::Generosity => "generosity",
        }
    }

    /// Column names in priority order; the first entry is canonical.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::Country => &["Country", "Country or region", "Country name"],
            LogicalField::HappinessScore => {
                &["Happiness Score", "Happiness.Score", "Score", "Ladder score"]
            }
            LogicalField::Economy => &[
                "Economy (GDP per Capita)",
                "Economy..GDP.per.Capita.",
                "GDP per capita",
                "Logged GDP per capita",
            ],
            LogicalField::Health => &[
                "Health (Life Expectancy)",
                "Health..Life.Expectancy.",
                "Healthy life expectancy",
            ],
            LogicalField::Freedom => &["Freedom", "Freedom to make life choices"],
            LogicalField::Generosity => &["Generosity"],
        }
    }

    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }

    fn lookup(self, row: &RawRow) -> Option<&RawValue> {
        self.aliases().iter().find_map(|alias| row.get(*alias))
    }
}

/// Canonical, year-tagged observation for one country.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub country: String,
    pub year: i32,
    pub happiness_score: Option<f64>,
    pub economy_gdp_per_capita: Option<f64>,
    pub health_life_expectancy: Option<f64>,
    pub freedom: Option<f64>,
    pub generosity: Option<f64>,
}

impl Record {
    /// The record written back with canonical column names.
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new();
        row.insert(
            LogicalField::Country.canonical().to_string(),
            RawValue::from(self.country.as_str()),
        );
        for (field, value) in [
            (LogicalField::HappinessScore, self.happiness_score),
            (LogicalField::Economy, self.economy_gdp_per_capita),
            (LogicalField::Health, self.health_life_expectancy),
            (LogicalField::Freedom, self.freedom),
            (LogicalField::Generosity, self.generosity),
        ] {
            row.insert(field.canonical().to_string(), RawValue::from(value));
        }
        row
    }
}

/// Maps one raw row of `year` onto a [`Record`].
pub fn normalize(row: &RawRow, year: i32) -> SchemaResult<Record> {
    for field in LogicalField::ALL {
        ensure!(
            field.lookup(row).is_some(),
            UnknownSchemaSnafu {
                field: field.name(),
                year
            }
        );
    }

    let country = LogicalField::Country
        .lookup(row)
        .and_then(RawValue::as_text)
        .context(MalformedRowSnafu { year })?;

    let number = |field: LogicalField| field.lookup(row).and_then(RawValue::as_number);
    let record = Record {
        country,
        year,
        happiness_score: number(LogicalField::HappinessScore),
        economy_gdp_per_capita: number(LogicalField::Economy),
        health_life_expectancy: number(LogicalField::Health),
        freedom: number(LogicalField::Freedom),
        generosity: number(LogicalField::Generosity),
    };
    debug!("normalize: {:?}", record);
    Ok(record)
}
