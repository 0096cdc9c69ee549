use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Lookback windows offered by the period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "2W")]
    TwoWeeks,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 7] = [
        Period::OneWeek,
        Period::TwoWeeks,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::YearToDate,
        Period::OneYear,
        Period::All,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Period::OneWeek => "1W",
            Period::TwoWeeks => "2W",
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::YearToDate => "YTD",
            Period::OneYear => "1Y",
            Period::All => "ALL",
        }
    }

    /// Number of days covered, counted back from `today`. `None` means the whole series.
    ///
    /// YTD includes both 1 January and `today`.
    pub fn lookback_days(&self, today: NaiveDate) -> Option<u32> {
        match self {
            Period::OneWeek => Some(7),
            Period::TwoWeeks => Some(14),
            Period::OneMonth => Some(30),
            Period::ThreeMonths => Some(90),
            Period::YearToDate => Some(today.ordinal()),
            Period::OneYear => Some(365),
            Period::All => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL_PERIODS
            .iter()
            .copied()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown period '{}'. Expected one of 1W, 2W, 1M, 3M, YTD, 1Y, ALL", s))
    }
}
