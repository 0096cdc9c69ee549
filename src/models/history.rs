use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// A single point of the portfolio value series, as drawn on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Parameters for a portfolio history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Bar resolution, e.g. "1D".
    pub timeframe: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryRequest {
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            timeframe: "1D".to_string(),
            start,
            end,
        }
    }
}

/// Keeps only the last `days` points; `None` keeps the whole series.
pub fn trailing_window(points: &[EquityPoint], days: Option<u32>) -> &[EquityPoint] {
    match days {
        Some(days) => {
            let days = days as usize;
            if points.len() > days {
                &points[points.len() - days..]
            } else {
                points
            }
        }
        None => points,
    }
}
