use serde::{Deserialize, Serialize};

use crate::models::{AccountSnapshot, EquityPoint, Period, PositionRow};

/// Derived display metrics for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub current_value: f64,
    pub previous_value: f64,
    pub daily_change: f64,
    pub daily_change_pct: f64,
    pub total_pl: f64,
    pub total_pl_pct: f64,
    /// Annualized, in percent. `None` when no value series was available.
    pub volatility: Option<f64>,
}

/// Output of the synthetic builder: the compounded series and its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSnapshot {
    pub values: Vec<f64>,
    pub metrics: PortfolioMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub delta: Option<String>,
}

impl MetricCard {
    pub fn new(label: &str, value: String, delta: Option<String>) -> Self {
        Self {
            label: label.to_string(),
            value,
            delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Synthetic,
    Paper,
    Live,
}

impl DataSourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            DataSourceKind::Synthetic => "Synthetic Data",
            DataSourceKind::Paper => "Paper Trading",
            DataSourceKind::Live => "Live Trading",
        }
    }
}

/// Everything one dashboard render needs, already computed and formatted.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub source: DataSourceKind,
    pub period: Period,
    pub account: Option<AccountSnapshot>,
    pub metrics: PortfolioMetrics,
    pub cards: Vec<MetricCard>,
    pub chart: Vec<EquityPoint>,
    pub positions: Vec<PositionRow>,
    /// Every symbol in the unfiltered book, for the sidebar multi-select.
    pub available_symbols: Vec<String>,
    pub market_value_bounds: Option<(f64, f64)>,
    /// Non-fatal problems encountered while building this render.
    pub warnings: Vec<String>,
}

impl DashboardData {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
