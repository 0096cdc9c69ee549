use tracing::debug;

use crate::errors::AppError;
use crate::models::{AccountSnapshot, PortfolioMetrics, Position, SyntheticSnapshot};
use crate::services::synthetic_service;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// `change / base` as a percentage. A zero (or non-finite) base yields 0 instead of inf/NaN.
pub fn percent_change(change: f64, base: f64) -> f64 {
    if base == 0.0 || !base.is_finite() {
        debug!("Percentage base is {}, falling back to 0", base);
        return 0.0;
    }
    change / base * 100.0
}

/// Simple returns between consecutive values. Steps from a non-positive value are skipped.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Sample standard deviation of daily returns, annualized, in percent.
///
/// Fewer than two returns give 0.
pub fn annualized_volatility(values: &[f64]) -> f64 {
    let returns = daily_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().copied().sum::<f64>() / returns.len() as f64;
    let variance: f64 = returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (returns.len() as f64 - 1.0);

    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Metrics over a value series: last step for the daily figures, first to last for the totals.
pub fn compute_series_metrics(values: &[f64]) -> Result<PortfolioMetrics, AppError> {
    let n = values.len();
    if n < 2 {
        return Err(AppError::Validation(format!(
            "at least 2 values are required, got {}",
            n
        )));
    }
    let (initial, previous, current) = (values[0], values[n - 2], values[n - 1]);

    if !(initial.is_finite() && initial > 0.0) {
        return Err(AppError::Validation(format!(
            "initial value must be positive, got {}",
            initial
        )));
    }

    let daily_change = current - previous;
    let total_pl = current - initial;

    Ok(PortfolioMetrics {
        current_value: current,
        previous_value: previous,
        daily_change,
        daily_change_pct: percent_change(daily_change, previous),
        total_pl,
        total_pl_pct: total_pl / initial * 100.0,
        volatility: Some(annualized_volatility(values)),
    })
}

/// Generates a seeded value series and derives its metrics. Same inputs, same output.
pub fn compute_synthetic_snapshot(
    seed: u64,
    num_days: usize,
    initial_value: f64,
) -> Result<SyntheticSnapshot, AppError> {
    if !(2..=synthetic_service::MAX_SYNTHETIC_DAYS).contains(&num_days) {
        return Err(AppError::Validation(format!(
            "num_days must be between 2 and {}, got {}",
            synthetic_service::MAX_SYNTHETIC_DAYS,
            num_days
        )));
    }
    if !(initial_value.is_finite() && initial_value > 0.0) {
        return Err(AppError::Validation(format!(
            "initial_value must be positive, got {}",
            initial_value
        )));
    }

    let values = synthetic_service::generate_value_series(seed, num_days, initial_value);
    let metrics = compute_series_metrics(&values)?;
    Ok(SyntheticSnapshot { values, metrics })
}

/// Metrics from a live account and its open positions.
///
/// `total_pl_pct` is the plain average of the per-position percentages, not
/// weighted by position size.
pub fn compute_live_snapshot(account: &AccountSnapshot, positions: &[Position]) -> PortfolioMetrics {
    let current = account.portfolio_value;
    let previous = account.last_equity;
    let daily_change = current - previous;

    let total_pl: f64 = positions.iter().map(|p| p.unrealized_pl).sum();
    let total_pl_pct = if positions.is_empty() {
        0.0
    } else {
        positions.iter().map(|p| p.unrealized_pl_pct).sum::<f64>() / positions.len() as f64
    };

    PortfolioMetrics {
        current_value: current,
        previous_value: previous,
        daily_change,
        daily_change_pct: percent_change(daily_change, previous),
        total_pl,
        total_pl_pct,
        volatility: None,
    }
}
