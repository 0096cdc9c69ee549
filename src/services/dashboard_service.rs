use chrono::{Duration, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::{
    market_value_bounds, trailing_window, AccountSnapshot, DashboardData, DataSourceKind, EquityPoint,
    HistoryRequest, Period, Position, PositionFilter,
};
use crate::services::{formatting, snapshot_service, synthetic_service};
use crate::state::DataSource;

/// Lookback used for the ALL period against the brokerage.
pub const ALL_HISTORY_DAYS: u32 = 5 * 365;

/// Period and sidebar filters requested by the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardQuery {
    pub period: Period,
    pub filter: PositionFilter,
}

impl DashboardQuery {
    /// Parses `period=1M&symbols=AAPL&symbols=MSFT&min_value=100&max_value=5000`.
    /// Repeated `symbols` keys and comma-separated lists are both accepted; blank values are ignored.
    pub fn from_raw_query(raw: Option<&str>) -> Result<Self, AppError> {
        let mut query = DashboardQuery::default();
        let Some(raw) = raw else {
            return Ok(query);
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "period" => query.period = value.parse::<Period>()?,
                "symbols" => query.filter.symbols.extend(
                    value
                        .split(',')
                        .map(|s| s.trim().to_ascii_uppercase())
                        .filter(|s| !s.is_empty()),
                ),
                "min_value" => query.filter.min_market_value = Some(parse_amount("min_value", value)?),
                "max_value" => query.filter.max_market_value = Some(parse_amount("max_value", value)?),
                _ => {}
            }
        }

        Ok(query)
    }
}

fn parse_amount(name: &str, raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{} must be a number, got '{}'", name, raw)))
}

/// Builds one render's worth of data from the configured source. Nothing is cached.
pub async fn build_dashboard(
    source: &DataSource,
    query: &DashboardQuery,
    today: NaiveDate,
) -> Result<DashboardData, AppError> {
    match source {
        DataSource::Synthetic(config) => {
            let snapshot = snapshot_service::compute_synthetic_snapshot(
                config.seed,
                config.num_days,
                config.initial_value,
            )?;
            let series = synthetic_service::dated_series(&snapshot.values, today);
            // Metrics need two points, even on 1 January with YTD selected.
            let window = trailing_window(&series, query.period.lookback_days(today).map(|d| d.max(2)));
            let values: Vec<f64> = window.iter().map(|p| p.value).collect();
            let metrics = snapshot_service::compute_series_metrics(&values)?;

            info!(
                "📊 Synthetic snapshot: {} of {} days, value {:.2}",
                window.len(),
                series.len(),
                metrics.current_value
            );

            let positions = synthetic_service::synthetic_positions(config.seed);
            Ok(assemble(
                DataSourceKind::Synthetic,
                query,
                None,
                metrics,
                window.to_vec(),
                &positions,
                Vec::new(),
            ))
        }
        DataSource::Brokerage(provider) => {
            let (account, positions) =
                futures::try_join!(provider.fetch_account(), provider.fetch_positions()).map_err(|e| {
                    error!("Failed to fetch account data from brokerage: {}", e);
                    AppError::from(e)
                })?;

            let mut metrics = snapshot_service::compute_live_snapshot(&account, &positions);
            let mut warnings = Vec::new();

            let lookback = query.period.lookback_days(today).unwrap_or(ALL_HISTORY_DAYS).max(2);
            let request = HistoryRequest::daily(today - Duration::days(i64::from(lookback) - 1), today);
            let chart: Vec<EquityPoint> = match provider.fetch_portfolio_history(&request).await {
                Ok(points) => {
                    if points.len() >= 2 {
                        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
                        metrics.volatility = Some(snapshot_service::annualized_volatility(&values));
                    }
                    points
                }
                Err(e) => {
                    warn!("Portfolio history unavailable, rendering without chart: {}", e);
                    warnings.push(format!("Performance history unavailable: {}", e));
                    Vec::new()
                }
            };

            info!(
                "📊 Live snapshot: {} positions, value {:.2}",
                positions.len(),
                metrics.current_value
            );

            let kind = if provider.is_paper() {
                DataSourceKind::Paper
            } else {
                DataSourceKind::Live
            };
            Ok(assemble(kind, query, Some(account), metrics, chart, &positions, warnings))
        }
    }
}

fn assemble(
    source: DataSourceKind,
    query: &DashboardQuery,
    account: Option<AccountSnapshot>,
    metrics: crate::models::PortfolioMetrics,
    chart: Vec<EquityPoint>,
    positions: &[Position],
    warnings: Vec<String>,
) -> DashboardData {
    let mut available_symbols: Vec<String> = positions.iter().map(|p| p.symbol.clone()).collect();
    available_symbols.sort();
    available_symbols.dedup();

    let prefix = account.as_ref().map(|a| a.currency_prefix()).unwrap_or("$");
    let visible = query.filter.apply(positions);
    if !query.filter.is_empty() {
        debug!("Position filter kept {} of {} positions", visible.len(), positions.len());
    }
    let cards = formatting::build_metric_cards(&metrics, account.as_ref());

    DashboardData {
        source,
        period: query.period,
        cards,
        metrics,
        chart,
        positions: formatting::format_positions_table_in(&visible, prefix),
        available_symbols,
        market_value_bounds: market_value_bounds(positions),
        warnings,
        account,
    }
}
