use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::BrokerageConfig;
use crate::external::brokerage::{BrokerageError, BrokerageProvider};
use crate::models::{AccountSnapshot, EquityPoint, HistoryRequest, Position};

/// Alpaca trading REST API (v2), live or paper depending on the base URL.
pub struct AlpacaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl AlpacaClient {
    pub fn new(config: &BrokerageConfig) -> Result<Self, BrokerageError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrokerageError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrokerageError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Alpaca GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| BrokerageError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Alpaca rate limit hit on {}", path);
            return Err(BrokerageError::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BrokerageError::Unauthorized(format!("HTTP {} from {}", status, path)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerageError::BadResponse(format!("HTTP {} from {}: {}", status, path, body)));
        }

        resp.json::<T>()
            .await
            .map_err(|e| BrokerageError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlpacaAccount {
    #[serde(default)]
    portfolio_value: Option<String>,
    #[serde(default)]
    equity: Option<String>,
    last_equity: String,
    buying_power: String,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    current_price: String,
    market_value: String,
    unrealized_pl: String,
    // Fraction: 0.0349 means 3.49%
    unrealized_plpc: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlpacaPortfolioHistory {
    timestamp: Vec<i64>,
    equity: Vec<Option<f64>>,
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64, BrokerageError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| BrokerageError::Parse(format!("{} '{}': {}", field, raw, e)))?;
    if !value.is_finite() {
        return Err(BrokerageError::Parse(format!("{} is not a finite number: '{}'", field, raw)));
    }
    Ok(value)
}

impl TryFrom<AlpacaAccount> for AccountSnapshot {
    type Error = BrokerageError;

    fn try_from(raw: AlpacaAccount) -> Result<Self, Self::Error> {
        let portfolio_value = raw
            .portfolio_value
            .as_deref()
            .or(raw.equity.as_deref())
            .ok_or_else(|| BrokerageError::Parse("account has neither portfolio_value nor equity".into()))?;

        Ok(AccountSnapshot {
            portfolio_value: parse_decimal("portfolio_value", portfolio_value)?,
            last_equity: parse_decimal("last_equity", &raw.last_equity)?,
            buying_power: parse_decimal("buying_power", &raw.buying_power)?,
            currency: raw.currency,
            status: raw.status,
        })
    }
}

impl TryFrom<AlpacaPosition> for Position {
    type Error = BrokerageError;

    fn try_from(raw: AlpacaPosition) -> Result<Self, Self::Error> {
        // Fractional shares are truncated; the table shows whole units.
        let quantity = parse_decimal("qty", &raw.qty)?.trunc() as i64;

        Ok(Position {
            quantity,
            entry_price: parse_decimal("avg_entry_price", &raw.avg_entry_price)?,
            current_price: parse_decimal("current_price", &raw.current_price)?,
            market_value: parse_decimal("market_value", &raw.market_value)?,
            unrealized_pl: parse_decimal("unrealized_pl", &raw.unrealized_pl)?,
            unrealized_pl_pct: parse_decimal("unrealized_plpc", &raw.unrealized_plpc)? * 100.0,
            symbol: raw.symbol,
        })
    }
}

pub(crate) fn history_points(raw: AlpacaPortfolioHistory) -> Result<Vec<EquityPoint>, BrokerageError> {
    if raw.timestamp.len() != raw.equity.len() {
        return Err(BrokerageError::Parse(format!(
            "portfolio history has {} timestamps but {} equity values",
            raw.timestamp.len(),
            raw.equity.len()
        )));
    }

    raw.timestamp
        .into_iter()
        .zip(raw.equity)
        // Alpaca reports null equity for days before the account was funded
        .filter_map(|(ts, equity)| equity.map(|value| (ts, value)))
        .map(|(ts, value)| {
            let date = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| BrokerageError::Parse(format!("invalid timestamp {}", ts)))?
                .date_naive();
            Ok(EquityPoint::new(date, value))
        })
        .collect()
}

#[async_trait]
impl BrokerageProvider for AlpacaClient {
    fn is_paper(&self) -> bool {
        self.base_url.contains("paper-api")
    }

    async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerageError> {
        let raw: AlpacaAccount = self.get_json("/v2/account", &[]).await?;
        AccountSnapshot::try_from(raw)
    }

    async fn fetch_positions(&self) -> Result<Vec<Position>, BrokerageError> {
        let raw: Vec<AlpacaPosition> = self.get_json("/v2/positions", &[]).await?;
        raw.into_iter().map(Position::try_from).collect()
    }

    async fn fetch_portfolio_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<EquityPoint>, BrokerageError> {
        let query = [
            ("timeframe", request.timeframe.clone()),
            ("start", request.start.format("%Y-%m-%d").to_string()),
            ("end", request.end.format("%Y-%m-%d").to_string()),
        ];
        let raw: AlpacaPortfolioHistory = self
            .get_json("/v2/account/portfolio/history", &query)
            .await?;
        history_points(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn config(base_url: &str) -> BrokerageConfig {
        BrokerageConfig {
            api_key: "key".to_string(),
            secret_key: "secret".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_account_decodes_decimal_strings() {
        let raw: AlpacaAccount = serde_json::from_str(
            r#"{
                "portfolio_value": "101234.56",
                "last_equity": "100000",
                "buying_power": "50000.00",
                "currency": "USD",
                "status": "ACTIVE",
                "pattern_day_trader": false
            }"#,
        )
        .unwrap();

        let account = AccountSnapshot::try_from(raw).unwrap();
        assert_eq!(account.portfolio_value, 101234.56);
        assert_eq!(account.last_equity, 100000.0);
        assert_eq!(account.buying_power, 50000.0);
        assert_eq!(account.currency, "USD");
    }

    #[test]
    fn test_account_falls_back_to_equity() {
        let raw: AlpacaAccount = serde_json::from_str(
            r#"{"equity": "2500", "last_equity": "2400", "buying_power": "0", "currency": "USD", "status": "ACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(AccountSnapshot::try_from(raw).unwrap().portfolio_value, 2500.0);
    }

    #[test]
    fn test_account_rejects_garbage_numbers() {
        let raw: AlpacaAccount = serde_json::from_str(
            r#"{"portfolio_value": "abc", "last_equity": "1", "buying_power": "1", "currency": "USD", "status": "ACTIVE"}"#,
        )
        .unwrap();
        assert!(matches!(AccountSnapshot::try_from(raw), Err(BrokerageError::Parse(_))));
    }

    #[test]
    fn test_position_scales_plpc_to_percent() {
        let raw: AlpacaPosition = serde_json::from_str(
            r#"{
                "symbol": "AAPL",
                "qty": "100",
                "avg_entry_price": "150.25",
                "current_price": "155.5",
                "market_value": "15550",
                "unrealized_pl": "525",
                "unrealized_plpc": "0.0349"
            }"#,
        )
        .unwrap();

        let position = Position::try_from(raw).unwrap();
        assert_eq!(position.symbol, "AAPL");
        assert_eq!(position.quantity, 100);
        assert!((position.unrealized_pl_pct - 3.49).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_quantity_is_truncated() {
        let raw: AlpacaPosition = serde_json::from_str(
            r#"{"symbol": "TSLA", "qty": "2.75", "avg_entry_price": "200", "current_price": "210",
                "market_value": "577.5", "unrealized_pl": "27.5", "unrealized_plpc": "0.05"}"#,
        )
        .unwrap();
        assert_eq!(Position::try_from(raw).unwrap().quantity, 2);
    }

    #[test]
    fn test_history_skips_null_equity() {
        let raw: AlpacaPortfolioHistory = serde_json::from_str(
            r#"{"timestamp": [1704067200, 1704153600, 1704240000], "equity": [null, 1000.0, 1010.5], "timeframe": "1D"}"#,
        )
        .unwrap();

        let points = history_points(raw).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[1].value, 1010.5);
    }

    #[test]
    fn test_history_rejects_mismatched_lengths() {
        let raw: AlpacaPortfolioHistory =
            serde_json::from_str(r#"{"timestamp": [1704067200], "equity": []}"#).unwrap();
        assert!(history_points(raw).is_err());
    }

    #[test]
    fn test_paper_detection_from_base_url() {
        let paper = AlpacaClient::new(&config("https://paper-api.alpaca.markets/")).unwrap();
        assert!(paper.is_paper());
        assert_eq!(paper.base_url, "https://paper-api.alpaca.markets");

        let live = AlpacaClient::new(&config("https://api.alpaca.markets")).unwrap();
        assert!(!live.is_paper());
    }
}
