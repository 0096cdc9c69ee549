use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AccountSnapshot, EquityPoint, HistoryRequest, Position};

#[derive(Debug, Error)]
pub enum BrokerageError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rejected credentials: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimited,
}

/// Source of account, position and history data for live renders.
#[async_trait]
pub trait BrokerageProvider: Send + Sync {
    /// True when the account trades against the paper environment.
    fn is_paper(&self) -> bool;

    async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerageError>;

    async fn fetch_positions(&self) -> Result<Vec<Position>, BrokerageError>;

    /// Daily equity points, oldest first.
    async fn fetch_portfolio_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<EquityPoint>, BrokerageError>;
}
