use std::sync::Arc;

use crate::config::{AppConfig, DataSourceConfig, SyntheticConfig};
use crate::external::alpaca::AlpacaClient;
use crate::external::brokerage::{BrokerageError, BrokerageProvider};
use crate::services::session_store::SessionStore;

/// Where a render gets its numbers from.
#[derive(Clone)]
pub enum DataSource {
    Synthetic(SyntheticConfig),
    Brokerage(Arc<dyn BrokerageProvider>),
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub data_source: DataSource,
}

impl AppState {
    pub fn new(sessions: SessionStore, data_source: DataSource) -> Self {
        Self { sessions, data_source }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BrokerageError> {
        let data_source = match &config.data_source {
            DataSourceConfig::Synthetic(synthetic) => DataSource::Synthetic(synthetic.clone()),
            DataSourceConfig::Alpaca(brokerage) => DataSource::Brokerage(Arc::new(AlpacaClient::new(brokerage)?)),
        };

        Ok(Self::new(SessionStore::new(&config.dashboard_password), data_source))
    }
}
