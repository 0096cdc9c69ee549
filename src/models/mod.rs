mod account;
mod history;
mod period;
mod position;
mod snapshot;

pub use account::AccountSnapshot;
pub use history::{trailing_window, EquityPoint, HistoryRequest};
pub use period::Period;
pub use position::{market_value_bounds, Position, PositionFilter, PositionRow};
pub use snapshot::{DashboardData, DataSourceKind, MetricCard, PortfolioMetrics, SyntheticSnapshot};
