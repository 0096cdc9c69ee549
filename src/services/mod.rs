pub mod access_gate;
pub mod chart;
pub mod dashboard_service;
pub mod formatting;
pub mod session_store;
pub mod snapshot_service;
pub mod synthetic_service;
