pub(crate) mod api;
pub(crate) mod dashboard;
pub(crate) mod health;
pub(crate) mod login;
pub mod session;
