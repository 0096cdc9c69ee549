pub mod alpaca;
pub mod brokerage;
