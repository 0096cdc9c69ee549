use serde::{Deserialize, Serialize};

// Point-in-time view of the brokerage account, validated at the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub portfolio_value: f64,
    pub last_equity: f64,
    pub buying_power: f64,
    pub currency: String,
    pub status: String,
}

impl AccountSnapshot {
    pub fn new(portfolio_value: f64, last_equity: f64, buying_power: f64) -> Self {
        Self {
            portfolio_value,
            last_equity,
            buying_power,
            currency: "USD".to_string(),
            status: "ACTIVE".to_string(),
        }
    }

    /// Display prefix for currency amounts of this account.
    pub fn currency_prefix(&self) -> &'static str {
        currency_prefix(&self.currency)
    }
}

fn currency_prefix(code: &str) -> &'static str {
    match code.to_ascii_uppercase().as_str() {
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        _ => "$",
    }
}
