use serde::{Deserialize, Serialize};

// Represents a single open position as reported by the brokerage (or fabricated in synthetic mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_pl: f64,
    /// Percent, not a fraction: 3.49 means +3.49%.
    pub unrealized_pl_pct: f64,
}

impl Position {
    /// Builds a position from quantity and prices, deriving value and P&L.
    pub fn from_prices(symbol: impl Into<String>, quantity: i64, entry_price: f64, current_price: f64) -> Self {
        let market_value = quantity as f64 * current_price;
        let unrealized_pl = (current_price - entry_price) * quantity as f64;
        let unrealized_pl_pct = if entry_price != 0.0 {
            (current_price - entry_price) / entry_price * 100.0
        } else {
            0.0
        };

        Self {
            symbol: symbol.into(),
            quantity,
            entry_price,
            current_price,
            market_value,
            unrealized_pl,
            unrealized_pl_pct,
        }
    }
}

// Display-ready row for the positions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub symbol: String,
    pub quantity: String,
    pub entry_price: String,
    pub current_price: String,
    pub market_value: String,
    pub unrealized_pl: String,
    pub unrealized_pl_pct: String,
}

/// Sidebar filters applied to the positions table before formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionFilter {
    /// Empty means every symbol.
    pub symbols: Vec<String>,
    pub min_market_value: Option<f64>,
    pub max_market_value: Option<f64>,
}

impl PositionFilter {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.min_market_value.is_none() && self.max_market_value.is_none()
    }

    pub fn matches(&self, position: &Position) -> bool {
        if !self.symbols.is_empty()
            && !self.symbols.iter().any(|s| s.eq_ignore_ascii_case(&position.symbol))
        {
            return false;
        }
        if let Some(min) = self.min_market_value {
            if position.market_value < min {
                return false;
            }
        }
        if let Some(max) = self.max_market_value {
            if position.market_value > max {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, positions: &[Position]) -> Vec<Position> {
        positions
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// Lowest and highest market value in the book, used to seed the range inputs.
pub fn market_value_bounds(positions: &[Position]) -> Option<(f64, f64)> {
    positions.iter().map(|p| p.market_value).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
