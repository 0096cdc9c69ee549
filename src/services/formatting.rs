use crate::models::{AccountSnapshot, MetricCard, PortfolioMetrics, Position, PositionRow};

const NOT_AVAILABLE: &str = "n/a";

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Splits a value into (is_negative, "1,234.56"), so that -0.004 renders as positive zero.
fn grouped_abs(value: f64) -> (bool, String) {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let negative = value < 0.0 && rounded != "0.00";
    (negative, format!("{}.{}", group_thousands(int_part), frac))
}

/// `$15,550.00`, `-$525.00`.
pub fn format_currency(value: f64, prefix: &str) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (negative, body) = grouped_abs(value);
    format!("{}{}{}", if negative { "-" } else { "" }, prefix, body)
}

/// `+$525.00`, `-$12.30`.
pub fn format_signed_currency(value: f64, prefix: &str) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (negative, body) = grouped_abs(value);
    format!("{}{}{}", if negative { "-" } else { "+" }, prefix, body)
}

/// `+3.49%`, `-1.20%`, `+0.00%`.
pub fn format_signed_pct(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (negative, body) = grouped_abs(value);
    format!("{}{}%", if negative { "-" } else { "+" }, body)
}

/// `18.52%`
pub fn format_pct(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.2}%", value)
}

pub fn format_position(position: &Position, prefix: &str) -> PositionRow {
    PositionRow {
        symbol: position.symbol.clone(),
        quantity: position.quantity.to_string(),
        entry_price: format_currency(position.entry_price, prefix),
        current_price: format_currency(position.current_price, prefix),
        market_value: format_currency(position.market_value, prefix),
        unrealized_pl: format_currency(position.unrealized_pl, prefix),
        unrealized_pl_pct: format_signed_pct(position.unrealized_pl_pct),
    }
}

/// Display rows in input order, dollar-prefixed.
pub fn format_positions_table(positions: &[Position]) -> Vec<PositionRow> {
    format_positions_table_in(positions, "$")
}

pub fn format_positions_table_in(positions: &[Position], prefix: &str) -> Vec<PositionRow> {
    positions.iter().map(|p| format_position(p, prefix)).collect()
}

/// Cards for the metrics row. With an account the live layout is used (buying power),
/// without one the synthetic layout (return since start).
pub fn build_metric_cards(metrics: &PortfolioMetrics, account: Option<&AccountSnapshot>) -> Vec<MetricCard> {
    let prefix = account.map(|a| a.currency_prefix()).unwrap_or("$");
    let daily_pct = format_signed_pct(metrics.daily_change_pct);

    let mut cards = vec![
        MetricCard::new(
            "Portfolio Value",
            format_currency(metrics.current_value, prefix),
            Some(daily_pct.clone()),
        ),
        MetricCard::new(
            "Daily P&L",
            format_signed_currency(metrics.daily_change, prefix),
            Some(daily_pct),
        ),
    ];

    match account {
        Some(account) => {
            cards.push(MetricCard::new(
                "Total P&L",
                format_signed_currency(metrics.total_pl, prefix),
                Some(format_signed_pct(metrics.total_pl_pct)),
            ));
            cards.push(MetricCard::new(
                "Buying Power",
                format_currency(account.buying_power, prefix),
                None,
            ));
        }
        None => {
            cards.push(MetricCard::new(
                "Total Return",
                format_signed_currency(metrics.total_pl, prefix),
                Some(format_signed_pct(metrics.total_pl_pct)),
            ));
        }
    }

    if let Some(vol) = metrics.volatility {
        cards.push(MetricCard::new("Volatility (Ann.)", format_pct(vol), None));
    }

    cards
}
