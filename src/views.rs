//! Server-rendered pages. Every dynamic string goes through `escape_html`.

use std::fmt::Write;

use crate::errors::AppError;
use crate::models::{DashboardData, MetricCard, Period, PositionRow};
use crate::services::access_gate::GateState;
use crate::services::chart;
use crate::services::dashboard_service::DashboardQuery;

pub const APP_TITLE: &str = "QuantLogix";

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; display: flex; color: #1f2933; }
aside { width: 260px; min-height: 100vh; background: #f5f7fa; padding: 1rem; box-sizing: border-box; }
main { flex: 1; padding: 1.5rem 2rem; }
.status { padding: .5rem .75rem; border-radius: 6px; margin-bottom: .75rem; }
.status.ok { background: #e6f4ea; color: #1e4620; }
.status.degraded { background: #fff4e5; color: #663c00; }
.badge { display: inline-block; padding: .2rem .5rem; border-radius: 4px; background: #e3e8ef; font-size: .85rem; }
.metrics { display: flex; gap: 1rem; margin: 1rem 0; flex-wrap: wrap; }
.card { border: 1px solid #e3e8ef; border-radius: 8px; padding: .75rem 1rem; min-width: 160px; }
.card .label { font-size: .85rem; color: #52606d; }
.card .value { font-size: 1.4rem; font-weight: 600; }
.delta.up { color: #2e7d32; } .delta.down { color: #c62828; }
.periods a { margin-right: .5rem; text-decoration: none; padding: .2rem .5rem; border-radius: 4px; }
.periods a.active { background: #1f2933; color: #fff; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
th, td { text-align: right; padding: .4rem .6rem; border-bottom: 1px solid #e3e8ef; }
th:first-child, td:first-child { text-align: left; }
.features { display: flex; gap: 1rem; flex-wrap: wrap; margin: 1rem 0; }
.feature { background: #e8f1fb; border-radius: 8px; padding: .75rem 1rem; flex: 1; min-width: 180px; }
.warning { background: #fff4e5; border-left: 4px solid #ff9800; padding: .5rem 1rem; margin: .5rem 0; }
.error { background: #fdecea; border-left: 4px solid #c62828; padding: .75rem 1rem; margin: .5rem 0; }
.login { max-width: 360px; margin: 10vh auto; }
"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        body = body,
    )
}

/// Masked password prompt; after a failed attempt it also shows the error line.
pub fn render_login_page(state: GateState) -> String {
    let error = if state == GateState::Rejected {
        r#"<div class="error">😕 Password incorrect</div>"#
    } else {
        ""
    };

    let body = format!(
        r#"<main class="login">
<h1>📈 {title}</h1>
<form method="post" action="/login">
<label for="password">Please enter the password</label><br>
<input id="password" type="password" name="password" autocomplete="current-password" autofocus>
<button type="submit">Enter</button>
</form>
{error}
</main>"#,
        title = APP_TITLE,
        error = error,
    );
    layout(APP_TITLE, &body)
}

/// Shown when a render cannot complete. The process keeps serving; the next render starts fresh.
pub fn render_error_page(err: &AppError) -> String {
    let body = format!(
        r#"<main>
<h1>{title}</h1>
<div class="error"><strong>Unable to load portfolio data.</strong><br><code>{detail}</code></div>
<p><a href="/">Retry</a></p>
</main>"#,
        title = APP_TITLE,
        detail = escape_html(&err.to_string()),
    );
    layout(APP_TITLE, &body)
}

fn query_string(period: Period, query: &DashboardQuery) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    ser.append_pair("period", period.label());
    for symbol in &query.filter.symbols {
        ser.append_pair("symbols", symbol);
    }
    if let Some(min) = query.filter.min_market_value {
        ser.append_pair("min_value", &min.to_string());
    }
    if let Some(max) = query.filter.max_market_value {
        ser.append_pair("max_value", &max.to_string());
    }
    ser.finish()
}

fn render_card(card: &MetricCard) -> String {
    let delta = match &card.delta {
        Some(delta) => {
            let class = if delta.starts_with('-') { "down" } else { "up" };
            format!(r#"<div class="delta {}">{}</div>"#, class, escape_html(delta))
        }
        None => String::new(),
    };
    format!(
        r#"<div class="card"><div class="label">{}</div><div class="value">{}</div>{}</div>"#,
        escape_html(&card.label),
        escape_html(&card.value),
        delta
    )
}

fn render_table(rows: &[PositionRow]) -> String {
    if rows.is_empty() {
        return r#"<p>No positions match the current filters.</p>"#.to_string();
    }

    let mut html = String::from(
        "<table><thead><tr><th>Symbol</th><th>Quantity</th><th>Entry Price</th><th>Current Price</th>\
         <th>Market Value</th><th>Unrealized P&amp;L</th><th>Unrealized P&amp;L %</th></tr></thead><tbody>",
    );
    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.symbol),
            escape_html(&row.quantity),
            escape_html(&row.entry_price),
            escape_html(&row.current_price),
            escape_html(&row.market_value),
            escape_html(&row.unrealized_pl),
            escape_html(&row.unrealized_pl_pct),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn render_sidebar(data: &DashboardData, query: &DashboardQuery) -> String {
    let status = if data.is_degraded() {
        r#"<div class="status degraded">⚠️ System Status: Degraded</div>"#
    } else {
        r#"<div class="status ok">✅ System Status: Operational</div>"#
    };

    let account = match &data.account {
        Some(account) => format!(
            "<p>Account: {} ({})</p>",
            escape_html(&account.status),
            escape_html(&account.currency)
        ),
        None => String::new(),
    };

    let mut options = String::new();
    for symbol in &data.available_symbols {
        let selected = if query.filter.symbols.iter().any(|s| s == symbol) {
            " selected"
        } else {
            ""
        };
        let symbol = escape_html(symbol);
        let _ = write!(options, r#"<option value="{0}"{1}>{0}</option>"#, symbol, selected);
    }

    let (lo, hi) = data.market_value_bounds.unwrap_or((0.0, 0.0));
    let min_value = query.filter.min_market_value.map(|v| v.to_string()).unwrap_or_default();
    let max_value = query.filter.max_market_value.map(|v| v.to_string()).unwrap_or_default();

    format!(
        r#"<aside>
{status}
<p><span class="badge">{source}</span></p>
{account}
<form method="get" action="/">
<input type="hidden" name="period" value="{period}">
<label for="symbols">Symbols</label><br>
<select id="symbols" name="symbols" multiple size="6">{options}</select><br>
<label>Market value</label><br>
<input type="number" step="any" name="min_value" placeholder="{lo:.0}" value="{min_value}">
<input type="number" step="any" name="max_value" placeholder="{hi:.0}" value="{max_value}"><br>
<button type="submit">Apply filters</button>
</form>
</aside>"#,
        status = status,
        source = data.source.label(),
        account = account,
        period = data.period.label(),
        options = options,
        lo = lo.floor(),
        hi = hi.ceil(),
        min_value = escape_html(&min_value),
        max_value = escape_html(&max_value),
    )
}

const INTRO: &str = r#"<section class="features">
<div class="feature">📊 Real-time Portfolio Tracking</div>
<div class="feature">🤖 Automated Trading</div>
<div class="feature">📈 Market Analytics</div>
</section>
<h2>Getting Started</h2>
<ol class="getting-started">
<li>Connect your Alpaca trading account</li>
<li>Set up your trading preferences</li>
<li>Monitor your portfolio performance</li>
<li>Start automated trading</li>
</ol>"#;

pub fn render_dashboard(data: &DashboardData, query: &DashboardQuery) -> String {
    let warnings: String = data
        .warnings
        .iter()
        .map(|w| format!(r#"<div class="warning">{}</div>"#, escape_html(w)))
        .collect();

    let cards: String = data.cards.iter().map(render_card).collect();

    let mut periods = String::new();
    for period in Period::ALL_PERIODS {
        let class = if period == data.period { r#" class="active""# } else { "" };
        let _ = write!(
            periods,
            r#"<a href="/?{}"{}>{}</a>"#,
            escape_html(&query_string(period, query)),
            class,
            period.label()
        );
    }

    let body = format!(
        r#"{sidebar}
<main>
<h1>📈 Welcome to {title}</h1>
<p>Your trusted platform for algorithmic trading and portfolio management.</p>
{intro}
{warnings}
<section class="metrics">{cards}</section>
<h2>Performance</h2>
<nav class="periods">{periods}</nav>
{chart}
<h2>Positions</h2>
{table}
</main>"#,
        sidebar = render_sidebar(data, query),
        title = APP_TITLE,
        intro = INTRO,
        warnings = warnings,
        cards = cards,
        periods = periods,
        chart = chart::render_equity_chart(&data.chart),
        table = render_table(&data.positions),
    );
    layout(&format!("{} Dashboard", APP_TITLE), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::brokerage::BrokerageError;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>"A&B"</b>'"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;&#39;");
    }

    #[test]
    fn test_login_page_states() {
        let first = render_login_page(GateState::NotSubmitted);
        assert!(first.contains(r#"type="password""#));
        assert!(!first.contains("Password incorrect"));

        let rejected = render_login_page(GateState::Rejected);
        assert!(rejected.contains("Password incorrect"));
    }

    #[test]
    fn test_error_page_escapes_diagnostics() {
        let err = AppError::DataFetch(BrokerageError::BadResponse("<html>502</html>".into()));
        let html = render_error_page(&err);
        assert!(html.contains("Unable to load portfolio data"));
        assert!(html.contains("&lt;html&gt;502"));
        assert!(!html.contains("<html>502"));
    }

    #[test]
    fn test_period_links_keep_filters() {
        let query = DashboardQuery::from_raw_query(Some("symbols=AAPL&min_value=10")).unwrap();
        let qs = query_string(Period::OneYear, &query);
        assert_eq!(qs, "period=1Y&symbols=AAPL&min_value=10");
    }
}
