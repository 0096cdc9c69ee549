use axum::extract::{RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tracing::{error, info};

use crate::services::dashboard_service::{self, DashboardQuery};
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard_page))
}

/// Renders the whole page. Failures end this render with an error block; the next request starts over.
async fn dashboard_page(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    info!("GET / - Rendering dashboard");

    let result = match DashboardQuery::from_raw_query(raw.as_deref()) {
        Ok(query) => dashboard_service::build_dashboard(&state.data_source, &query, Utc::now().date_naive())
            .await
            .map(|data| (query, data)),
        Err(e) => Err(e),
    };

    match result {
        Ok((query, data)) => Html(views::render_dashboard(&data, &query)).into_response(),
        Err(e) => {
            error!("Dashboard render failed: {}", e);
            (e.status_code(), Html(views::render_error_page(&e))).into_response()
        }
    }
}
