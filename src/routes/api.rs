use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{DashboardData, PositionRow};
use crate::services::dashboard_service::{self, DashboardQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/positions", get(get_positions))
}

async fn load(state: &AppState, raw: Option<&str>) -> Result<DashboardData, AppError> {
    let query = DashboardQuery::from_raw_query(raw)?;
    dashboard_service::build_dashboard(&state.data_source, &query, Utc::now().date_naive())
        .await
        .map_err(|e| {
            error!("Failed to build snapshot: {}", e);
            e
        })
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<DashboardData>, AppError> {
    info!("GET /api/snapshot - Building portfolio snapshot");
    load(&state, raw.as_deref()).await.map(Json)
}

pub async fn get_positions(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<PositionRow>>, AppError> {
    info!("GET /api/positions - Fetching formatted positions");
    let data = load(&state, raw.as_deref()).await?;
    Ok(Json(data.positions))
}
