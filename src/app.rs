use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::routes::{api, dashboard, health, login, session};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    // Everything past the password prompt
    let protected = Router::<AppState>::new()
        .merge(dashboard::router())
        .nest("/api", api::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_access));

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/login", login::router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
