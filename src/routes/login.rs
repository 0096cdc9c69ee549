use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::routes::session::{session_id, with_session_cookie};
use crate::services::access_gate::GateState;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(login_page).post(submit_login))
}

// No Debug on purpose: the password must never reach a log line.
#[derive(Deserialize)]
pub struct LoginForm {
    password: String,
}

async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, created) = state.sessions.resolve(session_id(&headers));
    let gate = state.sessions.state(id);

    if gate == GateState::Accepted {
        return Redirect::to("/").into_response();
    }

    info!("GET /login - Rendering password prompt ({:?})", gate);
    with_session_cookie(Html(views::render_login_page(gate)).into_response(), id, created)
}

async fn submit_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (id, created) = state.sessions.resolve(session_id(&headers));

    let (session, gate) = state.sessions.submit(id, form.password);

    let response = match gate {
        GateState::Accepted => {
            info!("🔓 POST /login - Session accepted ({} sessions held)", state.sessions.len());
            Redirect::to("/")
        }
        _ => {
            warn!("POST /login - {}", AppError::AuthenticationRejected);
            Redirect::to("/login")
        }
    };

    // Acceptance moves the session to a fresh id, so the cookie is reissued
    with_session_cookie(response.into_response(), session, created || session != id)
}
