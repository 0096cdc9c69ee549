use axum::extract::{OriginalUri, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "quantlogix_session";

/// Session id carried by the request's cookie header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: Uuid) -> HeaderValue {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    // A hyphenated UUID and the fixed attributes are always valid header bytes
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("quantlogix_session=; Path=/"))
}

/// Attach a `Set-Cookie` for a newly created session.
pub fn with_session_cookie(mut response: Response, id: Uuid, created: bool) -> Response {
    if created {
        response.headers_mut().append(SET_COOKIE, session_cookie(id));
    }
    response
}

/// Gate middleware: only ACCEPTED sessions get through.
///
/// Page requests are redirected to the login form, `/api` requests get a 401.
pub async fn require_access(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authenticated = session_id(request.headers())
        .map(|id| state.sessions.is_authenticated(id))
        .unwrap_or(false);

    if authenticated {
        return next.run(request).await;
    }

    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| request.uri().path());
    if path.starts_with("/api") {
        warn!("Rejected unauthenticated request to {}", path);
        AppError::Unauthorized.into_response()
    } else {
        debug!("Redirecting unauthenticated request for {} to /login", path);
        Redirect::to("/login").into_response()
    }
}
