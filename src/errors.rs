use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::external::brokerage::BrokerageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Password incorrect")]
    AuthenticationRejected,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Rate limited by brokerage")]
    RateLimited,
    #[error("Data fetch failed: {0}")]
    DataFetch(BrokerageError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRejected | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::DataFetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = self.to_string();
        let body = Json(json!({ "code": status.as_u16(), "message": message }));

        match self {
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (status, headers, body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<BrokerageError> for AppError {
    fn from(value: BrokerageError) -> Self {
        match value {
            BrokerageError::RateLimited => AppError::RateLimited,
            other => AppError::DataFetch(other),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
