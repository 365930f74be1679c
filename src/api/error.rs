// =============================================================================
// API Error — uniform JSON error responses
// =============================================================================
//
// Every failing endpoint answers with `{"error": "<message>"}` and an
// appropriate status code. Handlers return `ApiResult<T>` and convert upstream
// failures with the constructors below; the `?` operator does the rest.
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Map a brokerage API failure the way the trading endpoints present it: a
/// permission denial becomes a clean 403 with remediation advice, anything
/// else a 500 carrying `prefix` plus the upstream error text.
pub fn alpaca_api_error(prefix: &str, e: anyhow::Error) -> ApiError {
    let text = format!("{e:#}");
    if text.contains("403") {
        ApiError::new(
            StatusCode::FORBIDDEN,
            "Alpaca Trading API denied. Check your API key permissions.",
        )
    } else {
        ApiError::internal(format!("{prefix}: {text}"))
    }
}
