use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use memofee_core::api::ErrorBody;
use memofee_core::Error;

/// A failed request, rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    /// A server-side failure, logged and reported as `"<context>: <cause>"`
    pub fn internal(context: &str, err: Error) -> Self {
        tracing::error!("{}: {}", context, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{}: {}", context, err),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => Self::bad_request(message),
            Error::UrlParse(e) => Self::bad_request(format!("Not a valid URL: {}", e)),
            Error::NotFound(message) => Self::not_found(message),
            other => Self::internal("Request failed", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
