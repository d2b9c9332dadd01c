use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<netmon_core::error::StoreError> for AppError {
    fn from(err: netmon_core::error::StoreError) -> Self {
        use netmon_core::error::StoreError;
        match err {
            StoreError::NotFound(msg) => Self::not_found(msg),
            StoreError::InvalidRule(msg) => Self::bad_request(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<netmon_core::error::NetmonError> for AppError {
    fn from(err: netmon_core::error::NetmonError) -> Self {
        use netmon_core::error::NetmonError;
        match err {
            NetmonError::Store(store_err) => store_err.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<netmon_core::error::PollError> for AppError {
    fn from(err: netmon_core::error::PollError) -> Self {
        use netmon_core::error::PollError;
        match err {
            PollError::Store(store_err) => store_err.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
