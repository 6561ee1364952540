use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared between handlers and tests.
pub mod msg {
    pub const MISSING_NAME_OR_MONEY: &str = "Missing product name or money.";
    pub const INVALID_AMOUNT: &str = "Amount must be a positive number";
    pub const NAME_TOO_LONG: &str = "Product name is too long";
    pub const INVALID_PAYMENT_TYPE: &str = "Payment type must be 'alipay' or 'wxpay'";
    pub const GATEWAY_NOT_CONFIGURED: &str = "Payment gateway configuration is missing";
    pub const AUTH_NOT_CONFIGURED: &str = "Session verification is not configured";
    pub const ORDER_NOT_FOUND: &str = "Order not found";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Operator-correctable: a required setting is absent. Carries the
    /// user-facing message only, never a setting value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Amount mismatch: expected {expected}, got {received}")]
    AmountMismatch { expected: String, received: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::SignatureMismatch | AppError::AmountMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Configuration(_)
            | AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Emit the log line for this error at the level its class deserves.
    pub fn log(&self) {
        match self {
            AppError::Configuration(m) => tracing::error!("Configuration error: {}", m),
            AppError::SignatureMismatch => tracing::warn!("Rejected request: signature mismatch"),
            AppError::AmountMismatch { expected, received } => tracing::warn!(
                "Rejected request: amount mismatch (expected {}, received {})",
                expected,
                received
            ),
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Pool(e) => tracing::error!("Pool error: {}", e),
            AppError::Internal(m) => tracing::error!("Internal error: {}", m),
            AppError::Json(e) => tracing::debug!("JSON error: {}", e),
            AppError::NotFound(_) | AppError::BadRequest(_) | AppError::Unauthorized => {}
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let (error, details) = match &self {
            AppError::NotFound(m) => ("Not found", Some(m.clone())),
            AppError::BadRequest(m) => ("Bad request", Some(m.clone())),
            AppError::Unauthorized => ("Unauthorized", None),
            AppError::Configuration(m) => (m.as_str(), None),
            AppError::SignatureMismatch => ("Invalid signature", None),
            AppError::AmountMismatch { .. } => ("Amount mismatch", None),
            AppError::Json(e) => ("Invalid JSON", Some(e.to_string())),
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                ("Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `Option<T>` lookups into `AppError::NotFound`.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
