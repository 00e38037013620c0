use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use station_catalog::CatalogError;
use station_purchase::PurchaseError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    NotFoundError(String),
    ConflictError(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        let msg = err.to_string();
        match err {
            PurchaseError::InvalidUser => Self::AuthenticationError(msg),
            PurchaseError::OfferNotFound(_) => Self::NotFoundError(msg),
            PurchaseError::InsufficientFunds(_) => Self::ConflictError(msg),
            PurchaseError::StorageFailure(_) | PurchaseError::TimedOut(_) => {
                Self::InternalServerError(msg)
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            CatalogError::Io(_) | CatalogError::Malformed(_) => {
                Self::InternalServerError(err.to_string())
            }
        }
    }
}
