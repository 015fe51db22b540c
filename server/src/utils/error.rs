use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::booking::BookingError;
use crate::cards::CardError;
use crate::catalog::CatalogError;
use crate::models::SeatCoordinate;
use crate::pricing::PricingError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        seats: Vec<SeatCoordinate>,
    },

    #[error("Storage error")]
    StorageError(#[from] StoreError),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::Conflict { message, seats } => {
                warn!(?seats, message = %message, "Seat conflict");
            }
            AppError::StorageError(e) => {
                error!(error = ?e, "Storage error");
            }
            AppError::InternalServerError(msg) => {
                error!(message = %msg, "Internal error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Storage and internal details stay in the logs.
        let (public_message, details) = match self {
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => (msg, None),
            AppError::Conflict { message, seats } => {
                let seats: Vec<String> = seats.iter().map(ToString::to_string).collect();
                (message, Some(json!({ "seats": seats })))
            }
            AppError::StorageError(_) => (
                "A storage error occurred, please retry".to_string(),
                None,
            ),
            AppError::InternalServerError(_) => ("Internal server error".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MovieNotFound(_)
            | CatalogError::ShowtimeNotFound(_)
            | CatalogError::PriceSheetNotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::InvalidTime(_) | CatalogError::Invalid(_) => {
                AppError::ValidationError(err.to_string())
            }
            CatalogError::Store(e) => AppError::StorageError(e),
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ShowtimeNotFound(_)
            | PricingError::PriceSheetNotFound(_)
            | PricingError::PromotionNotFound(_) => AppError::NotFound(err.to_string()),
            PricingError::DuplicatePromotion(_) => AppError::Conflict {
                message: err.to_string(),
                seats: Vec::new(),
            },
            PricingError::Invalid(_) | PricingError::Overflow(_) => {
                AppError::ValidationError(err.to_string())
            }
            PricingError::Store(e) => AppError::StorageError(e),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::NotFound(msg) => AppError::NotFound(msg),
            BookingError::Conflict(seats) => AppError::Conflict {
                message: "Seat no longer available, please reselect".to_string(),
                seats,
            },
            BookingError::Storage(e) => AppError::StorageError(e),
        }
    }
}

impl From<CardError> for AppError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::NotFound(_) => AppError::NotFound(err.to_string()),
            CardError::Invalid(_) | CardError::LimitReached(_) => {
                AppError::ValidationError(err.to_string())
            }
            CardError::Crypto(e) => AppError::InternalServerError(e.to_string()),
            CardError::Store(e) => AppError::StorageError(e),
        }
    }
}
