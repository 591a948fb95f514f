use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Contract ledger errors raised while reconciling deliveries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Contract not found: {0}")]
    ContractNotFound(i64),

    #[error("Insufficient remaining eggs on contract {contract_id}: remaining {remaining}, requested {requested}")]
    InsufficientBalance {
        contract_id: i64,
        remaining: i64,
        requested: i64,
    },

    #[error("Batch {batch_id} is not linked to contract {contract_id}")]
    BatchMismatch { batch_id: i64, contract_id: i64 },

    #[error("Eggs delivered must be positive, got {0}")]
    InvalidQuantity(i32),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Ledger(LedgerError::ContractNotFound(id)) => (
                StatusCode::BAD_REQUEST,
                "CONTRACT_NOT_FOUND",
                "Contract not found".to_string(),
                Some(serde_json::json!({"contract_id": id})),
            ),
            AppError::Ledger(LedgerError::InsufficientBalance {
                contract_id,
                remaining,
                requested,
            }) => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_BALANCE",
                "Insufficient remaining eggs".to_string(),
                Some(serde_json::json!({
                    "contract_id": contract_id,
                    "remaining_eggs": remaining,
                    "requested": requested,
                })),
            ),
            AppError::Ledger(LedgerError::BatchMismatch {
                batch_id,
                contract_id,
            }) => (
                StatusCode::BAD_REQUEST,
                "BATCH_MISMATCH",
                "Batch not linked to contract".to_string(),
                Some(serde_json::json!({
                    "batch_id": batch_id,
                    "contract_id": contract_id,
                })),
            ),
            AppError::Ledger(LedgerError::InvalidQuantity(value)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_QUANTITY",
                format!("Eggs delivered must be positive, got {}", value),
                None,
            ),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
            AppError::InvalidReference(message) => {
                (StatusCode::BAD_REQUEST, "INVALID_REFERENCE", message, None)
            }
            AppError::Conflict(message) => (StatusCode::BAD_REQUEST, "CONFLICT", message, None),
            AppError::InvalidInput(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT", message, None)
            }
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl AppError {
    /// Turn a unique-constraint violation into a `Conflict`, pass anything else through
    pub fn from_unique_violation(error: sqlx::Error, message: &str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(message.to_string())
            }
            _ => AppError::Database(error),
        }
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insufficient_balance_maps_to_bad_request() {
        let err = AppError::from(LedgerError::InsufficientBalance {
            contract_id: 7,
            remaining: 170,
            requested: 300,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "INSUFFICIENT_BALANCE");
        assert_eq!(body["details"]["remaining_eggs"], 170);
        assert_eq!(body["details"]["requested"], 300);
    }

    #[test]
    fn test_not_found_and_reference_statuses() {
        let not_found = AppError::NotFound("Batch not found".into()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_ref = AppError::InvalidReference("Customer not found".into()).into_response();
        assert_eq!(bad_ref.status(), StatusCode::BAD_REQUEST);

        let db = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
