use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Missing or invalid x-owner-id header")]
    Unauthorized,
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Not-found must stay distinguishable from a storage failure: callers get
/// a 404 for the former and a 500 (with the detail logged, not leaked) for
/// the latter.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Ledger(LedgerError::Validation(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            AppError::Ledger(err @ LedgerError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            AppError::Ledger(LedgerError::Store(store_err)) => {
                tracing::error!(error = ?store_err, "Storage error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal storage error occurred".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid x-owner-id header".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
