//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meridian_core::processing::ProcessingError;
use meridian_shared::error::AppError;
use serde_json::json;
use tracing::warn;

/// Error type returned by all handlers.
///
/// Processing errors carry the core's stable error code; everything
/// else goes through the application-level [`AppError`].
#[derive(Debug)]
pub enum ApiError {
    /// An error from the banking service.
    Processing(ProcessingError),
    /// A request-level error (malformed input, etc.).
    App(AppError),
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        Self::Processing(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

fn processing_status(code: &str) -> StatusCode {
    match code {
        "not_found" => StatusCode::NOT_FOUND,
        "compliance_blocked" => StatusCode::FORBIDDEN,
        "insufficient_funds" | "account_inactive" | "limit_exceeded" => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        "not_eligible_for_confirmation" | "already_terminal" => StatusCode::CONFLICT,
        "self_transfer" | "invalid_destination" | "invalid_transition" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Processing(err) => {
                let code = err.code();
                (processing_status(code), code, err.to_string())
            }
            Self::App(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.error_code(), err.to_string())
            }
        };
        if status.is_server_error() {
            warn!(code, %message, "request failed");
        }
        let mut body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        // Sanctions blocks carry the compliance case reference callers
        // quote when disputing the block.
        if code == "compliance_blocked" {
            body["error"]["compliance_reference"] = json!("OFAC_BLOCKED");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_status_mapping() {
        assert_eq!(processing_status("not_found"), StatusCode::NOT_FOUND);
        assert_eq!(processing_status("compliance_blocked"), StatusCode::FORBIDDEN);
        assert_eq!(
            processing_status("insufficient_funds"),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(processing_status("already_terminal"), StatusCode::CONFLICT);
        assert_eq!(processing_status("invalid_destination"), StatusCode::BAD_REQUEST);
    }
}
