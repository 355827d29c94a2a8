use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::ValidationErrors;

use crate::store::StoreError;
use crate::utils::validation::field_messages;

/// JSON envelope shared by every REST endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: Some(data),
            errors: None,
        }
    }

    /// Create an error response
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<serde_json::Value>,
    ) -> Self {
        ApiResponse {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: None,
            errors,
        }
    }
}

impl ApiResponse<()> {
    /// Store failures share one user-facing message per operation; the cause
    /// goes to the log and the `errors` field.
    pub fn store_failure(message: &str, err: &StoreError) -> Self {
        tracing::error!(error = %err, "{message}");
        ApiResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            Some(json!({ "error": err.to_string() })),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiResponse::error(StatusCode::NOT_FOUND, message, None)
    }
}

/// 400 naming the first offending field (alphabetical) plus every field's
/// messages under `fields`.
impl From<ValidationErrors> for ApiResponse<()> {
    fn from(errors: ValidationErrors) -> Self {
        let fields = field_messages(&errors);
        let (field, error) = fields
            .iter()
            .next()
            .map(|(field, messages)| (field.clone(), messages.join("; ")))
            .unwrap_or_default();
        tracing::debug!(field = %field, error = %error, "rejected submission");
        ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Missing Information",
            Some(json!({ "field": field, "error": error, "fields": fields })),
        )
    }
}

impl From<JsonRejection> for ApiResponse<()> {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "unreadable submission");
        ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Missing Information",
            Some(json!({ "error": rejection.body_text() })),
        )
    }
}
