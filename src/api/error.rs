//! HTTP mapping of service errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::StorefrontError;

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::NoVariations | Self::InvalidStock(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::AttributeCreation { .. } | Self::ValueCreation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) | Self::Messaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
