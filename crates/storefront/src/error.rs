//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies use the same shape as the commerce API:
//! `{ "error": { "message": "...", "type": "..." } }`.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::commerce::ErrorKind;
use crate::preferences::PreferenceError;
use crate::sync::SyncError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart controller operation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Preference storage failed.
    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON request body whose rejections use the `AppError` body shape.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Sync(SyncError::InvalidQuantity(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Sync(SyncError::Gateway(e)) => match e.kind() {
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
                ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            },
            Self::Sync(SyncError::Closed) | Self::Preference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    const fn error_type(&self) -> &'static str {
        match self {
            Self::Sync(SyncError::InvalidQuantity(_)) | Self::BadRequest(_) => "bad_request",
            Self::Sync(SyncError::Gateway(e)) => match e.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::Authorization => "authorization",
                ErrorKind::Transport => "transport",
            },
            Self::Sync(SyncError::Closed) | Self::Preference(_) => "internal",
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Sync(SyncError::Closed) | Self::Preference(_) => {
                "Internal server error".to_string()
            }
            Self::Sync(SyncError::Gateway(e)) => e.user_message(),
            Self::Sync(e @ SyncError::InvalidQuantity(_)) => e.to_string(),
            Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = json!({
            "error": {
                "message": self.client_message(),
                "type": self.error_type(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "prod_123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode as HttpStatus;
    use cartsync_core::QuantityError;

    use super::*;
    use crate::commerce::GatewayError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    fn gateway(status: u16, body: &str) -> AppError {
        AppError::Sync(SyncError::Gateway(GatewayError::from_response(
            HttpStatus::from_u16(status).unwrap_or(HttpStatus::INTERNAL_SERVER_ERROR),
            body,
        )))
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");

        let err = AppError::Sync(SyncError::InvalidQuantity(QuantityError::Zero));
        assert_eq!(err.to_string(), "Invalid quantity: quantity must be at least 1 (got 0)");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Sync(SyncError::InvalidQuantity(
                QuantityError::Negative(-1)
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(gateway(422, r#"{"error":{"message":"Out of stock","type":"validation"}}"#)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(get_status(gateway(401, "")), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(gateway(503, "")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            get_status(AppError::Sync(SyncError::Closed)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("EOF while parsing".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_client_message_hides_internals() {
        assert_eq!(
            AppError::Sync(SyncError::Closed).client_message(),
            "Internal server error"
        );
        assert_eq!(
            gateway(422, r#"{"error":{"message":"Out of stock","type":"validation"}}"#)
                .client_message(),
            "Out of stock"
        );
    }
}
