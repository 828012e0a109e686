//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding. Every response body is JSON of the form
//! `{"message": "..."}`; sign-in redirects also carry `redirect`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use emporium_core::address::AddressError;
use emporium_core::cart::SignInRequired;
use emporium_core::catalog::ProductError;
use emporium_core::checkout::CheckoutError;
use emporium_core::pricing::PricingError;
use emporium_core::review::ReviewError;

use crate::db::RepositoryError;
use crate::db::addresses::AddressWriteError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// The caller did not identify themselves.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller must sign in first; `redirect` is the login URL.
    #[error("{message}")]
    SignInRequired { message: String, redirect: String },

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) | Self::SignInRequired { .. } => StatusCode::UNAUTHORIZED,
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
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) => "Internal server error".to_owned(),
            _ => self.to_string(),
        };
        let redirect = match &self {
            Self::SignInRequired { redirect, .. } => Some(redirect.as_str()),
            _ => None,
        };

        let body = ErrorBody {
            message: &message,
            redirect,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AddressWriteError> for AppError {
    fn from(err: AddressWriteError) -> Self {
        match err {
            AddressWriteError::Invalid(e) => e.into(),
            AddressWriteError::Repository(e) => e.into(),
        }
    }
}

impl From<SignInRequired> for AppError {
    fn from(err: SignInRequired) -> Self {
        Self::SignInRequired {
            message: err.to_string(),
            redirect: err.redirect,
        }
    }
}

macro_rules! bad_request_from {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for AppError {
                fn from(err: $err) -> Self {
                    Self::BadRequest(err.to_string())
                }
            }
        )+
    };
}

bad_request_from!(
    AddressError,
    ProductError,
    ReviewError,
    PricingError,
    CheckoutError,
);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
