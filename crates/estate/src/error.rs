use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::listings::{BillingError, ListingError, ListingServiceError, RepositoryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    /// Listing rule violation. The message is shown to clients unchanged.
    Rule(ListingError),
    /// Listing, offer, or catalog record that does not exist.
    NotFound,
    /// Record identity already taken in storage.
    Conflict,
    Storage(RepositoryError),
    Billing(BillingError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_)
            | AppError::Billing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Rule(err) => write!(f, "{}", err),
            AppError::NotFound => write!(f, "record not found"),
            AppError::Conflict => write!(f, "record already exists"),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Billing(err) => write!(f, "billing error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Rule(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Billing(err) => Some(err),
            AppError::NotFound | AppError::Conflict => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ListingServiceError> for AppError {
    fn from(value: ListingServiceError) -> Self {
        match value {
            ListingServiceError::Rule(err) => Self::Rule(err),
            ListingServiceError::Repository(RepositoryError::NotFound) => Self::NotFound,
            ListingServiceError::Repository(RepositoryError::Conflict) => Self::Conflict,
            ListingServiceError::Repository(err) => Self::Storage(err),
            ListingServiceError::Billing(err) => Self::Billing(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_failures_split_by_status() {
        let cases = [
            (
                ListingServiceError::Rule(ListingError::CancelSold),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ListingServiceError::Repository(RepositoryError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ListingServiceError::Repository(RepositoryError::Conflict),
                StatusCode::CONFLICT,
            ),
            (
                ListingServiceError::Repository(RepositoryError::Unavailable("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ListingServiceError::Billing(BillingError::Transport("offline".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }

    #[test]
    fn rule_messages_reach_clients_unprefixed() {
        let error = AppError::from(ListingServiceError::Rule(ListingError::SellCanceled));
        assert_eq!(error.to_string(), "Cancelled properties cannot be sold.");
        assert_eq!(AppError::NotFound.to_string(), "record not found");
    }
}
