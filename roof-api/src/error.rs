//! Error type shared by all handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roof_core::RepositoryError;
use roof_core::estimation::{ControllerError, GeometryError};
use roof_core::quote::QuoteError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(msg) = &self {
            tracing::error!(error = %msg, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound("Registro no encontrado".to_string()),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<GeometryError> for ApiError {
    fn from(err: GeometryError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::Geometry(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidTaxRate(_) => ApiError::Internal(err.to_string()),
            QuoteError::UnknownProduct(_)
            | QuoteError::CoatingNotPerSquareFoot(_)
            | QuoteError::Overflow => ApiError::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn repository_errors_map_to_http_statuses() {
        assert_eq!(ApiError::from(RepositoryError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(RepositoryError::Conflict("slug taken".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RepositoryError::Database("disk I/O error".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_pass_the_raw_message_through() {
        let err = ApiError::from(RepositoryError::Database("disk I/O error".to_string()));

        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }

    #[test]
    fn bad_geometry_is_a_client_error() {
        let err = ApiError::from(ControllerError::Geometry(GeometryError::TooFewVertices(2)));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_quote_product_is_a_client_error() {
        let err = ApiError::from(QuoteError::UnknownProduct("skylight".to_string()));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("skylight"));
    }

    #[test]
    fn quote_overflow_is_a_bad_request() {
        let err = ApiError::from(QuoteError::Overflow);

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
