use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use axum_valid::{ValidRejection, ValidationRejection};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    engine::{EngineError, ErrorKind},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The session engine rejected the command.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

impl From<ValidRejection<JsonRejection>> for AppError {
    fn from(rejection: ValidRejection<JsonRejection>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => errors.into(),
            ValidationRejection::Inner(rejection) => {
                AppError::BadRequest(format!("malformed body: {}", rejection.body_text()))
            }
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Engine(err) => {
                let message = err.to_string();
                match err.kind() {
                    ErrorKind::Capacity | ErrorKind::Conflict | ErrorKind::State => {
                        AppError::Conflict(message)
                    }
                    ErrorKind::NotFound => AppError::NotFound(message),
                    ErrorKind::Invalid => AppError::BadRequest(message),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn engine_errors_map_by_kind() {
        assert_eq!(
            status_of(EngineError::SessionFull { max_players: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::NameTaken("Ada".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(EngineError::NoPlayers.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(EngineError::UnknownPlayer(uuid::Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::InvalidName("blank").into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn validation_rejections_become_bad_requests() {
        let mut errors = ValidationErrors::new();
        errors.add("name", validator::ValidationError::new("length"));
        let err = AppError::from(ValidRejection::<JsonRejection>::Valid(errors));
        assert!(matches!(&err, AppError::BadRequest(message) if message.contains("name")));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_errors_are_service_unavailable() {
        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(StorageError::Closed.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
