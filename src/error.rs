use crate::config::ConfigError;
use crate::diagnosis::{BatchError, DefinitionError, DiagnosisServiceError, RecommendationError};
use crate::telemetry::TelemetryError;
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
    Definition(DefinitionError),
    Recommendation(RecommendationError),
    Batch(BatchError),
    Diagnosis(DiagnosisServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Definition(err) => write!(f, "quiz definition error: {}", err),
            AppError::Recommendation(err) => write!(f, "recommendation client error: {}", err),
            AppError::Batch(err) => write!(f, "batch error: {}", err),
            AppError::Diagnosis(err) => write!(f, "diagnosis error: {}", err),
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
            AppError::Definition(err) => Some(err),
            AppError::Recommendation(err) => Some(err),
            AppError::Batch(err) => Some(err),
            AppError::Diagnosis(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Batch(_) | AppError::Diagnosis(_) => StatusCode::BAD_REQUEST,
            AppError::Recommendation(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Definition(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

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

impl From<DefinitionError> for AppError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

impl From<RecommendationError> for AppError {
    fn from(value: RecommendationError) -> Self {
        Self::Recommendation(value)
    }
}

impl From<BatchError> for AppError {
    fn from(value: BatchError) -> Self {
        Self::Batch(value)
    }
}

impl From<DiagnosisServiceError> for AppError {
    fn from(value: DiagnosisServiceError) -> Self {
        Self::Diagnosis(value)
    }
}
