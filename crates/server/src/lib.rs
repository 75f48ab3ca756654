use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ValidationErrors};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener};

mod expenses;
mod server;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

/// Body of a 400 validation response: failures keyed by field.
#[derive(Serialize)]
struct FieldErrors {
    errors: ValidationErrors,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::IntegrityViolation(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Engine(EngineError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(FieldErrors { errors })).into_response()
            }
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let error = match err {
                    EngineError::Database(db_err) => {
                        tracing::error!("database error: {db_err}");
                        "internal server error".to_string()
                    }
                    other => other.to_string(),
                };
                (status, Json(Error { error })).into_response()
            }
            ServerError::Generic(error) => {
                (StatusCode::BAD_REQUEST, Json(Error { error })).into_response()
            }
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
