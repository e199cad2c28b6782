use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{BadRequest, Conflict, Forbidden, InternalServer, NotFound, Unauthorized, Unavailable};

pub const RETRY_MESSAGE: &str = "Não foi possível completar a operação. Tente novamente.";

/// Validation failures of a form, one code per field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, &'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first error reported for a field.
    pub fn add(&mut self, field: &str, code: &'static str) {
        self.0.entry(field.to_string()).or_insert(code);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result(self, message: &str) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation {
                message: message.to_string(),
                errors: self,
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
    #[error("{message}")]
    BadRequest { message: String },
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    Unauthorized { message: String, redirect: String },
    #[error("{message}")]
    Forbidden { message: String },
    #[error("{message}")]
    Conflict { message: String },
    /// The data could not be fetched; the user should just try again.
    #[error("{message}")]
    Unavailable { message: String },
    #[error("{message} ({error})")]
    Internal { message: String, error: String },
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound { message: message.into() }
    }

    pub fn internal(message: impl Into<String>, error: impl ToString) -> Self {
        AppError::Internal {
            message: message.into(),
            error: error.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::not_found("Registro não encontrado"),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict {
                message: "Registro já existe".to_string(),
            },
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => AppError::BadRequest {
                message: "Registro referenciado não existe".to_string(),
            },
            e => AppError::internal("Error while accessing the database", e),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation { message, errors } => BadRequest!(message, "errors" => errors),
            AppError::BadRequest { message } => BadRequest!(message),
            AppError::NotFound { message } => NotFound!(message),
            AppError::Unauthorized { message, redirect } => {
                Unauthorized!(message, "redirect" => redirect)
            }
            AppError::Forbidden { message } => Forbidden!(message),
            AppError::Conflict { message } => Conflict!(message),
            AppError::Unavailable { message } => Unavailable!(message),
            AppError::Internal { message, error: e } => {
                error!("{}: {}", message, e);
                InternalServer!(RETRY_MESSAGE)
            }
        }
    }
}
