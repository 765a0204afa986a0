//! Errores específicos del core (taxonomía del pipeline).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreError {
    #[error("invalid request: {0}")] InvalidRequest(String),
    #[error("not found: {0}")] NotFound(String),
    #[error("compiler version not found: {0}")] CompilerNotFound(String),
    #[error("compiler load failed: {0}")] CompilerLoad(String),
    #[error("compile already in flight for artifact {0}")] Conflict(String),
    #[error("internal: {0}")] Internal(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Internal(format!("json: {e}"))
    }
}

impl From<sol_domain::DomainError> for CoreError {
    fn from(e: sol_domain::DomainError) -> Self {
        match e {
            sol_domain::DomainError::DuplicatePath(p) => CoreError::InvalidRequest(format!("duplicate path: {p}")),
            other => CoreError::InvalidRequest(other.to_string()),
        }
    }
}

/// Clasificación gruesa para logging y política de reintentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Retryable,
    Transient,
    Internal,
}

/// Mapea un `CoreError` a su clase (estable en el tiempo; usado por la capa
/// de persistencia y por los logs del pipeline).
pub fn classify_error(e: &CoreError) -> ErrorClass {
    match e {
        CoreError::InvalidRequest(_) => ErrorClass::Validation,
        CoreError::NotFound(_) | CoreError::CompilerNotFound(_) => ErrorClass::NotFound,
        CoreError::Conflict(_) => ErrorClass::Retryable,
        CoreError::CompilerLoad(_) => ErrorClass::Transient,
        CoreError::Internal(_) => ErrorClass::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_es_estable() {
        assert_eq!(classify_error(&CoreError::Conflict("x".into())), ErrorClass::Retryable);
        assert_eq!(classify_error(&CoreError::InvalidRequest("x".into())), ErrorClass::Validation);
        assert_eq!(classify_error(&CoreError::CompilerLoad("x".into())), ErrorClass::Transient);
    }
}
