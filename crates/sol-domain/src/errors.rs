// errors.rs
use thiserror::Error;

/// Error personalizado del dominio para los artifacts Solidity
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    ValidationError(String),

    #[error("Ruta duplicada en el artifact: {0}")]
    DuplicatePath(String),

    #[error("Error de serialización: {0}")]
    SerializationError(String),
}

// Implementación de conversión desde serde_json::Error a DomainError
impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::SerializationError(e.to_string())
    }
}
