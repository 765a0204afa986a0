//! Archivo fuente dentro de un `Artifact` y su máquina de estados de
//! compilación.
//!
//! Reglas:
//! - `sha256` se recalcula en CADA escritura de contenido.
//! - `is_solidity` se deriva de la extensión al crear el archivo (`.sol`,
//!   case-insensitive) y marca si participa en compilación.
//! - Una edición siempre invalida el resultado previo: `write_content` resetea
//!   `compilation` a `idle` aunque la última compilación haya sido exitosa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deployment::Deployment;
use crate::hashing::sha256_hex;

/// Estado terminal o transitorio de la compilación de un archivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilationStatus {
    Idle,
    Pending,
    Success,
    Failed,
}

/// Resultado de un run de compilación aplicable a un archivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Success,
    Failed(String),
}

/// Sub-entidad `{status, compiledAt, error}` persistida por archivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationState {
    pub status: CompilationStatus,
    pub compiled_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl CompilationState {
    /// Estado inicial (también el estado tras cualquier edición).
    pub fn idle(now: DateTime<Utc>) -> Self {
        Self { status: CompilationStatus::Idle,
               compiled_at: now,
               error: None }
    }

    /// Transición a `pending` al arrancar un run que incluye este archivo.
    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.status = CompilationStatus::Pending;
        self.compiled_at = now;
        self.error = None;
    }

    /// Aplica el resultado del run. Idempotente: aplicar dos veces el mismo
    /// outcome produce el mismo estado final.
    pub fn apply(&mut self, outcome: &CompileOutcome, now: DateTime<Utc>) {
        match outcome {
            CompileOutcome::Success => {
                self.status = CompilationStatus::Success;
                self.error = None;
            }
            CompileOutcome::Failed(msg) => {
                self.status = CompilationStatus::Failed;
                self.error = Some(msg.clone());
            }
        }
        self.compiled_at = now;
    }
}

/// Archivo fuente con digest e historial de despliegues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub sha256: String,
    pub is_solidity: bool,
    pub compilation: CompilationState,
    #[serde(default)]
    pub deployed_contracts: Vec<Deployment>,
}

impl SourceFile {
    /// Crea un archivo nuevo: deriva `is_solidity` de la extensión y calcula
    /// el digest inicial.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let is_solidity = path.to_lowercase().ends_with(".sol");
        Self { sha256: sha256_hex(&content),
               is_solidity,
               compilation: CompilationState::idle(Utc::now()),
               deployed_contracts: Vec::new(),
               path,
               content }
    }

    /// Escritura de contenido: recalcula el digest y, si el archivo es
    /// compilable, resetea la compilación a `idle` (una edición invalida
    /// cualquier resultado previo, incluso uno exitoso).
    pub fn write_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.sha256 = sha256_hex(&self.content);
        if self.is_solidity {
            self.compilation = CompilationState::idle(Utc::now());
        }
    }

    /// Reemplaza la lista completa de despliegues (no se mergea por address).
    pub fn replace_deployments(&mut self, deployments: Vec<Deployment>) {
        self.deployed_contracts = deployments;
    }
}
