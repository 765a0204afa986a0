//! sol-domain: entidades persistidas del dominio Solidity.
//!
//! Este crate define el modelo durable sobre el que trabaja el resto del
//! sistema:
//! - `Artifact`: proyecto guardado (colección de archivos fuente de un owner).
//! - `SourceFile`: archivo fuente con digest de contenido y estado de
//!   compilación.
//! - `CompilationState` / `CompilationStatus`: máquina de estados por archivo
//!   (`idle` → `pending` → `success`/`failed`).
//! - `Deployment`: registro inmutable de un despliegue on-chain.
//!
//! La invariante central vive aquí: una edición de contenido invalida
//! cualquier resultado de compilación previo (ver `SourceFile::write_content`).

pub mod artifact;
pub mod deployment;
pub mod errors;
pub mod file;
pub mod hashing;

pub use artifact::{Artifact, ArtifactSummary};
pub use deployment::Deployment;
pub use errors::DomainError;
pub use file::{CompilationState, CompilationStatus, CompileOutcome, SourceFile};
pub use hashing::sha256_hex;
