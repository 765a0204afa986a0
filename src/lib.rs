//! SolFlow Rust Library
//!
//! Este crate actúa como la fachada del workspace:
//! - Expone `config` con la configuración global del proceso (env/.env).
//! - Re-exporta los tipos principales de los crates internos para clientes
//!   que quieran una sola dependencia.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;

pub use sol_core::{ArtifactService, CompilationPipeline, CompileRequest, CompilerRegistry, CoreError,
                   DeploymentRecorder, InMemoryArtifactStore};
pub use sol_domain::{Artifact, CompilationStatus, SourceFile};
pub use sol_engine::{RemoteSolcLoader, SolcBinary};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_display() {
        let e = CoreError::NotFound("artifact 42".into()).to_string();
        assert_eq!(e, "not found: artifact 42");
    }

    #[test]
    fn domain_hashing_expuesto() {
        assert_eq!(sol_domain::sha256_hex("").len(), 64);
    }
}
