//! sol-core: Pipeline de compilación Solidity (registro de compiladores,
//! resolución de imports, máquina de estados por archivo).
pub mod boundary;
pub mod deploy;
pub mod errors;
pub mod imports;
pub mod pipeline;
pub mod registry;
pub mod solc;
pub mod store;

pub use boundary::{ArtifactService, GeneratedFile, GeneratedProject};
pub use deploy::{DeployTarget, DeploymentRecord, DeploymentRecorder};
pub use errors::{classify_error, CoreError, ErrorClass};
pub use imports::{ImportResolution, ImportResolver, UrlFetcher};
pub use pipeline::{CompilationPipeline, CompileRequest};
pub use registry::{CompilerBackend, CompilerLoader, CompilerRegistry};
pub use solc::{default_settings, SolcDiagnostic, SolcInput, SolcOutput, SolcSource, SOLIDITY_LANGUAGE};
pub use store::{ArtifactStore, InMemoryArtifactStore};
