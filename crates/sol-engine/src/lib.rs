//! sol-engine: puente al compilador nativo `solc`.
//!
//! El resto del sistema habla standard-JSON con un `CompilerBackend`
//! abstracto; este crate provee la implementación real sobre el binario
//! `solc` (proceso hijo, input por stdin) y el loader que descarga builds
//! versionados del registry remoto de releases.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use sol_core::{CompilerBackend, CoreError};

pub mod loader;
pub use loader::RemoteSolcLoader;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no se pudo ejecutar solc en {path}: {source}")]
    Spawn { path: String, source: std::io::Error },
    #[error("solc terminó con status {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },
    #[error("output de `solc --version` ilegible: {0}")]
    VersionParse(String),
}

impl From<EngineError> for CoreError {
    fn from(e: EngineError) -> Self {
        CoreError::Internal(e.to_string())
    }
}

/// Un build concreto de solc listo para compilar.
#[derive(Debug)]
pub struct SolcBinary {
    path: PathBuf,
    version_tag: String,
}

impl SolcBinary {
    /// Valida el binario consultando `--version` y captura su tag.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let out = Command::new(&path).arg("--version")
                                     .output()
                                     .map_err(|e| EngineError::Spawn { path: path.display().to_string(),
                                                                       source: e })?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        let version_tag = parse_version_tag(&stdout).ok_or_else(|| EngineError::VersionParse(stdout.to_string()))?;
        Ok(Self { path, version_tag })
    }

    /// Binario por defecto del proceso: `SOLC_BIN` o `solc` en el PATH.
    pub fn from_env() -> Result<Self, EngineError> {
        let path = std::env::var("SOLC_BIN").unwrap_or_else(|_| "solc".to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CompilerBackend for SolcBinary {
    fn version_tag(&self) -> &str {
        &self.version_tag
    }

    fn compile_standard(&self, input_json: &str) -> Result<String, CoreError> {
        let run = || -> Result<String, EngineError> {
            let mut child = Command::new(&self.path).arg("--standard-json")
                                                    .stdin(Stdio::piped())
                                                    .stdout(Stdio::piped())
                                                    .stderr(Stdio::piped())
                                                    .spawn()
                                                    .map_err(|e| EngineError::Spawn {
                                                        path: self.path.display().to_string(),
                                                        source: e,
                                                    })?;
            // stdin se cierra al dropear el handle; solc necesita EOF para arrancar
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input_json.as_bytes())
                     .map_err(|e| EngineError::Spawn { path: self.path.display().to_string(), source: e })?;
            }
            let out = child.wait_with_output()
                           .map_err(|e| EngineError::Spawn { path: self.path.display().to_string(), source: e })?;
            if !out.status.success() {
                return Err(EngineError::NonZeroExit { status: out.status.to_string(),
                                                      stderr: String::from_utf8_lossy(&out.stderr).to_string() });
            }
            Ok(String::from_utf8_lossy(&out.stdout).to_string())
        };
        run().map_err(CoreError::from)
    }
}

/// Extrae `v0.8.20` de un output tipo
/// `Version: 0.8.20+commit.a1b79de6.Linux.g++`.
fn parse_version_tag(version_output: &str) -> Option<String> {
    let line = version_output.lines().find(|l| l.trim_start().starts_with("Version:"))?;
    let raw = line.split(':').nth(1)?.trim();
    let semver = raw.split('+').next()?.trim();
    if semver.is_empty() {
        return None;
    }
    Some(format!("v{semver}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsea_el_tag_de_version() {
        let out = "solc, the solidity compiler commandline interface\nVersion: 0.8.20+commit.a1b79de6.Linux.g++\n";
        assert_eq!(parse_version_tag(out).as_deref(), Some("v0.8.20"));
    }

    #[test]
    fn version_ilegible_devuelve_none() {
        assert_eq!(parse_version_tag("garbage"), None);
    }

    #[test]
    fn binario_inexistente_falla_en_spawn() {
        let err = SolcBinary::new("/definitely/not/solc").unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }
}
