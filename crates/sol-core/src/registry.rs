//! Registro de compiladores versionados con cache de vida de proceso.
//!
//! Responsabilidad: mapear un identificador de versión (o su ausencia) a un
//! backend usable sin recargar una versión ya cargada. La carga remota es
//! cara (descarga de un build), así que:
//! - la cache es process-wide y nunca evicta (tradeoff aceptado: la
//!   diversidad de versiones por proceso es pequeña);
//! - cargas concurrentes de la MISMA key colapsan en una sola
//!   (`tokio::sync::OnceCell` por entrada);
//! - una carga fallida NO queda cacheada: la celda queda vacía y un request
//!   posterior puede reintentar.
//!
//! La key de cache es el string ORIGINAL del caller, no el tag normalizado:
//! `"0.8.20"` y `"v0.8.20"` producen dos entradas independientes. Es el
//! comportamiento heredado del sistema original y se conserva a propósito
//! (ver DESIGN.md).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use tokio::sync::OnceCell;

use crate::errors::CoreError;

/// Backend de compilación cargado. `compile_standard` es sincrónico y puede
/// bloquear un rato largo; el pipeline lo despacha vía `spawn_blocking`.
pub trait CompilerBackend: Send + Sync {
    /// Tag de versión del build (`v0.8.20`), informativo.
    fn version_tag(&self) -> &str;

    /// Compila un input standard-JSON y devuelve el output standard-JSON
    /// crudo (string) tal como lo emitió el compilador.
    fn compile_standard(&self, input_json: &str) -> Result<String, CoreError>;
}

impl std::fmt::Debug for dyn CompilerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerBackend")
            .field("version_tag", &self.version_tag())
            .finish()
    }
}

/// Carga remota de un build de compilador para un tag normalizado.
///
/// Fallos esperables:
/// - `CompilerNotFound`: el índice de releases no tiene ese tag.
/// - `CompilerLoad`: fallo de red/transporte.
///
/// Ninguno es reintentable por el registry; decide el caller.
#[async_trait]
pub trait CompilerLoader: Send + Sync {
    async fn load(&self, version_tag: &str) -> Result<Arc<dyn CompilerBackend>, CoreError>;
}

type CachedBackend = Arc<OnceCell<Arc<dyn CompilerBackend>>>;

pub struct CompilerRegistry {
    default_backend: Arc<dyn CompilerBackend>,
    loader: Arc<dyn CompilerLoader>,
    cache: DashMap<String, CachedBackend>,
}

impl CompilerRegistry {
    pub fn new(default_backend: Arc<dyn CompilerBackend>, loader: Arc<dyn CompilerLoader>) -> Self {
        Self { default_backend,
               loader,
               cache: DashMap::new() }
    }

    /// Normaliza `"0.8.20"` / `"v0.8.20"` al tag canónico `v0.8.20`.
    pub fn normalize_version(version: &str) -> String {
        if version.starts_with('v') {
            version.to_string()
        } else {
            format!("v{version}")
        }
    }

    /// Resuelve un backend para la versión pedida.
    ///
    /// `None` devuelve el backend built-in del proceso sin tocar el loader
    /// (sin acceso a red). `Some(v)` consulta la cache y, en miss, delega la
    /// carga al loader compartiendo el resultado entre requests concurrentes.
    pub async fn resolve(&self, version: Option<&str>) -> Result<Arc<dyn CompilerBackend>, CoreError> {
        let Some(version) = version else {
            return Ok(self.default_backend.clone());
        };

        let cell = self.cache
                       .entry(version.to_string())
                       .or_insert_with(|| Arc::new(OnceCell::new()))
                       .clone();

        let tag = Self::normalize_version(version);
        let backend = cell.get_or_try_init(|| async {
                              debug!("compiler cache miss: key={version} tag={tag}");
                              self.loader.load(&tag).await
                          })
                          .await?;
        Ok(backend.clone())
    }

    /// Cantidad de entradas cacheadas (observabilidad/tests).
    pub fn cached_versions(&self) -> usize {
        self.cache.len()
    }
}
