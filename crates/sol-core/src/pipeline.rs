//! Orquestación de UNA corrida de compilación de punta a punta.
//!
//! Contrato central: pase lo que pase (fallo del loader, output malformado,
//! panic del backend), ningún archivo queda en `pending`. El pipeline marca
//! `pending` y persiste ANTES de invocar el compilador (la corrida en vuelo
//! es observable de inmediato) y SIEMPRE cierra con `success`/`failed` antes
//! de devolver el control.
//!
//! Concurrencia: a lo sumo una corrida en vuelo por artifact. El lock es
//! `try_lock`: el perdedor recibe `Conflict` (retryable) en vez de encolarse,
//! así dos corridas nunca intercalan sus escrituras `pending` → resultado.
//!
//! Imports: el callback sincrónico del compilador se puentea al resolver
//! asíncrono con un loop de resolve-and-retry: se compila, se extraen los
//! `Source "X" not found`, se resuelven en paralelo lógico y se reinvoca con
//! los sources ampliados hasta que no haya progreso o se agote el tope de
//! rounds.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, error, warn};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use sol_domain::CompileOutcome;

use crate::errors::{classify_error, CoreError};
use crate::imports::{HttpFetcher, ImportResolution, ImportResolver, UrlFetcher};
use crate::registry::{CompilerBackend, CompilerRegistry};
use crate::solc::{default_settings, SolcInput, SolcOutput, SolcSource};
use crate::store::ArtifactStore;

/// Tope de rounds de resolución de imports por corrida.
const MAX_IMPORT_ROUNDS: usize = 32;

/// Request de compilación tal como llega del boundary externo.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub version: Option<String>,
    pub sources: IndexMap<String, String>,
    /// Reemplaza por completo los settings por defecto si está presente.
    pub settings: Option<Value>,
}

pub struct CompilationPipeline<S> {
    store: Arc<S>,
    registry: Arc<CompilerRegistry>,
    fetcher: Arc<dyn UrlFetcher>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<S: ArtifactStore> CompilationPipeline<S> {
    pub fn new(store: Arc<S>, registry: Arc<CompilerRegistry>) -> Self {
        Self::with_fetcher(store, registry, Arc::new(HttpFetcher::new()))
    }

    /// Variante con fetcher inyectable (tests sin red).
    pub fn with_fetcher(store: Arc<S>, registry: Arc<CompilerRegistry>, fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self { store,
               registry,
               fetcher,
               locks: DashMap::new() }
    }

    /// Ejecuta exactamente una corrida y deja el estado del artifact
    /// consistente con el resultado.
    pub async fn compile(&self, artifact_id: Uuid, request: CompileRequest) -> Result<SolcOutput, CoreError> {
        if request.sources.is_empty() {
            return Err(CoreError::InvalidRequest("provide sources map: { \"A.sol\": \"...\" }".into()));
        }

        let lock = self.locks
                       .entry(artifact_id)
                       .or_insert_with(|| Arc::new(Mutex::new(())))
                       .clone();
        let _guard = lock.try_lock()
                         .map_err(|_| CoreError::Conflict(artifact_id.to_string()))?;

        let mut artifact = self.store.load(artifact_id).await?;

        // Transición a pending persistida ANTES de la invocación lenta: la
        // corrida en vuelo es observable por otros lectores de inmediato.
        artifact.mark_all_pending(Utc::now());
        self.store.save(&artifact).await?;

        match self.run_compiler(&request).await {
            Ok(output) => {
                let outcome = if output.has_errors() {
                    CompileOutcome::Failed(output.error_messages().join("\n"))
                } else {
                    CompileOutcome::Success
                };
                artifact.mark_all_result(&outcome, Utc::now());
                self.store.save(&artifact).await?;
                debug!("compile artifact={artifact_id} outcome={}",
                       if output.has_errors() { "failed" } else { "success" });
                Ok(output)
            }
            Err(err) => {
                // Un error lanzado nunca puede dejar archivos en pending.
                warn!("compile artifact={artifact_id} error={err} class={:?}", classify_error(&err));
                artifact.mark_all_result(&CompileOutcome::Failed(err.to_string()), Utc::now());
                if let Err(save_err) = self.store.save(&artifact).await {
                    error!("no se pudo persistir el estado failed de {artifact_id}: {save_err}");
                }
                Err(err)
            }
        }
    }

    /// Construye el input estándar, resuelve backend y corre el loop de
    /// compilación + resolución de imports.
    async fn run_compiler(&self, request: &CompileRequest) -> Result<SolcOutput, CoreError> {
        let backend = self.registry.resolve(request.version.as_deref()).await?;
        let resolver = ImportResolver::new(request.sources.clone(), self.fetcher.clone());

        let settings = request.settings.clone().unwrap_or_else(default_settings);
        let mut input = SolcInput::new(request.sources.clone(), settings);
        let mut attempted: HashSet<String> = HashSet::new();
        let mut round = 0usize;

        loop {
            let output = self.invoke(backend.clone(), &input).await?;

            let missing: Vec<String> = output.missing_imports()
                                             .into_iter()
                                             .filter(|p| !attempted.contains(p) && !input.sources.contains_key(p))
                                             .collect();
            if missing.is_empty() || round >= MAX_IMPORT_ROUNDS {
                return Ok(output);
            }

            let mut progressed = false;
            for path in missing {
                attempted.insert(path.clone());
                match resolver.resolve(&path).await {
                    ImportResolution::Contents(content) => {
                        input.sources.insert(path, SolcSource { content });
                        progressed = true;
                    }
                    // El import irresoluble queda como error del compilador en
                    // el output final; acá sólo se registra.
                    ImportResolution::Error(msg) => debug!("import sin resolver {path}: {msg}"),
                }
            }
            if !progressed {
                return Ok(output);
            }
            round += 1;
        }
    }

    /// Una invocación del backend (bloqueante) despachada fuera del runtime.
    async fn invoke(&self, backend: Arc<dyn CompilerBackend>, input: &SolcInput) -> Result<SolcOutput, CoreError> {
        let input_json = serde_json::to_string(input)?;
        let raw = tokio::task::spawn_blocking(move || backend.compile_standard(&input_json))
            .await
            .map_err(|e| CoreError::Internal(format!("compiler task: {e}")))??;
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::CompilerLoad(format!("malformed compiler output: {e}")))
    }
}
