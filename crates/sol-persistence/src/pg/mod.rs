//! Implementación Postgres (Diesel) del `ArtifactStore` del core.
//!
//! Objetivo general del módulo:
//! - Proveer una capa de persistencia durable (Postgres) con paridad 1:1
//!   respecto al backend en memoria.
//! - El documento completo del artifact (archivos, hashes, estados de
//!   compilación, despliegues) se guarda como JSONB en `doc`; las columnas
//!   relacionales (`owner_id`, `title`, timestamps) se duplican sólo para
//!   listar sin deserializar.
//! - Aislar completamente el mapeo dominio ↔ filas de DB del `sol-core`.
//!
//! Decisiones:
//! - `save` hace upsert por id (`ON CONFLICT (id) DO UPDATE`): el pipeline
//!   persiste el documento entero en cada transición de estado.
//! - Diesel es sincrónico; cada operación corre en `spawn_blocking` para no
//!   bloquear el runtime de tokio.
//! - Manejo básico de errores transitorios: reintento con backoff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use sol_core::{ArtifactStore, CoreError};
use sol_domain::{Artifact, ArtifactSummary};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::artifacts;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// Notas operativas:
/// - El pool se construye con `min_idle` (mínimo de conexiones inactivas) y
///   `max_size` (límite superior total).
/// - Al construirlo, se corre automáticamente el set de migraciones pendientes
///   (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Este trait permite:
/// - Inyectar un pool real (producción/tests de integración).
/// - Simular/factorear en tests unitarios sin acoplar a r2d2.
///
/// Contrato:
/// - Debe devolver una conexión válida o
///   `PersistenceError::TransientIo`/equivalente en caso de error.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Obtiene una conexión lista para ejecutar consultas Diesel.
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}
impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Fila completa de la tabla `artifacts` para lecturas.
#[derive(Queryable, Debug)]
pub struct ArtifactRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub doc: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila para insertar/upsertear en `artifacts`.
///
/// Los campos se poseen por valor: la fila cruza un `spawn_blocking`.
#[derive(Insertable, Debug)]
#[diesel(table_name = artifacts)]
pub struct NewArtifactRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub doc: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewArtifactRow {
    fn from_artifact(artifact: &Artifact) -> Result<Self, PersistenceError> {
        let doc = serde_json::to_value(artifact).map_err(|e| PersistenceError::Unknown(format!("ser doc: {e}")))?;
        Ok(Self { id: artifact.id,
                  owner_id: artifact.owner_id,
                  title: artifact.title.clone(),
                  prompt: artifact.prompt.clone(),
                  doc,
                  created_at: artifact.created_at,
                  updated_at: artifact.updated_at })
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
///
/// Cubre:
/// - Conflictos de serialización (deadlocks y nivel de aislamiento).
/// - Errores de IO transitorios de pool/conexión.
/// - Mensajes comunes de desconexión/timeout detectados por texto
///   (best-effort).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry simple con backoff exponencial muy pequeño (hasta 3 intentos).
///
/// Política:
/// - Intentos: 3.
/// - Backoff: 15ms, 30ms, 45ms.
/// - Logs: se emite `warn!` por intento.
///
/// Garantías:
/// - No altera semántica de negocio; sólo repite la unidad de trabajo provista
///   por `f`.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Store de artifacts sobre Postgres.
pub struct PgArtifactStore<P: ConnectionProvider> {
    provider: Arc<P>,
}

impl<P: ConnectionProvider> PgArtifactStore<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl PgArtifactStore<PoolProvider> {
    pub fn with_pool(pool: PgPool) -> Self {
        Self::new(Arc::new(PoolProvider { pool }))
    }
}

/// Corre `f` en el threadpool blocking de tokio y aplana el JoinError.
async fn run_blocking<T, F>(f: F) -> Result<T, PersistenceError>
    where T: Send + 'static,
          F: FnOnce() -> Result<T, PersistenceError> + Send + 'static
{
    tokio::task::spawn_blocking(f).await
                                  .map_err(|e| PersistenceError::Unknown(format!("blocking task: {e}")))?
}

#[async_trait]
impl<P: ConnectionProvider> ArtifactStore for PgArtifactStore<P> {
    async fn insert(&self, artifact: &Artifact) -> Result<(), CoreError> {
        debug!("pg insert artifact id={}", artifact.id);
        let row = NewArtifactRow::from_artifact(artifact).map_err(CoreError::from)?;
        let provider = self.provider.clone();
        run_blocking(move || {
            with_retry(|| {
                let mut conn = provider.connection()?;
                diesel::insert_into(artifacts::table).values(&row)
                                                     .execute(&mut conn)
                                                     .map_err(PersistenceError::from)?;
                Ok(())
            })
        }).await
          .map_err(CoreError::from)
    }

    async fn load(&self, id: Uuid) -> Result<Artifact, CoreError> {
        let provider = self.provider.clone();
        let row = run_blocking(move || {
                      with_retry(|| {
                          let mut conn = provider.connection()?;
                          artifacts::table.find(id)
                                          .first::<ArtifactRow>(&mut conn)
                                          .map_err(PersistenceError::from)
                      })
                  }).await
                    .map_err(CoreError::from)?;
        serde_json::from_value::<Artifact>(row.doc)
            .map_err(|e| CoreError::Internal(format!("artifact doc corrupto ({id}): {e}")))
    }

    async fn save(&self, artifact: &Artifact) -> Result<(), CoreError> {
        debug!("pg save artifact id={} updated_at={}", artifact.id, artifact.updated_at);
        let row = NewArtifactRow::from_artifact(artifact).map_err(CoreError::from)?;
        let provider = self.provider.clone();
        run_blocking(move || {
            with_retry(|| {
                let mut conn = provider.connection()?;
                diesel::insert_into(artifacts::table)
                    .values(&row)
                    .on_conflict(artifacts::id)
                    .do_update()
                    .set((artifacts::title.eq(row.title.clone()),
                          artifacts::prompt.eq(row.prompt.clone()),
                          artifacts::doc.eq(row.doc.clone()),
                          artifacts::updated_at.eq(row.updated_at)))
                    .execute(&mut conn)
                    .map_err(PersistenceError::from)?;
                Ok(())
            })
        }).await
          .map_err(CoreError::from)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<ArtifactSummary>, CoreError> {
        let provider = self.provider.clone();
        let rows = run_blocking(move || {
                       with_retry(|| {
                           let mut conn = provider.connection()?;
                           artifacts::table.filter(artifacts::owner_id.eq(owner_id))
                                           .select((artifacts::id,
                                                    artifacts::title,
                                                    artifacts::prompt,
                                                    artifacts::created_at,
                                                    artifacts::updated_at))
                                           .order(artifacts::updated_at.desc())
                                           .load::<(Uuid, Option<String>, Option<String>, DateTime<Utc>, DateTime<Utc>)>(&mut conn)
                                           .map_err(PersistenceError::from)
                       })
                   }).await
                     .map_err(CoreError::from)?;
        Ok(rows.into_iter()
               .map(|(id, title, prompt, created_at, updated_at)| ArtifactSummary { id,
                                                                                    title,
                                                                                    prompt,
                                                                                    created_at,
                                                                                    updated_at })
               .collect())
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// Comportamiento:
/// - Valida y ajusta tamaños (si `min_size > max_size`, usa `min_size =
///   max_size`).
/// - Ejecuta migraciones inmediatamente tras el primer `get()`.
/// - Devuelve `PersistenceError::TransientIo` ante errores del pool/manager.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = if min_size == 0 { 1 } else { min_size };
    let validated_max = if max_size == 0 { 1 } else { max_size };
    if validated_min > validated_max {
        warn!("min_size > max_size ({} > {}), ajustando min=max", validated_min, validated_max);
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    // Ejecutar migraciones una sola vez al construir (primer connection checkout).
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración (DATABASE_URL,
/// tamaños) y construye un pool ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
