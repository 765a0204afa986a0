//! Trait de persistencia de artifacts y backend en memoria.
//!
//! El core no conoce la base de datos: habla con un `ArtifactStore`. El
//! backend en memoria sirve para tests y para el demo; la implementación
//! Postgres vive en `sol-persistence` con paridad de semántica.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use sol_domain::{Artifact, ArtifactSummary};

use crate::errors::CoreError;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Inserta un artifact nuevo (falla si el id ya existe).
    async fn insert(&self, artifact: &Artifact) -> Result<(), CoreError>;
    /// Carga por id; `NotFound` si no existe.
    async fn load(&self, id: Uuid) -> Result<Artifact, CoreError>;
    /// Persiste el documento completo (upsert del estado actual).
    async fn save(&self, artifact: &Artifact) -> Result<(), CoreError>;
    /// Proyección liviana por owner, ordenada por `updated_at` descendente.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<ArtifactSummary>, CoreError>;
}

pub struct InMemoryArtifactStore {
    inner: DashMap<Uuid, Artifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self { inner: DashMap::new() }
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn insert(&self, artifact: &Artifact) -> Result<(), CoreError> {
        if self.inner.contains_key(&artifact.id) {
            return Err(CoreError::InvalidRequest(format!("artifact {} already exists", artifact.id)));
        }
        self.inner.insert(artifact.id, artifact.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Artifact, CoreError> {
        self.inner
            .get(&id)
            .map(|a| a.clone())
            .ok_or_else(|| CoreError::NotFound(format!("artifact {id}")))
    }

    async fn save(&self, artifact: &Artifact) -> Result<(), CoreError> {
        self.inner.insert(artifact.id, artifact.clone());
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<ArtifactSummary>, CoreError> {
        let mut out: Vec<ArtifactSummary> = self.inner
                                                .iter()
                                                .filter(|e| e.owner_id == owner_id)
                                                .map(|e| e.summary())
                                                .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}
