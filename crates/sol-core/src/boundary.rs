//! Boundary con los colaboradores externos (generación AI, routing).
//!
//! El core sólo consume pares `filename`/`content`; el resto del payload de
//! generación (metadata) es passthrough opaco. Las operaciones de acá son las
//! únicas rutas de escritura de contenido, así que la invariante
//! edición-invalida-resultado se aplica siempre vía
//! `SourceFile::write_content` / `Artifact::upsert_file`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use sol_domain::{Artifact, SourceFile};

use crate::errors::CoreError;
use crate::store::ArtifactStore;

/// Un archivo producido por la generación AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
    /// `contract|script|test|config|other`; informativo, no se interpreta.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Payload completo de generación `{files, metadata}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub metadata: Value,
}

/// Largo máximo del título derivado del prompt.
const TITLE_PREFIX_LEN: usize = 60;

/// Operaciones de artifacts consumidas por el boundary HTTP/AI.
pub struct ArtifactService<S> {
    store: Arc<S>,
}

impl<S: ArtifactStore> ArtifactService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Crea un artifact desde un payload de generación. El título cae al
    /// prefijo del prompt si la metadata no trae uno.
    pub async fn create_from_generated(&self,
                                       owner_id: Uuid,
                                       prompt: &str,
                                       payload: GeneratedProject)
                                       -> Result<Artifact, CoreError> {
        let title = payload.metadata
                           .get("title")
                           .and_then(Value::as_str)
                           .map(str::to_string)
                           .unwrap_or_else(|| prompt.chars().take(TITLE_PREFIX_LEN).collect());

        let mut artifact = Artifact::new(owner_id, Some(title), Some(prompt.to_string()), payload.metadata);
        for f in payload.files {
            artifact.add_file(SourceFile::new(f.filename, f.content))?;
        }
        self.store.insert(&artifact).await?;
        Ok(artifact)
    }

    /// Upsert de archivos desde una modificación AI: ruta existente →
    /// escritura de contenido (digest + reset a idle), ruta nueva → append.
    pub async fn update_generated_files(&self,
                                        artifact_id: Uuid,
                                        files: Vec<GeneratedFile>)
                                        -> Result<Artifact, CoreError> {
        let mut artifact = self.store.load(artifact_id).await?;
        for f in &files {
            artifact.upsert_file(&f.filename, &f.content);
        }
        self.store.save(&artifact).await?;
        Ok(artifact)
    }

    /// Alta manual de un archivo; ruta duplicada (case-insensitive) rechazada.
    pub async fn add_file(&self,
                          artifact_id: Uuid,
                          file_name: &str,
                          content: &str)
                          -> Result<Artifact, CoreError> {
        if file_name.is_empty() {
            return Err(CoreError::InvalidRequest("fileName is required (e.g. 'Token.sol')".into()));
        }
        let mut artifact = self.store.load(artifact_id).await?;
        artifact.add_file(SourceFile::new(file_name, content))?;
        self.store.save(&artifact).await?;
        Ok(artifact)
    }

    /// Edición de contenido de un archivo existente: recalcula digest y, si
    /// es compilable, resetea la compilación a idle.
    pub async fn update_file_content(&self,
                                     artifact_id: Uuid,
                                     file_name: &str,
                                     content: &str)
                                     -> Result<Artifact, CoreError> {
        if file_name.is_empty() {
            return Err(CoreError::InvalidRequest("fileName is required (e.g. 'Token.sol')".into()));
        }
        let mut artifact = self.store.load(artifact_id).await?;
        match artifact.file_mut(file_name) {
            Some(f) => f.write_content(content),
            None => return Err(CoreError::NotFound(format!("file '{file_name}' in artifact {artifact_id}"))),
        }
        artifact.touch();
        self.store.save(&artifact).await?;
        Ok(artifact)
    }
}
