//! Artifact: proyecto guardado de un owner.
//!
//! Un `Artifact` agrupa archivos fuente (únicos por ruta, case-insensitive)
//! junto con el contexto opaco de generación (title/prompt/metadata). Todas
//! las mutaciones de archivos pasan por este módulo para mantener las
//! invariantes:
//! - rutas únicas bajo comparación case-insensitive;
//! - `updated_at` se bumpea en cualquier mutación;
//! - las transiciones masivas de estado (`mark_all_pending` /
//!   `mark_all_result`) cubren TODOS los archivos compilables, no sólo los del
//!   request fresco (el compilador evalúa el set completo como una unidad).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::file::{CompileOutcome, SourceFile};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub files: Vec<SourceFile>,
    /// Contexto de generación (passthrough opaco, no se interpreta).
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Proyección liviana para listados por owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(owner_id: Uuid, title: Option<String>, prompt: Option<String>, metadata: Value) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(),
               owner_id,
               title,
               prompt,
               files: Vec::new(),
               metadata,
               created_at: now,
               updated_at: now }
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary { id: self.id,
                          title: self.title.clone(),
                          prompt: self.prompt.clone(),
                          created_at: self.created_at,
                          updated_at: self.updated_at }
    }

    /// Bump de `updated_at`; llamar tras cualquier mutación.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Búsqueda exacta case-insensitive por ruta.
    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        let needle = path.to_lowercase();
        self.files.iter().find(|f| f.path.to_lowercase() == needle)
    }

    pub fn file_mut(&mut self, path: &str) -> Option<&mut SourceFile> {
        let needle = path.to_lowercase();
        self.files.iter_mut().find(|f| f.path.to_lowercase() == needle)
    }

    /// Búsqueda por substring case-insensitive (selector de despliegue);
    /// gana la primera coincidencia en orden de inserción.
    pub fn file_mut_fuzzy(&mut self, needle: &str) -> Option<&mut SourceFile> {
        let needle = needle.to_lowercase();
        self.files.iter_mut().find(|f| f.path.to_lowercase().contains(&needle))
    }

    /// Agrega un archivo nuevo; rechaza rutas duplicadas (case-insensitive).
    pub fn add_file(&mut self, file: SourceFile) -> Result<(), DomainError> {
        if self.file(&file.path).is_some() {
            return Err(DomainError::DuplicatePath(file.path));
        }
        self.files.push(file);
        self.touch();
        Ok(())
    }

    /// Upsert por ruta: si existe, escritura de contenido (digest + reset a
    /// `idle`); si no, se agrega al final.
    pub fn upsert_file(&mut self, path: &str, content: &str) {
        match self.file_mut(path) {
            Some(f) => f.write_content(content),
            None => self.files.push(SourceFile::new(path, content)),
        }
        self.touch();
    }

    pub fn solidity_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.is_solidity)
    }

    /// Marca TODOS los archivos compilables como `pending` (run en vuelo).
    pub fn mark_all_pending(&mut self, now: DateTime<Utc>) {
        for f in self.files.iter_mut().filter(|f| f.is_solidity) {
            f.compilation.mark_pending(now);
        }
        self.touch();
    }

    /// Aplica el resultado del run a TODOS los archivos compilables.
    pub fn mark_all_result(&mut self, outcome: &CompileOutcome, now: DateTime<Utc>) {
        for f in self.files.iter_mut().filter(|f| f.is_solidity) {
            f.compilation.apply(outcome, now);
        }
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::CompilationStatus;

    fn artifact_with(paths: &[&str]) -> Artifact {
        let mut a = Artifact::new(Uuid::new_v4(), Some("t".into()), None, Value::Null);
        for p in paths {
            a.add_file(SourceFile::new(*p, "contract X {}")).unwrap();
        }
        a
    }

    #[test]
    fn rutas_unicas_case_insensitive() {
        let mut a = artifact_with(&["Token.sol"]);
        let err = a.add_file(SourceFile::new("token.SOL", "")).unwrap_err();
        assert!(matches!(err, DomainError::DuplicatePath(_)));
    }

    #[test]
    fn upsert_reemplaza_contenido_existente() {
        let mut a = artifact_with(&["Token.sol"]);
        a.upsert_file("token.sol", "contract Y {}");
        assert_eq!(a.files.len(), 1);
        assert_eq!(a.files[0].content, "contract Y {}");
        assert_eq!(a.files[0].compilation.status, CompilationStatus::Idle);
    }

    #[test]
    fn mark_all_solo_toca_compilables() {
        let mut a = artifact_with(&["Token.sol"]);
        a.add_file(SourceFile::new("deploy.js", "x")).unwrap();
        a.mark_all_pending(Utc::now());
        assert_eq!(a.file("Token.sol").unwrap().compilation.status, CompilationStatus::Pending);
        assert_eq!(a.file("deploy.js").unwrap().compilation.status, CompilationStatus::Idle);
    }

    #[test]
    fn fuzzy_encuentra_por_substring() {
        let mut a = artifact_with(&["contracts/Token.sol", "contracts/Vault.sol"]);
        let f = a.file_mut_fuzzy("token.sol").unwrap();
        assert_eq!(f.path, "contracts/Token.sol");
    }

    #[test]
    fn touch_bumpea_updated_at() {
        let mut a = artifact_with(&[]);
        let before = a.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        a.touch();
        assert!(a.updated_at > before);
    }
}
