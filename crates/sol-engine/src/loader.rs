//! Descarga de builds versionados desde el registry remoto de releases.
//!
//! El registry expone un `list.json` con el mapa `releases` (versión →
//! nombre de archivo del build) y los binarios al lado. El loader descarga
//! una sola vez por tag a `SOLC_CACHE_DIR` y devuelve un `SolcBinary`; la
//! deduplicación entre requests concurrentes la hace el `CompilerRegistry`
//! (acá no hay cache propia más allá del filesystem).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use sol_core::{CompilerBackend, CompilerLoader, CoreError};

use crate::SolcBinary;

/// Shape del `list.json` del registry de releases.
#[derive(Debug, Deserialize)]
pub struct ReleaseIndex {
    #[serde(default)]
    pub releases: HashMap<String, String>,
}

pub struct RemoteSolcLoader {
    releases_url: String,
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl RemoteSolcLoader {
    pub fn new(releases_url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self { releases_url: releases_url.into().trim_end_matches('/').to_string(),
               cache_dir: cache_dir.into(),
               client: reqwest::Client::new() }
    }

    async fn fetch_index(&self) -> Result<ReleaseIndex, CoreError> {
        let url = format!("{}/list.json", self.releases_url);
        let resp = self.client
                       .get(&url)
                       .send()
                       .await
                       .map_err(|e| CoreError::CompilerLoad(format!("release index {url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(CoreError::CompilerLoad(format!("release index {url}: status {}", resp.status())));
        }
        resp.json::<ReleaseIndex>()
            .await
            .map_err(|e| CoreError::CompilerLoad(format!("release index malformado: {e}")))
    }

    async fn download(&self, build_file: &str, dest: &PathBuf) -> Result<(), CoreError> {
        let url = format!("{}/{}", self.releases_url, build_file);
        debug!("descargando build de compilador: {url}");
        let resp = self.client
                       .get(&url)
                       .send()
                       .await
                       .map_err(|e| CoreError::CompilerLoad(format!("descarga {url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(CoreError::CompilerLoad(format!("descarga {url}: status {}", resp.status())));
        }
        let bytes = resp.bytes()
                        .await
                        .map_err(|e| CoreError::CompilerLoad(format!("descarga {url}: {e}")))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::CompilerLoad(format!("cache dir: {e}")))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| CoreError::CompilerLoad(format!("escritura del build: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            if let Err(e) = tokio::fs::set_permissions(dest, perms).await {
                warn!("no se pudo marcar el build como ejecutable: {e}");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CompilerLoader for RemoteSolcLoader {
    async fn load(&self, version_tag: &str) -> Result<Arc<dyn CompilerBackend>, CoreError> {
        let dest = self.cache_dir.join(version_tag);

        if !dest.exists() {
            let index = self.fetch_index().await?;
            let bare = version_tag.trim_start_matches('v');
            let build_file = index.releases
                                  .get(bare)
                                  .ok_or_else(|| CoreError::CompilerNotFound(version_tag.to_string()))?;
            self.download(build_file, &dest).await?;
        }

        let binary = SolcBinary::new(&dest).map_err(|e| CoreError::CompilerLoad(e.to_string()))?;
        Ok(Arc::new(binary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializa_el_indice_de_releases() {
        let raw = r#"{
            "builds": [],
            "releases": { "0.8.20": "solc-linux-amd64-v0.8.20+commit.a1b79de6" },
            "latestRelease": "0.8.20"
        }"#;
        let index: ReleaseIndex = serde_json::from_str(raw).unwrap();
        assert_eq!(index.releases.get("0.8.20").unwrap(), "solc-linux-amd64-v0.8.20+commit.a1b79de6");
    }
}
