//! Resolución de imports que el compilador pide on-demand.
//!
//! El protocolo de callback del compilador exige SIEMPRE una respuesta: por
//! eso `resolve` no falla por tipo, devuelve `Contents` o `Error`. La cadena
//! de fallback, en orden (gana el primer acierto):
//! 1. key exacta en el mapa de sources del run;
//! 2. archivo local relativo al working directory del proceso;
//! 3. fetch de URL si el path empieza con `http://`/`https://` (el contenido
//!    se confía verbatim);
//! 4. fallo de resolución.
//!
//! Sin cache entre llamadas: los sets de imports son chicos y por-run, una
//! cache agregaría complejidad sin beneficio proporcional.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;

/// Respuesta del resolver: siempre una de las dos formas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResolution {
    Contents(String),
    Error(String),
}

/// Fetch de texto por URL, abstraído para poder stubear la red en tests.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, String>;
}

/// Fetcher real sobre reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, String> {
        let resp = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("status {}", resp.status()));
        }
        resp.text().await.map_err(|e| e.to_string())
    }
}

/// Resolver ligado al mapa de sources de UNA corrida de compilación.
pub struct ImportResolver {
    sources: IndexMap<String, String>,
    fetcher: Arc<dyn UrlFetcher>,
}

impl ImportResolver {
    pub fn new(sources: IndexMap<String, String>, fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self { sources, fetcher }
    }

    pub async fn resolve(&self, import_path: &str) -> ImportResolution {
        // 1) presente en los sources provistos
        if let Some(content) = self.sources.get(import_path) {
            return ImportResolution::Contents(content.clone());
        }

        // 2) archivo local relativo al cwd del server
        if let Ok(cwd) = std::env::current_dir() {
            let disk_path = cwd.join(import_path);
            if let Ok(content) = tokio::fs::read_to_string(&disk_path).await {
                return ImportResolution::Contents(content);
            }
        }

        // 3) URL http(s): contenido confiado verbatim
        if import_path.starts_with("https://") || import_path.starts_with("http://") {
            return match self.fetcher.fetch_text(import_path).await {
                Ok(text) => ImportResolution::Contents(text),
                Err(e) => ImportResolution::Error(format!("Unable to fetch {import_path}: {e}")),
            };
        }

        debug!("import sin resolver: {import_path}");
        ImportResolution::Error(format!("File not found: {import_path}"))
    }
}
