use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use sol_core::{ImportResolution, ImportResolver, UrlFetcher};

struct StubFetcher {
    body: String,
}
#[async_trait]
impl UrlFetcher for StubFetcher {
    async fn fetch_text(&self, _url: &str) -> Result<String, String> {
        Ok(self.body.clone())
    }
}

struct DeadFetcher;
#[async_trait]
impl UrlFetcher for DeadFetcher {
    async fn fetch_text(&self, _url: &str) -> Result<String, String> {
        Err("connection refused".to_string())
    }
}

fn sources(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

// Archivo temporal con nombre único; se limpia al dropear.
struct TempSource {
    path: std::path::PathBuf,
}
impl TempSource {
    fn new(name: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("solflow-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        Self { path }
    }
}
impl Drop for TempSource {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[tokio::test]
async fn el_mapa_de_sources_gana_primero() {
    // mismo path existe en disco con OTRO contenido: el mapa en memoria
    // tiene precedencia.
    let tmp = TempSource::new("shadow.sol", "contract Disk {}");
    let key = tmp.path.to_string_lossy().to_string();
    let resolver = ImportResolver::new(sources(&[(&key, "contract Mem {}")]), Arc::new(DeadFetcher));

    match resolver.resolve(&key).await {
        ImportResolution::Contents(c) => assert_eq!(c, "contract Mem {}"),
        other => panic!("esperaba Contents, vino {other:?}"),
    }
}

#[tokio::test]
async fn fallback_a_disco() {
    let tmp = TempSource::new("disk.sol", "contract Disk {}");
    let key = tmp.path.to_string_lossy().to_string();
    let resolver = ImportResolver::new(sources(&[]), Arc::new(DeadFetcher));

    match resolver.resolve(&key).await {
        ImportResolution::Contents(c) => assert_eq!(c, "contract Disk {}"),
        other => panic!("esperaba Contents, vino {other:?}"),
    }
}

#[tokio::test]
async fn fallback_a_url() {
    let resolver = ImportResolver::new(sources(&[]),
                                       Arc::new(StubFetcher { body: "contract Remote {}".into() }));
    match resolver.resolve("https://example.com/Remote.sol").await {
        ImportResolution::Contents(c) => assert_eq!(c, "contract Remote {}"),
        other => panic!("esperaba Contents, vino {other:?}"),
    }
}

#[tokio::test]
async fn url_con_red_caida_reporta_error() {
    let resolver = ImportResolver::new(sources(&[]), Arc::new(DeadFetcher));
    match resolver.resolve("https://example.com/Remote.sol").await {
        ImportResolution::Error(e) => {
            assert!(e.contains("Unable to fetch https://example.com/Remote.sol"));
        }
        other => panic!("esperaba Error, vino {other:?}"),
    }
}

#[tokio::test]
async fn path_inexistente_no_lanza_devuelve_error() {
    let resolver = ImportResolver::new(sources(&[]), Arc::new(DeadFetcher));
    match resolver.resolve("lib/nope/Missing.sol").await {
        ImportResolution::Error(e) => assert_eq!(e, "File not found: lib/nope/Missing.sol"),
        other => panic!("esperaba Error, vino {other:?}"),
    }
}
