use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use sol_core::{ArtifactStore, CompilationPipeline, CompileRequest, CompilerRegistry, InMemoryArtifactStore};
use sol_domain::{Artifact, CompilationStatus, SourceFile};
use sol_engine::{RemoteSolcLoader, SolcBinary};

fn main() {
    // Cargar .env si existe para obtener SOLC_BIN / SOLC_RELEASES_URL
    let _ = dotenvy::dotenv();
    // CLI mínima: `sol-cli compile --dir <PATH> [--version <vX.Y.Z>]`
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "compile" {
        let mut dir: Option<PathBuf> = None;
        let mut version: Option<String> = None;
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--dir" => {
                    i += 1;
                    if i < args.len() { dir = Some(PathBuf::from(&args[i])); }
                }
                "--version" => {
                    i += 1;
                    if i < args.len() { version = Some(args[i].clone()); }
                }
                _ => {}
            }
            i += 1;
        }

        if let Some(dir) = dir {
            let sources = match collect_sources(&dir) {
                Ok(s) if !s.is_empty() => s,
                Ok(_) => { eprintln!("[sol compile] no hay archivos .sol en {}", dir.display()); std::process::exit(4); }
                Err(e) => { eprintln!("[sol compile] lectura de {}: {e}", dir.display()); std::process::exit(5); }
            };

            let default_backend = match SolcBinary::from_env() {
                Ok(b) => b,
                Err(e) => { eprintln!("[sol compile] solc no disponible: {e}"); std::process::exit(5); }
            };
            let releases_url = std::env::var("SOLC_RELEASES_URL")
                .unwrap_or_else(|_| "https://binaries.soliditylang.org/linux-amd64".to_string());
            let cache_dir = std::env::var("SOLC_CACHE_DIR").map(PathBuf::from).unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".solflow").join("solc")
            });
            let registry = Arc::new(CompilerRegistry::new(Arc::new(default_backend),
                                                          Arc::new(RemoteSolcLoader::new(releases_url, cache_dir))));

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => { eprintln!("[sol compile] runtime: {e}"); std::process::exit(5); }
            };
            let code = rt.block_on(run_compile(registry, sources, version));
            std::process::exit(code);
        } else {
            eprintln!("Uso: sol-cli compile --dir <PATH> [--version <vX.Y.Z>]");
            std::process::exit(2);
        }
    } else {
        eprintln!("Uso: sol-cli compile --dir <PATH> [--version <vX.Y.Z>]");
        std::process::exit(2);
    }
}

/// Junta todos los archivos del directorio (recursivo) con su path relativo.
fn collect_sources(dir: &Path) -> std::io::Result<IndexMap<String, String>> {
    fn walk(root: &Path, current: &Path, out: &mut IndexMap<String, String>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(content) = std::fs::read_to_string(&path) {
                let rel = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");
                out.insert(rel, content);
            }
        }
        Ok(())
    }
    let mut out = IndexMap::new();
    walk(dir, dir, &mut out)?;
    Ok(out)
}

async fn run_compile(registry: Arc<CompilerRegistry>, sources: IndexMap<String, String>, version: Option<String>) -> i32 {
    let store = Arc::new(InMemoryArtifactStore::new());
    let mut artifact = Artifact::new(Uuid::new_v4(), None, None, serde_json::Value::Null);
    for (path, content) in &sources {
        if let Err(e) = artifact.add_file(SourceFile::new(path.clone(), content.clone())) {
            eprintln!("[sol compile] {path}: {e}");
            return 4;
        }
    }
    if let Err(e) = store.insert(&artifact).await {
        eprintln!("[sol compile] store: {e}");
        return 5;
    }

    let pipeline = CompilationPipeline::new(store.clone(), registry);
    let solidity_only: IndexMap<String, String> =
        sources.iter()
               .filter(|(p, _)| p.to_lowercase().ends_with(".sol"))
               .map(|(p, c)| (p.clone(), c.clone()))
               .collect();
    let result = pipeline.compile(artifact.id,
                                  CompileRequest { version, sources: solidity_only, settings: None })
                         .await;

    let updated = match store.load(artifact.id).await {
        Ok(a) => a,
        Err(e) => { eprintln!("[sol compile] store: {e}"); return 5; }
    };
    for file in updated.solidity_files() {
        match file.compilation.status {
            CompilationStatus::Success => println!("ok      {}", file.path),
            CompilationStatus::Failed => {
                println!("failed  {}", file.path);
                if let Some(err) = &file.compilation.error {
                    for line in err.lines() {
                        println!("        {line}");
                    }
                }
            }
            other => println!("{other:?}  {}", file.path),
        }
    }

    match result {
        Ok(output) if !output.has_errors() => 0,
        Ok(_) => 3,
        Err(e) => { eprintln!("[sol compile] error: {e}"); 5 }
    }
}
