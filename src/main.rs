/// Validación end-to-end del pipeline de compilación con un backend stub:
/// crear artifact -> compilar -> inspeccionar estados -> registrar deploy.
fn run_compile_validation() {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use serde_json::json;

    use sol_core::{ArtifactService, ArtifactStore, CompilationPipeline, CompileRequest, CompilerBackend, CompilerLoader,
                   CompilerRegistry, CoreError, DeployTarget, DeploymentRecord, DeploymentRecorder, GeneratedFile,
                   GeneratedProject, InMemoryArtifactStore};
    use sol_domain::CompilationStatus;

    // Backend dummy: acepta cualquier input standard-JSON y devuelve un
    // contrato por cada source, sin diagnósticos.
    struct StubBackend;
    impl CompilerBackend for StubBackend {
        fn version_tag(&self) -> &str {
            "v0.0.0-stub"
        }
        fn compile_standard(&self, input_json: &str) -> Result<String, CoreError> {
            let input: serde_json::Value = serde_json::from_str(input_json)?;
            let mut contracts = serde_json::Map::new();
            if let Some(sources) = input.get("sources").and_then(|s| s.as_object()) {
                for path in sources.keys() {
                    contracts.insert(path.clone(), json!({ "Stub": {} }));
                }
            }
            Ok(json!({ "errors": [], "contracts": contracts }).to_string())
        }
    }

    // Loader dummy: el demo sólo usa el backend por defecto.
    struct NoLoader;
    #[async_trait::async_trait]
    impl CompilerLoader for NoLoader {
        async fn load(&self, version_tag: &str) -> Result<Arc<dyn CompilerBackend>, CoreError> {
            Err(CoreError::CompilerNotFound(version_tag.to_string()))
        }
    }

    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    rt.block_on(async {
        let store = Arc::new(InMemoryArtifactStore::new());
        let service = ArtifactService::new(store.clone());

        // 1. Artifact generado con un contrato y un archivo no compilable
        let project = GeneratedProject { files: vec![GeneratedFile { filename: "contracts/Token.sol".into(),
                                                                     content: "contract Token {}".into(),
                                                                     kind: None },
                                                     GeneratedFile { filename: "README.md".into(),
                                                                     content: "# demo".into(),
                                                                     kind: None }],
                                         metadata: json!({ "title": "Demo token" }) };
        let artifact = service.create_from_generated(uuid::Uuid::new_v4(), "make me a token", project)
                              .await
                              .expect("create artifact");
        assert_eq!(artifact.title.as_deref(), Some("Demo token"));

        // 2. Compilación con el backend stub
        let registry = Arc::new(CompilerRegistry::new(Arc::new(StubBackend), Arc::new(NoLoader)));
        let pipeline = CompilationPipeline::new(store.clone(), registry);
        let mut sources = IndexMap::new();
        sources.insert("contracts/Token.sol".to_string(), "contract Token {}".to_string());
        let output = pipeline.compile(artifact.id,
                                      CompileRequest { version: None, sources, settings: None })
                             .await
                             .expect("compile");
        assert!(!output.has_errors(), "el stub no reporta diagnósticos");

        let compiled = store.load(artifact.id).await.expect("load");
        assert_eq!(compiled.file("contracts/Token.sol").unwrap().compilation.status,
                   CompilationStatus::Success);
        assert_eq!(compiled.file("README.md").unwrap().compilation.status, CompilationStatus::Idle);

        // 3. Registro de deploy sobre el contrato compilado
        let recorder = DeploymentRecorder::new(store.clone());
        let deployed = recorder.record(artifact.id,
                                       DeployTarget::File("Token.sol".into()),
                                       vec![DeploymentRecord { address: "0xabc".into(),
                                                               network: "sepolia".into(),
                                                               tx_hash: "0x1".into(),
                                                               deployed_at: None }])
                               .await
                               .expect("record deploy");
        assert_eq!(deployed.file("contracts/Token.sol").unwrap().deployed_contracts.len(), 1);

        println!("validación compile+deploy OK (artifact {})", artifact.id);
    });
}

/// Demo opcional contra Postgres real (requiere DATABASE_URL).
#[cfg(feature = "pg_demo")]
fn run_pg_demo() {
    use std::sync::Arc;

    use sol_core::ArtifactStore;
    use sol_persistence::pg::PgArtifactStore;

    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    rt.block_on(async {
        let pool = sol_persistence::build_dev_pool_from_env().expect("pool");
        let store = Arc::new(PgArtifactStore::with_pool(pool));
        let mut artifact = sol_domain::Artifact::new(uuid::Uuid::new_v4(),
                                                     Some("pg demo".into()),
                                                     None,
                                                     serde_json::Value::Null);
        artifact.add_file(sol_domain::SourceFile::new("Token.sol", "contract Token {}"))
                .expect("add file");
        store.insert(&artifact).await.expect("insert");
        let loaded = store.load(artifact.id).await.expect("load");
        println!("pg demo OK (artifact {} con {} archivo/s)", loaded.id, loaded.files.len());
    });
}

fn main() {
    let _ = dotenvy::dotenv();
    run_compile_validation();
    #[cfg(feature = "pg_demo")]
    run_pg_demo();
}
