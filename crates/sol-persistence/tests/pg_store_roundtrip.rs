use serde_json::json;
use uuid::Uuid;

use sol_core::ArtifactStore;
use sol_domain::{Artifact, CompileOutcome, SourceFile};
use sol_persistence::pg::PgArtifactStore;

#[tokio::test]
async fn roundtrip_insert_save_load_list() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return;
    }
    let pool = sol_persistence::build_dev_pool_from_env().expect("pool");
    let store = PgArtifactStore::with_pool(pool);
    let owner = Uuid::new_v4();

    let mut artifact = Artifact::new(owner, Some("Token demo".into()), Some("make a token".into()), json!({}));
    artifact.add_file(SourceFile::new("contracts/Token.sol", "contract Token {}")).unwrap();
    store.insert(&artifact).await.expect("insert");

    // insertar dos veces el mismo id debe fallar
    assert!(store.insert(&artifact).await.is_err());

    // transición de estado completa y upsert del documento
    artifact.mark_all_pending(chrono::Utc::now());
    artifact.mark_all_result(&CompileOutcome::Success, chrono::Utc::now());
    store.save(&artifact).await.expect("save");

    let loaded = store.load(artifact.id).await.expect("load");
    assert_eq!(loaded.files.len(), 1);
    assert_eq!(loaded.file("contracts/Token.sol").unwrap().sha256, artifact.files[0].sha256);
    assert_eq!(loaded.file("contracts/Token.sol").unwrap().compilation.status,
               sol_domain::CompilationStatus::Success);

    let list = store.list_for_owner(owner).await.expect("list");
    assert!(list.iter().any(|s| s.id == artifact.id));
    assert_eq!(list[0].title.as_deref(), Some("Token demo"));
}

#[tokio::test]
async fn load_de_id_inexistente_es_not_found() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return;
    }
    let pool = sol_persistence::build_dev_pool_from_env().expect("pool");
    let store = PgArtifactStore::with_pool(pool);

    let err = store.load(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, sol_core::CoreError::NotFound(_)));
}
