use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use sol_core::{ArtifactService, ArtifactStore, CoreError, DeployTarget, DeploymentRecord, DeploymentRecorder,
               GeneratedFile, GeneratedProject, InMemoryArtifactStore};
use sol_domain::{Artifact, CompilationStatus, SourceFile};

fn record(address: &str, tx: &str) -> DeploymentRecord {
    DeploymentRecord { address: address.to_string(),
                       network: "sepolia".to_string(),
                       tx_hash: tx.to_string(),
                       deployed_at: None }
}

async fn seed(store: &InMemoryArtifactStore, files: &[(&str, &str)]) -> Uuid {
    let mut artifact = Artifact::new(Uuid::new_v4(), Some("demo".into()), None, Value::Null);
    for (path, content) in files {
        artifact.add_file(SourceFile::new(*path, *content)).unwrap();
    }
    store.insert(&artifact).await.unwrap();
    artifact.id
}

// ---------------------------------------------------------------------------
// DeploymentRecorder
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selector_por_substring_reemplaza_la_lista_entera() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let id = seed(&store, &[("contracts/Token.sol", "contract Token {}")]).await;
    let recorder = DeploymentRecorder::new(store.clone());

    // lista previa que debe ser reemplazada, no mergeada
    recorder.record(id, DeployTarget::File("Token.sol".into()), vec![record("0xold", "0x0")])
            .await
            .unwrap();
    let updated = recorder.record(id, DeployTarget::File("Token.sol".into()), vec![record("0xabc", "0x1")])
                          .await
                          .unwrap();

    let file = updated.file("contracts/Token.sol").unwrap();
    assert_eq!(file.deployed_contracts.len(), 1);
    assert_eq!(file.deployed_contracts[0].address, "0xabc");
    assert_eq!(file.deployed_contracts[0].tx_hash, "0x1");
}

#[tokio::test]
async fn target_all_cubre_todos_los_sol() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let id = seed(&store,
                  &[("Token.sol", "contract Token {}"), ("Vault.sol", "contract Vault {}"), ("deploy.js", "x")]).await;
    let recorder = DeploymentRecorder::new(store.clone());

    let updated = recorder.record(id, DeployTarget::AllSolidity, vec![record("0xabc", "0x1")]).await.unwrap();
    assert_eq!(updated.file("Token.sol").unwrap().deployed_contracts.len(), 1);
    assert_eq!(updated.file("Vault.sol").unwrap().deployed_contracts.len(), 1);
    assert!(updated.file("deploy.js").unwrap().deployed_contracts.is_empty());
}

#[tokio::test]
async fn lista_vacia_es_invalid_request() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let id = seed(&store, &[("Token.sol", "contract Token {}")]).await;
    let recorder = DeploymentRecorder::new(store.clone());

    let err = recorder.record(id, DeployTarget::AllSolidity, vec![]).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRequest(_)));
}

#[tokio::test]
async fn selector_sin_match_es_not_found() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let id = seed(&store, &[("Token.sol", "contract Token {}")]).await;
    let recorder = DeploymentRecorder::new(store.clone());

    let err = recorder.record(id, DeployTarget::File("Vault.sol".into()), vec![record("0xabc", "0x1")])
                      .await
                      .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn no_exige_compilacion_exitosa() {
    // despliegues out-of-band: el archivo sigue en idle y el registro pasa
    let store = Arc::new(InMemoryArtifactStore::new());
    let id = seed(&store, &[("Token.sol", "contract Token {}")]).await;
    let recorder = DeploymentRecorder::new(store.clone());

    let updated = recorder.record(id, DeployTarget::File("token".into()), vec![record("0xabc", "0x1")])
                          .await
                          .unwrap();
    let file = updated.file("Token.sol").unwrap();
    assert_eq!(file.compilation.status, CompilationStatus::Idle);
    assert_eq!(file.deployed_contracts.len(), 1);
    assert!(file.deployed_contracts[0].deployed_at <= chrono::Utc::now());
}

// ---------------------------------------------------------------------------
// ArtifactService (boundary AI / edición manual)
// ---------------------------------------------------------------------------

fn generated(files: &[(&str, &str)], metadata: Value) -> GeneratedProject {
    GeneratedProject { files: files.iter()
                                   .map(|(f, c)| GeneratedFile { filename: f.to_string(),
                                                                 content: c.to_string(),
                                                                 kind: None })
                                   .collect(),
                       metadata }
}

#[tokio::test]
async fn crea_artifact_con_titulo_de_metadata() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());

    let artifact = service.create_from_generated(Uuid::new_v4(),
                                                 "make me a token",
                                                 generated(&[("contracts/Token.sol", "contract Token {}")],
                                                           json!({ "title": "Mi Token" })))
                          .await
                          .unwrap();
    assert_eq!(artifact.title.as_deref(), Some("Mi Token"));
    assert!(artifact.file("contracts/Token.sol").unwrap().is_solidity);
}

#[tokio::test]
async fn titulo_cae_al_prefijo_del_prompt() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let long_prompt = "p".repeat(100);

    let artifact = service.create_from_generated(Uuid::new_v4(), &long_prompt, generated(&[], Value::Null))
                          .await
                          .unwrap();
    assert_eq!(artifact.title.as_deref().unwrap().len(), 60);
}

#[tokio::test]
async fn upsert_actualiza_existentes_y_agrega_nuevos() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let artifact = service.create_from_generated(Uuid::new_v4(),
                                                 "p",
                                                 generated(&[("Token.sol", "contract Token {}")], Value::Null))
                          .await
                          .unwrap();

    let updated = service.update_generated_files(artifact.id,
                                                 vec![GeneratedFile { filename: "Token.sol".into(),
                                                                      content: "contract Token { uint x; }".into(),
                                                                      kind: None },
                                                      GeneratedFile { filename: "Vault.sol".into(),
                                                                      content: "contract Vault {}".into(),
                                                                      kind: None }])
                         .await
                         .unwrap();
    assert_eq!(updated.files.len(), 2);
    assert_eq!(updated.file("Token.sol").unwrap().content, "contract Token { uint x; }");
    assert_eq!(updated.file("Token.sol").unwrap().sha256,
               sol_domain::sha256_hex("contract Token { uint x; }"));
}

#[tokio::test]
async fn add_file_rechaza_duplicados_case_insensitive() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let artifact = service.create_from_generated(Uuid::new_v4(),
                                                 "p",
                                                 generated(&[("Token.sol", "contract Token {}")], Value::Null))
                          .await
                          .unwrap();

    let err = service.add_file(artifact.id, "token.SOL", "").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRequest(_)));
}

#[tokio::test]
async fn update_file_content_resetea_a_idle() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let artifact = service.create_from_generated(Uuid::new_v4(),
                                                 "p",
                                                 generated(&[("Token.sol", "contract Token {}")], Value::Null))
                          .await
                          .unwrap();

    // simular un resultado previo de compilación
    let mut a = store.load(artifact.id).await.unwrap();
    a.mark_all_result(&sol_domain::CompileOutcome::Success, chrono::Utc::now());
    store.save(&a).await.unwrap();

    let updated = service.update_file_content(artifact.id, "Token.sol", "contract Token { uint y; }")
                         .await
                         .unwrap();
    let file = updated.file("Token.sol").unwrap();
    assert_eq!(file.compilation.status, CompilationStatus::Idle);
    assert_eq!(file.sha256, sol_domain::sha256_hex("contract Token { uint y; }"));
}

#[tokio::test]
async fn update_de_archivo_inexistente_es_not_found() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let artifact = service.create_from_generated(Uuid::new_v4(), "p", generated(&[], Value::Null)).await.unwrap();

    let err = service.update_file_content(artifact.id, "Nope.sol", "x").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn listado_por_owner_ordena_por_updated_at() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let service = ArtifactService::new(store.clone());
    let owner = Uuid::new_v4();

    let first = service.create_from_generated(owner, "uno", generated(&[], Value::Null)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service.create_from_generated(owner, "dos", generated(&[], Value::Null)).await.unwrap();

    let list = store.list_for_owner(owner).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, second.id);
    assert_eq!(list[1].id, first.id);
}
