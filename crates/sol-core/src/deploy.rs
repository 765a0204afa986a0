//! Registro de despliegues on-chain contra archivos compilados.
//!
//! Independiente de la compilación: no exige `status == success` (permite
//! registrar despliegues hechos out-of-band). La lista de despliegues del
//! archivo target se reemplaza COMPLETA con la secuencia provista.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sol_domain::{Artifact, Deployment};

use crate::errors::CoreError;
use crate::store::ArtifactStore;

/// Payload de un despliegue tal como llega del boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: String,
    pub network: String,
    pub tx_hash: String,
    /// Opcional en el request; se completa con `now` al registrar.
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
}

/// Selector del archivo target.
#[derive(Debug, Clone)]
pub enum DeployTarget {
    /// Todos los archivos compilables del artifact.
    AllSolidity,
    /// Primera coincidencia por substring case-insensitive sobre la ruta.
    File(String),
}

pub struct DeploymentRecorder<S> {
    store: Arc<S>,
}

impl<S: ArtifactStore> DeploymentRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registra los despliegues contra el target y devuelve el artifact
    /// actualizado.
    pub async fn record(&self,
                        artifact_id: Uuid,
                        target: DeployTarget,
                        deployments: Vec<DeploymentRecord>)
                        -> Result<Artifact, CoreError> {
        if deployments.is_empty() {
            return Err(CoreError::InvalidRequest(
                "deployedContracts must be a non-empty array of { address, network, txHash, deployedAt } objects".into(),
            ));
        }

        let mut artifact = self.store.load(artifact_id).await?;
        let records: Vec<Deployment> =
            deployments.into_iter()
                       .map(|d| Deployment::new(d.address, d.network, d.tx_hash, d.deployed_at))
                       .collect();

        let updated = match &target {
            DeployTarget::AllSolidity => {
                let mut count = 0usize;
                for f in artifact.files.iter_mut().filter(|f| f.is_solidity) {
                    f.replace_deployments(records.clone());
                    count += 1;
                }
                count
            }
            DeployTarget::File(name) => match artifact.file_mut_fuzzy(name) {
                Some(f) => {
                    f.replace_deployments(records);
                    1
                }
                None => 0,
            },
        };

        if updated == 0 {
            let what = match target {
                DeployTarget::File(name) => format!("file matching '{name}'"),
                DeployTarget::AllSolidity => "solidity files".to_string(),
            };
            return Err(CoreError::NotFound(format!("{what} in artifact {artifact_id}")));
        }

        artifact.touch();
        self.store.save(&artifact).await?;
        Ok(artifact)
    }
}
