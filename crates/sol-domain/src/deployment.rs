//! Registro de despliegue on-chain.
//!
//! Un `Deployment` es inmutable una vez registrado: la lista de un archivo se
//! reemplaza completa en cada registro (nunca se mergea por address).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub address: String,
    pub network: String,
    pub tx_hash: String,
    pub deployed_at: DateTime<Utc>,
}

impl Deployment {
    pub fn new(address: impl Into<String>,
               network: impl Into<String>,
               tx_hash: impl Into<String>,
               deployed_at: Option<DateTime<Utc>>)
               -> Self {
        Self { address: address.into(),
               network: network.into(),
               tx_hash: tx_hash.into(),
               deployed_at: deployed_at.unwrap_or_else(Utc::now) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializa_con_nombres_del_documento() {
        let d = Deployment::new("0xabc", "sepolia", "0x1", None);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["address"], "0xabc");
        assert_eq!(v["txHash"], "0x1");
        assert!(v.get("deployedAt").is_some());
    }
}
