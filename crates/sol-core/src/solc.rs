//! Documentos standard-JSON intercambiados con el backend de compilación.
//!
//! El shape replica el protocolo estándar de solc: el input lleva `language`,
//! `sources` y `settings`; el output trae `errors` y `contracts` más campos
//! extra que no interpretamos (se preservan vía `flatten` para devolver el
//! documento completo bit-for-bit al caller).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const SOLIDITY_LANGUAGE: &str = "Solidity";

/// `{content}` de un source en el input estándar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolcSource {
    pub content: String,
}

/// Input estándar `{language, sources, settings}`.
///
/// `sources` mantiene el orden de inserción del request (IndexMap): el orden
/// de archivos es parte del documento observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolcInput {
    pub language: String,
    pub sources: IndexMap<String, SolcSource>,
    pub settings: Value,
}

impl SolcInput {
    pub fn new(sources: IndexMap<String, String>, settings: Value) -> Self {
        Self { language: SOLIDITY_LANGUAGE.to_string(),
               sources: sources.into_iter()
                               .map(|(path, content)| (path, SolcSource { content }))
                               .collect(),
               settings }
    }
}

/// Settings por defecto: optimizer activo y selección de outputs completa
/// (abi, bytecode, deployed bytecode, metadata, method identifiers, NatSpec y
/// AST). Un `settings` provisto por el caller REEMPLAZA este documento entero,
/// no se mergea.
pub fn default_settings() -> Value {
    json!({
        "optimizer": { "enabled": true, "runs": 200 },
        "outputSelection": {
            "*": {
                "*": ["abi", "evm.bytecode", "evm.deployedBytecode", "metadata",
                      "evm.methodIdentifiers", "devdoc", "userdoc"],
                "": ["ast"]
            }
        }
    })
}

/// Diagnóstico del compilador. `severity == "error"` bloquea el éxito del
/// run; los warnings no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolcDiagnostic {
    #[serde(default)]
    pub severity: String,
    #[serde(default, rename = "formattedMessage", skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SolcDiagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }

    /// Mensaje formateado con fallback al mensaje plano.
    pub fn display_message(&self) -> &str {
        self.formatted_message
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("unknown compiler error")
    }
}

/// Output estándar completo. Los campos que el pipeline no interpreta
/// (p. ej. `sources` con AST) viajan en `extra` y se serializan de vuelta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolcOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SolcDiagnostic>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub contracts: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SolcOutput {
    /// ¿El run es un fallo de compilación? (algún diagnóstico con severidad
    /// `error`; warnings solos no cuentan).
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(SolcDiagnostic::is_error)
    }

    /// Mensajes formateados de TODOS los diagnósticos con severidad `error`.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.display_message().to_string())
            .collect()
    }

    /// Imports que el compilador no pudo resolver en este round.
    ///
    /// solc reporta `Source "X" not found: File not found.` como ParserError;
    /// extraemos la ruta citada para alimentar el resolver asíncrono.
    pub fn missing_imports(&self) -> Vec<String> {
        let mut out = Vec::new();
        for d in &self.errors {
            let msg = d.display_message();
            if let Some(path) = extract_missing_source(msg) {
                if !out.contains(&path) {
                    out.push(path);
                }
            }
        }
        out
    }
}

fn extract_missing_source(msg: &str) -> Option<String> {
    if !msg.contains("not found") {
        return None;
    }
    let rest = msg.split("Source \"").nth(1)?;
    let path = rest.split('"').next()?;
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}
