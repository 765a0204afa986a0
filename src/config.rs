//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! Las secciones cubren el backend de compilación (binario local y registry
//! remoto de builds versionados).

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Configuración global de la aplicación (extensible para más secciones: logging, etc.).
pub struct AppConfig {
    /// Configuración específica del compilador.
    pub solc: SolcConfig,
}

/// Parámetros del backend de compilación.
pub struct SolcConfig {
    /// Binario solc por defecto del proceso (`SOLC_BIN`, o `solc` en el PATH).
    pub bin: String,
    /// Base URL del registry de builds versionados (`list.json` + binarios).
    pub releases_url: String,
    /// Directorio local donde se cachean los builds descargados.
    pub cache_dir: PathBuf,
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    let bin = env::var("SOLC_BIN").unwrap_or_else(|_| "solc".to_string());
    let releases_url = env::var("SOLC_RELEASES_URL")
        .unwrap_or_else(|_| "https://binaries.soliditylang.org/linux-amd64".to_string());
    let cache_dir = env::var("SOLC_CACHE_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".solflow").join("solc")
    });
    AppConfig { solc: SolcConfig { bin, releases_url, cache_dir } }
});
