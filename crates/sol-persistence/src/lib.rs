//! sol-persistence
//!
//! Implementación Postgres (Diesel) del `ArtifactStore` del core, más
//! utilidades de conexión y migraciones. El documento completo del artifact
//! (archivos, estados de compilación, despliegues) vive en una columna JSONB;
//! las columnas relacionales duplican sólo lo necesario para listar y filtrar
//! sin deserializar el documento.
//!
//! Módulos:
//! - `pg`: store sobre Postgres (tabla `artifacts` con upsert por id).
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tabla Diesel declarada para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, ConnectionProvider, PgArtifactStore, PgPool, PoolProvider};
