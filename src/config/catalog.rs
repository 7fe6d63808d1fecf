//! Catalog configuration types.

use serde::Deserialize;

/// Catalog configuration (discriminated by `type`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// `postgres` or `sqlite`.
    #[serde(rename = "type")]
    pub catalog_type: String,
    pub postgres: PostgresConfig,
    pub sqlite: SqliteConfig,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Connection attempts at startup before giving up.
    pub connect_attempts: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_type: "postgres".to_string(),
            postgres: PostgresConfig::default(),
            sqlite: SqliteConfig::default(),
            max_connections: 20,
            connect_attempts: 10,
        }
    }
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL connection URI.
    pub uri: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/alerts".to_string(),
        }
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`.
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "./data/alerts.db".to_string(),
        }
    }
}
