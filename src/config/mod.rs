//! Application configuration.
//!
//! Aggregates the per-area sections into a single Config struct loaded from
//! YAML files and environment variables.

mod catalog;
mod engine;
mod lifecycle;
mod scripts;
mod server;

pub use catalog::{CatalogConfig, PostgresConfig, SqliteConfig};
pub use engine::EngineConfig;
pub use lifecycle::LifecycleConfig;
pub use scripts::ScriptsConfig;
pub use server::ServerConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ALERTS_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ALERTS";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ALERTS_LOG";
/// Legacy environment variable for the rule engine URL.
pub const ENGINE_URL_ENV_VAR: &str = "KAPACITOR_URL";
/// Legacy environment variable for the catalog database URL.
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub catalog: CatalogConfig,
    pub lifecycle: LifecycleConfig,
    pub scripts: ScriptsConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. Legacy `KAPACITOR_URL` / `DATABASE_URL` variables (if set)
    /// 2. `config.yaml` in current directory (if exists)
    /// 3. File specified by `path` argument (if provided)
    /// 4. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 5. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder();

        if let Ok(url) = std::env::var(ENGINE_URL_ENV_VAR) {
            builder = builder.set_default("engine.url", url)?;
        }
        if let Ok(uri) = std::env::var(DATABASE_URL_ENV_VAR) {
            builder = builder.set_default("catalog.postgres.uri", uri)?;
        }

        builder =
            builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        let mut config = Self::default();
        config.catalog.catalog_type = "sqlite".to_string();
        config.catalog.sqlite.path = ":memory:".to_string();
        config
    }
}
