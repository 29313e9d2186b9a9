//! Configuration management.
//!
//! Settings come from `pricelens.toml` in the working directory (or an
//! explicit `--config` path), with every section optional. Environment
//! variables override the file where noted; the LLM API key is only ever
//! read from the environment, never from the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pricelens.toml";

/// Environment variable overriding the database path.
pub const ENV_DATABASE_PATH: &str = "PRICELENS_DB";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_orders")]
    pub orders: usize,
    #[serde(default = "default_seed_products")]
    pub products: usize,
    #[serde(default = "default_seed_customers")]
    pub customers: usize,
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("pricelens.db")
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_tokens() -> usize {
    1024
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_seed_orders() -> usize {
    1000
}

fn default_seed_products() -> usize {
    5
}

fn default_seed_customers() -> usize {
    10
}

fn default_rng_seed() -> u64 {
    42
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            orders: default_seed_orders(),
            products: default_seed_products(),
            customers: default_seed_customers(),
            rng_seed: default_rng_seed(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist; otherwise `pricelens.toml` is used if
    /// present and built-in defaults apply if not. Environment overrides
    /// are merged last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        explicit.display()
                    )));
                }
                Self::from_file(explicit)?
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.merge_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn merge_env(&mut self) {
        if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
            if !path.is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }
    }

    /// The LLM API key, if the configured environment variable is set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("pricelens.db"));
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.seed.orders, 1000);
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let parsed: Config = toml::from_str(
            r#"
            [database]
            path = "analytics.db"

            [server]
            port = 9090
            "#,
        )
        .unwrap();

        assert_eq!(parsed.database.path, PathBuf::from("analytics.db"));
        assert_eq!(parsed.server.port, 9090);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.llm.model, default_model());
        assert_eq!(parsed.seed.products, 5);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/pricelens.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn llm_section_parses() {
        let parsed: Config = toml::from_str(
            r#"
            [llm]
            model = "claude-3-5-haiku-latest"
            temperature = 0.2
            max_tokens = 2048
            "#,
        )
        .unwrap();

        assert_eq!(parsed.llm.model, "claude-3-5-haiku-latest");
        assert!((parsed.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(parsed.llm.max_tokens, 2048);
    }
}
