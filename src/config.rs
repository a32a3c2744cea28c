//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. a TOML file: the explicit path, else `MINISPEC_CONFIG_PATH`, else an
//!    optional `minispec.toml` in the working directory
//! 3. `MINISPEC_*` environment variables (`.env` honoured), nested keys
//!    separated by `__`, e.g. `MINISPEC_INTERPRETER__FAILURE_SENTINEL`
//! 4. builder overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::interpreter::InterpreterOptions;

pub const ENV_PREFIX: &str = "MINISPEC";
pub const CONFIG_PATH_ENV: &str = "MINISPEC_CONFIG_PATH";
const DEFAULT_CONFIG_NAME: &str = "minispec";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// TOML file of high-level skill templates
    pub skill_library: Option<PathBuf>,
    pub interpreter: InterpreterOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            skill_library: None,
            interpreter: InterpreterOptions::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a TOML document, without consulting files or the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    log_filter: Option<String>,
    skill_library: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    pub fn skill_library(mut self, path: Option<PathBuf>) -> Self {
        self.skill_library = path;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let path = self
            .config_path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let file = match &path {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let mut config: Config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| match &path {
                Some(path) => format!("Failed to load configuration from {}", path.display()),
                None => "Failed to load configuration".to_string(),
            })?
            .try_deserialize()
            .context("Invalid configuration")?;

        if let Some(filter) = self.log_filter {
            config.log_filter = filter;
        }
        if let Some(library) = self.skill_library {
            config.skill_library = Some(library);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.interpreter.failure_sentinel, "rp");
        assert!(!config.interpreter.forward_high_level_results);
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            log_filter = "minispec=debug"
            skill_library = "skills.toml"

            [interpreter]
            forward_high_level_results = true
            "#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "minispec=debug");
        assert_eq!(config.skill_library, Some(PathBuf::from("skills.toml")));
        assert!(config.interpreter.forward_high_level_results);
        assert_eq!(config.interpreter.failure_sentinel, "rp");
    }

    #[test]
    fn test_builder_reads_file_and_applies_overrides() {
        let path = std::env::temp_dir().join(format!("minispec-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "log_filter = \"warn\"\n[interpreter]\nfailure_sentinel = \"abort\"\n",
        )
        .unwrap();

        let config = Config::builder()
            .config_path(Some(path.clone()))
            .skill_library(Some(PathBuf::from("lib.toml")))
            .build();
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert_eq!(config.interpreter.failure_sentinel, "abort");
        assert_eq!(config.skill_library, Some(PathBuf::from("lib.toml")));
    }

    #[test]
    fn test_builder_missing_explicit_file_fails() {
        let result = Config::builder()
            .config_path(Some(PathBuf::from("/nonexistent/minispec.toml")))
            .build();
        assert!(result.is_err());
    }
}
