//! Configuration for the query layer
//!
//! Loads translation, execution and logging settings from a YAML file.
//! Environment variables always override file values.

use esql_compile::{CompileOptions, NamingPolicy};
use esql_exec::QueryOptions;
use esql_ir::ParameterMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// "inline" or "parameterized"
    pub parameter_mode: String,

    /// Exact-match sub-field appended to full-text fields
    pub keyword_suffix: String,

    /// Anonymous member naming: preserve, camel_case, snake_case
    pub naming_policy: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            parameter_mode: "inline".to_string(),
            keyword_suffix: ".keyword".to_string(),
            naming_policy: "camel_case".to_string(),
        }
    }
}

impl TranslationConfig {
    pub fn compile_options(&self) -> Result<CompileOptions, ConfigError> {
        let mode = match self.parameter_mode.to_ascii_lowercase().as_str() {
            "inline" => ParameterMode::Inline,
            "parameterized" => ParameterMode::Parameterized,
            _ => return Err(invalid("parameter_mode", &self.parameter_mode)),
        };
        let naming = NamingPolicy::parse(&self.naming_policy)
            .ok_or_else(|| invalid("naming_policy", &self.naming_policy))?;

        Ok(CompileOptions {
            mode,
            keyword_suffix: self.keyword_suffix.clone(),
            naming,
        })
    }
}

/// Execution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub time_zone: Option<String>,
    pub locale: Option<String>,
    pub columnar: bool,
    pub profile: bool,
}

impl ExecutionConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            time_zone: self.time_zone.clone(),
            locale: self.locale.clone(),
            columnar: self.columnar,
            profile: self.profile,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translation: TranslationConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(mode) = std::env::var("ESQL_PARAMETER_MODE") {
            self.translation.parameter_mode = mode;
        }
        if let Ok(suffix) = std::env::var("ESQL_KEYWORD_SUFFIX") {
            self.translation.keyword_suffix = suffix;
        }
        if let Ok(naming) = std::env::var("ESQL_NAMING_POLICY") {
            self.translation.naming_policy = naming;
        }

        if let Ok(tz) = std::env::var("ESQL_TIME_ZONE") {
            self.execution.time_zone = Some(tz);
        }
        if let Ok(locale) = std::env::var("ESQL_LOCALE") {
            self.execution.locale = Some(locale);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
