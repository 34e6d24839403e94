use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, VerbosityLevel};
use crate::engine::{CommandEngine, JsonSchemaEngine, SchemaEngine};
use crate::error::{ConfigError, ConfigResult as Result};
use crate::http_client::HttpClientConfig;
use crate::schemas::{SchemaKind, SchemaSource};

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub zenodo: ZenodoConfig,
    pub schemas: SchemaConfig,
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts for failed downloads
    pub retry_attempts: u32,
    /// Retry delay in milliseconds
    pub retry_delay_ms: u64,
}

/// Zenodo records API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZenodoConfig {
    pub api_url: String,
    pub sandbox_api_url: String,
}

/// Schema document overrides; `None` uses the embedded schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SchemaConfig {
    pub legacy: Option<PathBuf>,
    pub current: Option<PathBuf>,
}

/// Current-schema engine selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// External validator command line; the in-process engine is used when unset
    pub command: Option<Vec<String>>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for ZenodoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://zenodo.org/api/records".to_string(),
            sandbox_api_url: "https://sandbox.zenodo.org/api/records".to_string(),
        }
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout_seconds: self.network.timeout_seconds,
            retry_attempts: self.network.retry_attempts,
            retry_delay_ms: self.network.retry_delay_ms,
            ..Default::default()
        }
    }

    pub fn legacy_schema(&self) -> SchemaSource {
        schema_source(SchemaKind::Legacy, self.schemas.legacy.as_deref())
    }

    pub fn current_schema(&self) -> SchemaSource {
        schema_source(SchemaKind::Current, self.schemas.current.as_deref())
    }

    /// The engine that checks files against the current schema
    pub fn current_engine(&self) -> Box<dyn SchemaEngine> {
        match &self.engine.command {
            Some(argv) => Box::new(CommandEngine::new(argv.clone(), self.current_schema())),
            None => Box::new(JsonSchemaEngine::new(self.current_schema())),
        }
    }
}

fn schema_source(kind: SchemaKind, path: Option<&Path>) -> SchemaSource {
    match path {
        Some(path) => SchemaSource::file(kind, path),
        None => SchemaSource::embedded(kind),
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// Load configuration reading the environment through `env`
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = ["pfhub.toml", "pfhub.json", ".pfhub.toml", ".pfhub.json"];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.is_file() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("pfhub");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.is_file() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(timeout) = env.get("PFHUB_TIMEOUT") {
            config.network.timeout_seconds = parse_env("PFHUB_TIMEOUT", &timeout)?;
        }
        if let Some(retry_attempts) = env.get("PFHUB_RETRY_ATTEMPTS") {
            config.network.retry_attempts = parse_env("PFHUB_RETRY_ATTEMPTS", &retry_attempts)?;
        }
        if let Some(retry_delay) = env.get("PFHUB_RETRY_DELAY_MS") {
            config.network.retry_delay_ms = parse_env("PFHUB_RETRY_DELAY_MS", &retry_delay)?;
        }

        if let Some(api_url) = env.get("PFHUB_ZENODO_API_URL") {
            config.zenodo.api_url = api_url;
        }
        if let Some(sandbox_api_url) = env.get("PFHUB_ZENODO_SANDBOX_API_URL") {
            config.zenodo.sandbox_api_url = sandbox_api_url;
        }

        if let Some(legacy) = env.get("PFHUB_LEGACY_SCHEMA") {
            config.schemas.legacy = Some(PathBuf::from(legacy));
        }
        if let Some(current) = env.get("PFHUB_CURRENT_SCHEMA") {
            config.schemas.current = Some(PathBuf::from(current));
        }

        if let Some(command) = env.get("PFHUB_ENGINE_COMMAND") {
            config.engine.command = Some(command.split_whitespace().map(str::to_string).collect());
        }

        if let Some(verbose) = env.get("PFHUB_VERBOSE") {
            config.output.verbose = parse_env("PFHUB_VERBOSE", &verbose)?;
        }
        if let Some(quiet) = env.get("PFHUB_QUIET") {
            config.output.quiet = parse_env("PFHUB_QUIET", &quiet)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }
        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        for (name, url) in [
            ("zenodo.api_url", &config.zenodo.api_url),
            ("zenodo.sandbox_api_url", &config.zenodo.sandbox_api_url),
        ] {
            reqwest::Url::parse(url).map_err(|e| {
                ConfigError::Validation(format!("{} is not a valid URL: {} ({})", name, url, e))
            })?;
        }

        if let Some(command) = &config.engine.command
            && command.is_empty()
        {
            return Err(ConfigError::Validation(
                "engine.command must name a program".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", name, value)))
}
