use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::core::error::{FileError, MigrateError};
use crate::core::prompt::Prompter;
use crate::rpc::client::Credentials;

/// Optional on-disk configuration. Anything left out is asked for on stdin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: EndpointConfig,
    #[serde(default)]
    pub target: EndpointConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    pub source_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    pub passkey: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_path")]
    pub path: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_rpc_path() -> String {
    "/transmission/rpc".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            path: default_rpc_path(),
            timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.rpc.path.starts_with('/') {
            bail!("rpc.path must start with '/', got '{}'", self.rpc.path);
        }

        if self.rpc.timeout_secs == Some(0) {
            bail!("rpc.timeout_secs must be greater than 0");
        }

        for (section, endpoint) in [("source", &self.source), ("target", &self.target)] {
            if let Some(url) = &endpoint.url {
                if let Err(e) = endpoint_url(url, &self.rpc.path) {
                    bail!("Invalid {}.url: {}", section, e);
                }
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

/// A fully resolved RPC endpoint
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub credentials: Credentials,
}

/// Everything a migration run needs, after merging the config file with prompt answers
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Endpoint,
    pub target: Endpoint,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub passkey: String,
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Fill in every value the config left out by prompting, in a fixed order.
    pub fn resolve<R: BufRead, W: Write>(
        config: &Config,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Self, MigrateError> {
        let source_url = prompter.value_or_ask(config.source.url.as_deref(), "Source Transmission address")?;
        let source_user = prompter.value_or_ask(config.source.username.as_deref(), "Source Transmission username")?;
        let source_pass = prompter.value_or_ask(config.source.password.as_deref(), "Source Transmission password")?;

        let target_url = prompter.value_or_ask(config.target.url.as_deref(), "Target Transmission address")?;
        let target_user = prompter.value_or_ask(config.target.username.as_deref(), "Target Transmission username")?;
        let target_pass = prompter.value_or_ask(config.target.password.as_deref(), "Target Transmission password")?;

        let source_dir = match &config.paths.source_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(prompter.ask("Source torrent directory")?),
        };
        let target_dir = match &config.paths.target_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(prompter.ask("Target torrent directory")?),
        };

        let passkey = prompter.value_or_ask(config.filter.passkey.as_deref(), "Passkey")?;

        if !source_dir.exists() {
            return Err(FileError::MissingSourceDir(source_dir).into());
        }

        if passkey.is_empty() {
            warn!("Passkey is empty, every torrent with at least one tracker will match");
        }

        Ok(Self {
            source: Endpoint {
                url: endpoint_url(&source_url, &config.rpc.path)?,
                credentials: Credentials::new(source_user, source_pass),
            },
            target: Endpoint {
                url: endpoint_url(&target_url, &config.rpc.path)?,
                credentials: Credentials::new(target_user, target_pass),
            },
            source_dir,
            target_dir,
            passkey,
            timeout: config.rpc.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Join an instance base address and the RPC path into the endpoint URL
pub fn endpoint_url(base: &str, rpc_path: &str) -> Result<String, MigrateError> {
    let base = base.trim().trim_end_matches('/');
    let joined = format!("{}{}", base, rpc_path);

    let url = Url::parse(&joined)
        .map_err(|e| MigrateError::Config(format!("'{}' is not a valid URL: {}", joined, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(MigrateError::Config(format!(
            "'{}' must use http or https",
            joined
        )));
    }

    Ok(joined)
}
