//! Configuration for the simple-httpd server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::http::catalog::DEFAULT_PAGE_TEMPLATE;
use crate::http::{HeaderGroups, HttpOptions, StatusCatalog};
use crate::transport::TransportOptions;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for the HTTP server
#[derive(Parser, Debug, Default)]
#[command(name = "simple-httpd")]
#[command(version = "0.1.0")]
#[command(about = "A minimal HTTP/1.0 and HTTP/1.1 server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:8080)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen backlog
    #[arg(long)]
    pub backlog: Option<u32>,

    /// Socket read size in bytes
    #[arg(short = 'b', long)]
    pub buffer_size: Option<usize>,

    /// Idle read timeout in milliseconds (0 = wait forever)
    #[arg(short = 't', long)]
    pub read_timeout_ms: Option<u64>,

    /// Server name sent in the Server header
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Answer TRACE requests by echoing them (true or false)
    #[arg(long)]
    pub trace_enabled: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transport-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Idle read timeout in milliseconds, 0 for none
    #[serde(default)]
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            buffer_size: default_buffer_size(),
            read_timeout_ms: 0,
        }
    }
}

/// HTTP-related configuration
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub trace_enabled: bool,
    /// `Group: Name, Name` lines replacing the standard header groups
    pub header_groups_file: Option<PathBuf>,
    /// HTML error page template
    pub page_template_file: Option<PathBuf>,
    /// Value of the template's `%language%` placeholder
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            trace_enabled: false,
            header_groups_file: None,
            page_template_file: None,
            language: default_language(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_backlog() -> u32 {
    1024
}

fn default_buffer_size() -> usize {
    1024
}

fn default_name() -> String {
    HttpOptions::default().name
}

fn default_language() -> String {
    "en".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub backlog: u32,
    pub buffer_size: usize,
    pub read_timeout: Option<Duration>,
    pub name: String,
    pub trace_enabled: bool,
    pub header_groups_file: Option<PathBuf>,
    pub page_template_file: Option<PathBuf>,
    pub language: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        let toml_config = match cli.config {
            Some(ref config_path) => {
                let contents = read_file(config_path)?;
                toml::from_str(&contents)
                    .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
            }
            None => TomlConfig::default(),
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args over TOML values.
    pub fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let listen = cli.listen.unwrap_or(toml_config.server.listen);
        let listen = listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(listen.clone()))?;

        let read_timeout_ms = cli
            .read_timeout_ms
            .unwrap_or(toml_config.server.read_timeout_ms);

        Ok(Config {
            listen,
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            buffer_size: cli
                .buffer_size
                .unwrap_or(toml_config.server.buffer_size)
                .max(1),
            read_timeout: (read_timeout_ms > 0).then(|| Duration::from_millis(read_timeout_ms)),
            name: cli.name.unwrap_or(toml_config.http.name),
            trace_enabled: cli.trace_enabled.unwrap_or(toml_config.http.trace_enabled),
            header_groups_file: toml_config.http.header_groups_file,
            page_template_file: toml_config.http.page_template_file,
            language: toml_config.http.language,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            listen: self.listen,
            backlog: self.backlog,
            buffer_size: self.buffer_size,
            read_timeout: self.read_timeout,
        }
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            name: self.name.clone(),
            trace_enabled: self.trace_enabled,
        }
    }

    /// Header groups from the configured file, or the standard table.
    pub fn header_groups(&self) -> Result<HeaderGroups, ConfigError> {
        match &self.header_groups_file {
            Some(path) => Ok(HeaderGroups::from_lines(&read_file(path)?)),
            None => Ok(HeaderGroups::standard()),
        }
    }

    /// English catalog, with the configured page template if any.
    pub fn status_catalog(&self) -> Result<StatusCatalog, ConfigError> {
        let template = match &self.page_template_file {
            Some(path) => read_file(path)?,
            None => DEFAULT_PAGE_TEMPLATE.to_string(),
        };
        Ok(StatusCatalog::english().with_page_template(template, self.language.clone()))
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidListen(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidListen(addr) => {
                write!(f, "Invalid listen address '{}'", addr)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
