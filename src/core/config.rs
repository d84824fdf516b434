//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.docchat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::BackendMode;
use crate::api::http::{DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT_SECS};
use crate::core::format::{FormatterConfig, HeadingMap};
use crate::core::validate::{BYTES_PER_MB, UploadPolicy};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DocChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub formatter: FormatterSettings,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub mode: Option<BackendMode>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UploadConfig {
    pub allowed_extensions: Option<Vec<String>>,
    pub allowed_mime_types: Option<Vec<String>>,
    pub max_size_mb: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FormatterSettings {
    pub escape_html: Option<bool>,
    /// Marker (`"#"`, `"##"`, ...) → HTML heading level.
    pub headings: Option<BTreeMap<String, u8>>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOG_FILE: &str = "docchat.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    pub backend_url: String,
    pub backend_mode: BackendMode,
    pub timeout_secs: u64,
    pub upload_policy: UploadPolicy,
    pub formatter: FormatterConfig,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.docchat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".docchat").join("config.toml"))
}

/// Load config from `~/.docchat/config.toml`, or from `explicit` when given.
///
/// If the default file doesn't exist, generates a commented-out default and
/// returns `DocChatConfig::default()`. An explicit path must exist. A file
/// that exists but is malformed returns `ConfigError::Parse`.
pub fn load_config(explicit: Option<&Path>) -> Result<DocChatConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(DocChatConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(DocChatConfig::default());
    }

    load_from(&path)
}

fn load_from(path: &Path) -> Result<DocChatConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: DocChatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r####"# docchat configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "info"                 # error, warn, info, debug, trace (env DOCCHAT_LOG_LEVEL)
# log_file = "docchat.log"

# [backend]
# base_url = "http://localhost:8000" # Or set DOCCHAT_BACKEND_URL, or pass --backend
# mode = "query"                     # "query" (POST /query) or "chat" (POST /chat)
# timeout_secs = 60

# [upload]
# allowed_extensions = [".pdf", ".doc", ".docx"]
# allowed_mime_types = [
#   "application/pdf",
#   "application/msword",
#   "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
# ]
# max_size_mb = 10

# [formatter]
# escape_html = true                 # false lets raw HTML in answers through

# [formatter.headings]
# "#" = 2
# "##" = 2
# "###" = 3
"####;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_backend` and `cli_mode` are from CLI flags (None = not specified).
pub fn resolve(
    config: &DocChatConfig,
    cli_backend: Option<&str>,
    cli_mode: Option<BackendMode>,
) -> ResolvedConfig {
    // Backend URL: CLI → env → config → default
    let backend_url = cli_backend
        .map(|s| s.to_string())
        .or_else(|| std::env::var("DOCCHAT_BACKEND_URL").ok())
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    // Mode: CLI → config → default
    let backend_mode = cli_mode.or(config.backend.mode).unwrap_or_default();

    // Log level: env → config → default
    let log_level = std::env::var("DOCCHAT_LOG_LEVEL")
        .ok()
        .or_else(|| config.general.log_level.clone())
        .map(|level| parse_log_level(&level))
        .unwrap_or(DEFAULT_LOG_LEVEL);

    ResolvedConfig {
        log_level,
        log_file: PathBuf::from(
            config
                .general
                .log_file
                .as_deref()
                .unwrap_or(DEFAULT_LOG_FILE),
        ),
        backend_url,
        backend_mode,
        timeout_secs: config.backend.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        upload_policy: resolve_upload_policy(&config.upload),
        formatter: resolve_formatter(&config.formatter),
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or_else(|_| {
        warn!("Unknown log level {:?}, using {}", level, DEFAULT_LOG_LEVEL);
        DEFAULT_LOG_LEVEL
    })
}

fn resolve_upload_policy(upload: &UploadConfig) -> UploadPolicy {
    let defaults = UploadPolicy::default();
    UploadPolicy {
        allowed_extensions: upload
            .allowed_extensions
            .clone()
            .unwrap_or(defaults.allowed_extensions),
        allowed_mime_types: upload
            .allowed_mime_types
            .clone()
            .unwrap_or(defaults.allowed_mime_types),
        max_size_bytes: upload
            .max_size_mb
            .map(|mb| mb.saturating_mul(BYTES_PER_MB))
            .unwrap_or(defaults.max_size_bytes),
    }
}

/// A configured heading table replaces the default one entirely.
fn resolve_formatter(settings: &FormatterSettings) -> FormatterConfig {
    let headings = match &settings.headings {
        None => HeadingMap::default(),
        Some(table) => {
            let mut headings = HeadingMap::new();
            for (marker, level) in table {
                let valid_marker = !marker.is_empty() && marker.chars().all(|c| c == '#');
                if !valid_marker || !headings.insert(marker.len(), *level) {
                    warn!("Ignoring heading mapping {:?} = {}", marker, level);
                }
            }
            if headings.is_empty() {
                info!("No heading mappings configured, # lines stay literal");
            }
            headings
        }
    };

    FormatterConfig {
        escape_html: settings.escape_html.unwrap_or(true),
        headings,
    }
}
