//! Configuration loading and resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument / environment variable (supplied as [`ConfigOverrides`])
//! 2. TOML config file
//! 3. Compiled default
//!
//! API keys are read from the environment first (`RANKING_API_KEY`,
//! `CATALOG_API_KEY`), then from the TOML file.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port for the gateway
pub const DEFAULT_PORT: u16 = 5780;
/// Default bind address (loopback; put a reverse proxy in front for public traffic)
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
/// Bestseller list served when the caller names none
pub const DEFAULT_CATEGORY: &str = "hardcover-fiction";
pub const DEFAULT_RANKING_BASE_URL: &str = "https://api.nytimes.com/svc/books/v3";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://www.googleapis.com/books/v1";
/// 24 hours
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 8;
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// Environment variable holding the ranking upstream API key
pub const RANKING_API_KEY_ENV: &str = "RANKING_API_KEY";
/// Environment variable holding the catalog upstream API key
pub const CATALOG_API_KEY_ENV: &str = "CATALOG_API_KEY";

/// On-disk configuration. Every field is optional; absent fields fall back
/// to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub ranking_base_url: Option<String>,
    pub catalog_base_url: Option<String>,
    pub ranking_api_key: Option<String>,
    pub catalog_api_key: Option<String>,
    pub default_category: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub enrichment_concurrency: Option<usize>,
    pub enrichment_timeout_ms: Option<u64>,
    pub upstream_timeout_ms: Option<u64>,
}

/// Values supplied on the command line or through environment variables.
/// These win over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub ranking_base_url: Option<String>,
    pub catalog_base_url: Option<String>,
}

/// Fully resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind_address: String,
    pub ranking_base_url: String,
    pub catalog_base_url: String,
    /// Not validated up front; the bestseller route forwards whatever it has
    pub ranking_api_key: Option<String>,
    /// Checked per request by the volume and search proxies
    pub catalog_api_key: Option<String>,
    pub default_category: String,
    pub cache_ttl: Duration,
    pub enrichment_concurrency: usize,
    pub enrichment_timeout: Duration,
    pub upstream_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            ranking_base_url: DEFAULT_RANKING_BASE_URL.to_string(),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            ranking_api_key: None,
            catalog_api_key: None,
            default_category: DEFAULT_CATEGORY.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            enrichment_timeout: Duration::from_millis(DEFAULT_ENRICHMENT_TIMEOUT_MS),
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
        }
    }
}

impl GatewayConfig {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let enrichment_concurrency = toml_config
            .enrichment_concurrency
            .unwrap_or(defaults.enrichment_concurrency);
        if enrichment_concurrency == 0 {
            return Err(Error::Config(
                "enrichment_concurrency must be at least 1".to_string(),
            ));
        }

        let default_category = toml_config
            .default_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.default_category);

        Ok(Self {
            port: overrides.port.or(toml_config.port).unwrap_or(defaults.port),
            bind_address: overrides
                .bind_address
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or(defaults.bind_address),
            ranking_base_url: normalize_base_url(
                overrides
                    .ranking_base_url
                    .or_else(|| toml_config.ranking_base_url.clone())
                    .unwrap_or(defaults.ranking_base_url),
            ),
            catalog_base_url: normalize_base_url(
                overrides
                    .catalog_base_url
                    .or_else(|| toml_config.catalog_base_url.clone())
                    .unwrap_or(defaults.catalog_base_url),
            ),
            ranking_api_key: resolve_api_key(
                "Ranking",
                RANKING_API_KEY_ENV,
                toml_config.ranking_api_key.as_deref(),
            ),
            catalog_api_key: resolve_api_key(
                "Catalog",
                CATALOG_API_KEY_ENV,
                toml_config.catalog_api_key.as_deref(),
            ),
            default_category,
            cache_ttl: toml_config
                .cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            enrichment_concurrency,
            enrichment_timeout: toml_config
                .enrichment_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.enrichment_timeout),
            upstream_timeout: toml_config
                .upstream_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.upstream_timeout),
        })
    }

    /// `bind_address:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Resolve an API key from environment, then TOML
///
/// Blank values count as absent. Logs where the key came from, and warns
/// when both sources define one.
pub fn resolve_api_key(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in both {} and TOML config. Using environment variable.",
            label, env_var
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", label);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", label);
        return Some(key.trim().to_string());
    }

    warn!(
        "{} API key not configured (set {} or {} in the TOML config)",
        label,
        env_var,
        env_var.to_lowercase()
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default TOML location: `<config_dir>/allbookd/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("allbookd").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load the TOML config if present
///
/// A missing file is not an error: a warning is logged and defaults are
/// used. A file that exists but does not parse is reported as
/// [`Error::Config`].
pub fn load_toml_config_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        warn!("Could not determine config directory, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)
        .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
