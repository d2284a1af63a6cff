//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from environment variables (a `.env`
//! file is honoured) on top of defaults. Invalid values are startup errors.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use crate::domains::tools::ToolProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Location of the OpenAPI document.
    pub openapi: OpenApiConfig,

    /// Which tools are exposed.
    pub tools: ToolsConfig,

    /// Upstream Mailjet API access.
    pub mailjet: MailjetConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// Instructions reported to clients on initialize.
    pub description: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL` and `MCP_LOG_TIMESTAMPS`.
    ///
    /// Kept separate so logging can be initialized before the rest of the
    /// configuration is loaded.
    pub fn from_env() -> Self {
        let mut logging = Self::default();
        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(raw) = std::env::var("MCP_LOG_TIMESTAMPS") {
            logging.with_timestamps = !matches!(raw.trim().to_lowercase().as_str(), "false" | "0");
        }
        logging
    }
}

/// OpenAPI document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiConfig {
    /// Path to the YAML (or JSON) document.
    pub spec_path: PathBuf,
}

/// Tool selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Name of the active profile.
    pub profile: String,

    /// Identifier prefixes a tool must start with; empty exposes every tool.
    pub prefixes: Vec<String>,
}

/// Mailjet API region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRegion {
    #[default]
    Default,
    Us,
}

impl ApiRegion {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Default => "https://api.mailjet.com",
            Self::Us => "https://api.us.mailjet.com",
        }
    }
}

impl FromStr for ApiRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" | "eu" => Ok(Self::Default),
            "us" => Ok(Self::Us),
            other => Err(Error::config(format!(
                "Unknown MAILJET_API_REGION '{other}' (expected 'us' or 'default')"
            ))),
        }
    }
}

/// Configuration for the upstream Mailjet API.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailjetConfig {
    /// `public:private` key pair, or an already-encoded Basic token.
    pub api_key: Option<String>,

    pub region: ApiRegion,

    /// Full base URL, overriding the region.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Maximum number of requests in flight.
    pub max_concurrent_requests: usize,
}

impl MailjetConfig {
    /// Effective base URL.
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.region.base_url().to_string())
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for MailjetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailjetConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

impl Default for MailjetConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: ApiRegion::Default,
            base_url: None,
            timeout_secs: 30,
            max_concurrent_requests: 16,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let profile = ToolProfile::default();
        Self {
            server: ServerConfig {
                name: profile.name.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: profile.description.to_string(),
            },
            logging: LoggingConfig::default(),
            openapi: OpenApiConfig {
                spec_path: PathBuf::from("mailjet-openapi.yaml"),
            },
            tools: ToolsConfig {
                profile: profile.name.to_string(),
                prefixes: Vec::new(),
            },
            mailjet: MailjetConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix, upstream settings the
    /// `MAILJET_` prefix.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        config.logging = LoggingConfig::from_env();

        if let Ok(path) = std::env::var("MCP_OPENAPI_SPEC") {
            config.openapi.spec_path = PathBuf::from(path);
        }

        // Profile first: it provides the default server name and prefixes.
        if let Ok(key) = std::env::var("MCP_PROFILE") {
            let profile = ToolProfile::find(&key)
                .ok_or_else(|| Error::config(format!("Unknown MCP_PROFILE '{key}'")))?;
            config.apply_profile(profile);
        }

        if let Ok(raw) = std::env::var("MCP_TOOL_PREFIXES") {
            config.tools.prefixes = parse_prefixes(&raw);
            info!("Tool prefixes overridden: {:?}", config.tools.prefixes);
        }

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.transport = TransportConfig::from_env()?;

        match std::env::var("MAILJET_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                config.mailjet.api_key = Some(key);
                info!("Mailjet API key loaded from environment");
            }
            _ => warn!("MAILJET_API_KEY not set - every tool call will fail until it is configured"),
        }

        if let Ok(region) = std::env::var("MAILJET_API_REGION") {
            config.mailjet.region = region.parse()?;
        }

        if let Ok(base_url) = std::env::var("MAILJET_API_BASE_URL") {
            config.mailjet.base_url = Some(base_url);
        }

        if let Some(secs) = parse_var::<u64>("MAILJET_REQUEST_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(Error::config("MAILJET_REQUEST_TIMEOUT_SECS must be at least 1"));
            }
            config.mailjet.timeout_secs = secs;
        }

        if let Some(limit) = parse_var::<usize>("MAILJET_MAX_CONCURRENT_REQUESTS")? {
            if limit == 0 {
                return Err(Error::config("MAILJET_MAX_CONCURRENT_REQUESTS must be at least 1"));
            }
            config.mailjet.max_concurrent_requests = limit;
        }

        Ok(config)
    }

    /// Switch to `profile`, taking its name, description and prefixes.
    pub fn apply_profile(&mut self, profile: &ToolProfile) {
        self.server.name = profile.name.to_string();
        self.server.description = profile.description.to_string();
        self.tools.profile = profile.name.to_string();
        self.tools.prefixes = profile.prefixes.iter().map(|p| p.to_string()).collect();
    }
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

// Mutex to ensure env var tests run serially, shared with the transport tests
#[cfg(test)]
pub(crate) static ENV_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
