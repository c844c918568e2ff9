//! CLI configuration.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tavola_commerce::checkout::{CommandType, PaymentMethod};

/// Config file names, searched from the working directory upward.
pub const CONFIG_NAMES: [&str; 3] = ["tavola.toml", ".tavola.toml", "tavola.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the cart is kept between invocations.
    #[serde(default)]
    pub session: SessionConfig,

    /// Defaults for `tavola checkout`.
    #[serde(default)]
    pub checkout: CheckoutConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Get environment-specific config.
    pub fn for_environment(&self, env: &str) -> Result<CliConfig> {
        let env_config = self
            .environments
            .get(env)
            .with_context(|| format!("Unknown environment: {}", env))?;

        let mut config = self.clone();
        if let Some(ref api) = env_config.api {
            config.api = api.clone();
        }
        Ok(config)
    }
}

/// Backend API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on any single call, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

/// Cart session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session cache (default: ~/.local/share/tavola/session).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default = "default_session_id")]
    pub id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: None,
            id: default_session_id(),
        }
    }
}

/// Checkout defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub default_type: CommandType,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

/// Generate a default tavola.toml config file.
pub fn generate_default_config() -> String {
    r#"# Tavola client configuration

[api]
base_url = "http://localhost:3000"
# timeout_ms = 5000

[session]
# dir = ".tavola/session"
id = "default"

[checkout]
default_type = "on_site"
payment_method = "cash"

[environments.staging.api]
base_url = "https://staging.api.tavola.app"

[environments.production.api]
base_url = "https://api.tavola.app"
timeout_ms = 8000
"#
    .to_string()
}
