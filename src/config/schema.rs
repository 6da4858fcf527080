//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML file;
//! every field has a default so a minimal file only overrides what it needs.

use serde::{Deserialize, Serialize};

/// Root configuration for the plugin server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PluginConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Token file location.
    pub tokens: TokensConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address frps and the admin UI connect to.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7200".to_string(),
        }
    }
}

/// Token file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokensConfig {
    /// Path to the INI token file.
    pub path: String,

    /// Start with an empty store when the file does not exist yet.
    pub create_if_missing: bool,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            path: "tokens.ini".to_string(),
            create_if_missing: true,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// HTTP Basic user. Empty together with `password` disables Basic auth.
    pub user: String,

    /// HTTP Basic password.
    pub password: String,

    /// Optional Bearer token accepted in place of Basic credentials.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user: String::new(),
            password: String::new(),
            api_key: String::new(),
        }
    }
}

impl AdminConfig {
    /// True when at least one credential kind is configured.
    pub fn requires_auth(&self) -> bool {
        !self.user.is_empty() || !self.api_key.is_empty()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one HTTP request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9200".to_string(),
        }
    }
}
