//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::guard::{ProtectedRoute, Role};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment; `development` exposes error detail.
    pub environment: Environment,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security headers and body admission.
    pub security: SecurityConfig,

    /// Downstream chat service.
    pub chat: ChatConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Client route guard tables.
    pub guard: GuardConfig,
}

/// Deployment environment label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Development,
    Other(String),
    #[default]
    Unset,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl From<String> for Environment {
    fn from(label: String) -> Self {
        match label.trim() {
            "" => Environment::Unset,
            "development" => Environment::Development,
            other => Environment::Other(other.to_string()),
        }
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => "development".to_string(),
            Environment::Other(label) => label,
            Environment::Unset => String::new(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Other(label) => f.write_str(label),
            Environment::Unset => f.write_str("unset"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Explicit origin allow-list (no wildcards).
    pub allowed_origins: Vec<String>,

    /// Methods advertised on preflight.
    pub allowed_methods: Vec<String>,

    /// Request headers advertised on preflight.
    pub allowed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Optional preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: ["Content-Type", "Authorization", "X-Cleanup-Secret"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_credentials: true,
            max_age_secs: None,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Fixed window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per client IP per window.
    pub max_requests: u32,

    /// Path prefix the limiter applies to.
    pub path_prefix: String,

    /// Identify clients by X-Forwarded-For / X-Real-IP instead of the peer address.
    pub trust_forwarded_for: bool,

    /// How often expired windows are swept from memory, in seconds.
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_requests: 30,
            path_prefix: "/api".to_string(),
            trust_forwarded_for: false,
            sweep_interval_secs: 60,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Downstream chat service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the chat service (e.g., "http://127.0.0.1:4000").
    pub upstream_url: Option<String>,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            upstream_url: None,
            timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Client route guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Login page unauthenticated users are sent to.
    pub login_path: String,

    /// Landing page for roles without an entry in `role_homes`.
    pub default_home: String,

    /// Landing page per role.
    pub role_homes: BTreeMap<Role, String>,

    /// Protected routes, used to detect redirect loops.
    pub routes: Vec<ProtectedRoute>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        let role_homes = BTreeMap::from([
            (Role::User, "/dashboard".to_string()),
            (Role::Trainer, "/trainer".to_string()),
            (Role::Nutritionist, "/nutritionist".to_string()),
            (Role::Admin, "/admin".to_string()),
        ]);
        let routes = vec![
            ProtectedRoute::new("/dashboard", [Role::User]),
            ProtectedRoute::new("/trainer", [Role::Trainer]),
            ProtectedRoute::new("/nutritionist", [Role::Nutritionist]),
            ProtectedRoute::new("/admin", [Role::Admin]),
        ];

        Self {
            login_path: "/login".to_string(),
            default_home: "/".to_string(),
            role_homes,
            routes,
        }
    }
}
