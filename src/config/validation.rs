//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, port valid, body cap > 0)
//! - Check CORS entries parse as origins, methods and header names
//! - Detect role-home redirect loops in the guard tables
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::{ChatConfig, CorsConfig, GatewayConfig, GuardConfig, RateLimitConfig};
use crate::guard::Role;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("cors.allowed_origins entry {origin:?} is not an absolute http(s) origin")]
    InvalidOrigin { origin: String },

    #[error("cors.allowed_methods entry {method:?} is not an HTTP method")]
    InvalidMethod { method: String },

    #[error("cors.allowed_headers entry {header:?} is not a valid header name")]
    InvalidHeader { header: String },

    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,

    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("rate_limit.path_prefix {prefix:?} must start with '/'")]
    InvalidScope { prefix: String },

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("chat.upstream_url {url:?} must be an absolute http URL")]
    InvalidUpstream { url: String },

    #[error("guard path {path:?} must start with '/'")]
    RelativeGuardPath { path: String },

    #[error("guard route {path:?} allows no roles")]
    EmptyAllowedRoles { path: String },

    #[error("home {home:?} of role {role} is a route that role may not enter")]
    RoleHomeLoop { role: Role, home: String },

    #[error("guard path {path:?} is itself a protected route")]
    ProtectedFallback { path: String },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    validate_cors(&config.cors, &mut errors);
    validate_rate_limit(&config.rate_limit, &mut errors);
    validate_chat(&config.chat, &mut errors);
    validate_guard(&config.guard, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that `origin` is exactly `scheme://host[:port]`.
pub fn is_valid_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    matches!(url.scheme(), "http" | "https")
        && url.host().is_some()
        && url.origin().ascii_serialization() == origin
}

fn validate_cors(cors: &CorsConfig, errors: &mut Vec<ValidationError>) {
    for origin in &cors.allowed_origins {
        if !is_valid_origin(origin) {
            errors.push(ValidationError::InvalidOrigin { origin: origin.clone() });
        }
    }
    for method in &cors.allowed_methods {
        if method.is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod { method: method.clone() });
        }
    }
    for header in &cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader { header: header.clone() });
        }
    }
}

fn validate_rate_limit(rate_limit: &RateLimitConfig, errors: &mut Vec<ValidationError>) {
    if rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if !rate_limit.path_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidScope {
            prefix: rate_limit.path_prefix.clone(),
        });
    }
}

fn validate_chat(chat: &ChatConfig, errors: &mut Vec<ValidationError>) {
    if let Some(upstream) = &chat.upstream_url {
        // The forwarding client speaks plain HTTP only.
        let valid = Url::parse(upstream)
            .map(|url| url.scheme() == "http" && url.host().is_some())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidUpstream { url: upstream.clone() });
        }
    }
}

fn validate_guard(guard: &GuardConfig, errors: &mut Vec<ValidationError>) {
    let paths = [&guard.login_path, &guard.default_home]
        .into_iter()
        .chain(guard.role_homes.values())
        .chain(guard.routes.iter().map(|r| &r.path));
    for path in paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeGuardPath { path: path.clone() });
        }
    }

    for route in &guard.routes {
        if route.allowed_roles.is_empty() {
            errors.push(ValidationError::EmptyAllowedRoles { path: route.path.clone() });
        }
    }

    for (role, home) in &guard.role_homes {
        let blocked = guard
            .routes
            .iter()
            .any(|route| route.covers(home) && !route.admits(*role));
        if blocked {
            errors.push(ValidationError::RoleHomeLoop {
                role: *role,
                home: home.clone(),
            });
        }
    }

    for path in [&guard.login_path, &guard.default_home] {
        if guard.routes.iter().any(|route| route.covers(path)) {
            errors.push(ValidationError::ProtectedFallback { path: path.clone() });
        }
    }
}
