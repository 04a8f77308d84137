//! Request matching logic.
//!
//! # Responsibilities
//! - Match request paths against a prefix on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api` matches `/api` and `/api/...`, never `/apis`
//! - No regex to guarantee O(n) matching

use axum::http::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches_path(&self, path: &str) -> bool;

    fn matches<B>(&self, req: &Request<B>) -> bool
    where
        Self: Sized,
    {
        self.matches_path(req.uri().path())
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    /// A trailing slash on the prefix is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches_path(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
