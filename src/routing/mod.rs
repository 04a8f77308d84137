//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route table)
//!         GET /health        → health probe
//!         * /api/chat/**     → chat subtree
//!         anything else      → 404 {"error":"Not found"}
//!
//! matcher.rs scopes middleware (e.g. rate limiting) to path prefixes.
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Prefix matching respects path segment boundaries

pub mod matcher;
pub mod router;

pub use matcher::{Matcher, PathPrefixMatcher};
pub use router::routes;
