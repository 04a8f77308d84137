//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin negotiation, preflight short-circuit)
//!     → headers.rs (hardening response headers)
//!     → rate_limit.rs (per-IP fixed window on /api)
//!     → limits.rs (body size cap, JSON admission)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Order is fixed: preflight never pays for later stages
//! - Throttled clients are rejected before their body is read
//! - Disallowed origins are not rejected server-side

pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use limits::{BodyLimit, JsonBody};
pub use rate_limit::{FixedWindowLimiter, RateLimitStatus, RateLimiterState};
