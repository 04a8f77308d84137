//! Role-gated view guard.
//!
//! # Data Flow
//! ```text
//! AuthState { authenticated, role, loading } + current Location
//!     → decision.rs (RouteGuard::decide)
//!     → RouteDecision: Pending | Render | RedirectToLogin | RedirectTo
//!     → navigator.rs (replace-style navigation, if any)
//! ```
//!
//! # Design Decisions
//! - Guard is stateless; it re-runs whenever auth state or location change
//! - Redirects always replace the current history entry
//! - Role-home table comes from configuration and is loop-checked at startup

pub mod decision;
pub mod navigator;
pub mod role;

pub use decision::{AuthState, Location, ProtectedRoute, RoleHomes, RouteDecision, RouteGuard};
pub use navigator::{GuardOutcome, Navigation, Navigator};
pub use role::Role;
