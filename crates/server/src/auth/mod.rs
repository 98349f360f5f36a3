//! Per-request credential resolution.
//!
//! The [`resolver`] middleware computes the caller's identity (or anonymous)
//! from presented credentials before any handler runs, transparently
//! re-issuing an expired access credential from a valid refresh credential.
//! The [`extract`] module provides the `RequireAuth` extractor that routes
//! use to demand an identity.

pub mod extract;
pub mod resolver;

pub use extract::{AuthError, RequireAuth};
pub use resolver::{CurrentUser, resolve_credentials};

/// Inbound header carrying the refresh credential.
pub const REFRESH_HEADER: &str = "x-refresh";
/// Outbound header carrying a silently re-issued access credential.
pub const NEW_ACCESS_HEADER: &str = "x-access-token";
