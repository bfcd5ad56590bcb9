//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- Capability extractors such as [`rbac::RequireLogCleaning`].

pub mod auth;
pub mod rbac;
