//! Authentication, authorization, and request-origin extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated account from an access token.
//! - [`rbac::RequireAdmin`] -- Requires the `Admin` role.
//! - [`client::ClientInfo`] -- Caller IP address and user agent.

pub mod auth;
pub mod client;
pub mod rbac;
