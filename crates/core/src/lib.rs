//! Domain logic for the backoffice credential and session lifecycle.
//!
//! Nothing in this crate performs I/O. The persistence contract lives in
//! `backoffice-db`, the services and HTTP surface in `backoffice-api`.

pub mod claims;
pub mod error;
pub mod hashing;
pub mod login_audit;
pub mod refresh_token;
pub mod role_tree;
pub mod roles;
pub mod types;
