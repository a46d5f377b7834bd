//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and a create DTO for inserts.

pub mod account;
pub mod login_audit;
pub mod refresh_token;
pub mod role;
