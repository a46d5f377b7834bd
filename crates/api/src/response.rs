//! The `{ "data": ... }` envelope for list and report endpoints.
//!
//! The login and refresh payloads are returned without it because clients
//! read `accessToken` and `refreshToken` at the top level.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
