//! Caller origin for audit and revocation records.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use crate::auth::login::ClientContext;
use crate::state::AppState;

/// Recorded when no address can be determined.
pub const UNKNOWN_IP: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// IP address and user agent of the caller.
///
/// The IP is the socket peer address, else [`UNKNOWN_IP`]. With
/// `trust_forwarded_for` set, the first `X-Forwarded-For` entry takes
/// precedence; otherwise that header is ignored, since any client can send it.
#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientContext);

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo(client_context(
            parts,
            state.config.trust_forwarded_for,
        )))
    }
}

/// Read the caller's address and user agent off a request.
pub fn client_context(parts: &Parts, trust_forwarded_for: bool) -> ClientContext {
    let forwarded = trust_forwarded_for
        .then(|| first_forwarded_address(parts))
        .flatten();

    let ip_address = forwarded
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| UNKNOWN_IP.to_string());

    let user_agent = parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientContext {
        ip_address,
        user_agent,
    }
}

fn first_forwarded_address(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    fn from_peer(forwarded_for: &str) -> Request<()> {
        let mut request = Request::builder()
            .header(X_FORWARDED_FOR, forwarded_for)
            .header(USER_AGENT, "curl/8")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        request
    }

    #[test]
    fn spoofed_forwarded_for_is_ignored_by_default() {
        let client = client_context(&parts(from_peer("203.0.113.7")), false);
        assert_eq!(client.ip_address, "192.0.2.1");
        assert_eq!(client.user_agent.as_deref(), Some("curl/8"));

        let bare = Request::builder()
            .header(X_FORWARDED_FOR, "203.0.113.7")
            .body(())
            .unwrap();
        assert_eq!(client_context(&parts(bare), false).ip_address, UNKNOWN_IP);
    }

    #[test]
    fn first_forwarded_address_wins_behind_a_trusted_proxy() {
        let client = client_context(&parts(from_peer("203.0.113.7, 10.0.0.1")), true);
        assert_eq!(client.ip_address, "203.0.113.7");
    }

    #[test]
    fn blank_forwarded_for_falls_back_to_peer() {
        let client = client_context(&parts(from_peer("  ,10.0.0.1")), true);
        assert_eq!(client.ip_address, "192.0.2.1");
    }

    #[test]
    fn falls_back_to_unknown_without_a_peer() {
        let bare = Request::builder().body(()).unwrap();
        assert_eq!(client_context(&parts(bare), true).ip_address, UNKNOWN_IP);
    }
}
