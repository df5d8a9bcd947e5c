//! Token extraction from request parts
//!
//! Three places can carry a token:
//! 1. `Authorization: Bearer <token>`
//! 2. `?token=<token>` on routes that allow it (image tags, downloads)
//! 3. `Sec-WebSocket-Protocol: Bearer, <token>` on socket upgrades
//!
//! Extraction only finds the token. Validation happens in the guards.

use axum::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use axum::http::request::Parts;
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiError;

/// Maximum token size (8KB) - prevents memory exhaustion attacks
pub const MAX_TOKEN_SIZE: usize = 8 * 1024;

/// Where a guard looks for the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Strict `Authorization: Bearer` header
    Header,
    /// Header first, then the `token` query parameter
    HeaderOrQuery,
    /// `Sec-WebSocket-Protocol: Bearer, <token>`
    SocketProtocol,
}

/// Why no usable token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("missing authorization token")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
    #[error("authorization token too large")]
    TooLarge,
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::unauthorized(e.to_string())
    }
}

/// Query parameters that may contain a token
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extract a token from the given source
pub fn extract_token(parts: &Parts, source: TokenSource) -> Result<String, ExtractError> {
    match source {
        TokenSource::Header => bearer_from_header(parts),
        TokenSource::HeaderOrQuery => match bearer_from_header(parts) {
            Ok(token) => Ok(token),
            Err(ExtractError::TooLarge) => Err(ExtractError::TooLarge),
            Err(_) => token_from_query(parts),
        },
        TokenSource::SocketProtocol => token_from_socket_protocol(parts),
    }
}

/// Split a header value into exactly `Bearer` and a non-empty token
///
/// ```
/// use wastedesk_api::auth::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
/// assert!(parse_bearer("Bearer ").is_err());
/// assert!(parse_bearer("Basic abcdef").is_err());
/// ```
pub fn parse_bearer(value: &str) -> Result<&str, ExtractError> {
    let mut parts = value.trim().split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(ExtractError::Malformed),
    }
}

fn bearer_from_header(parts: &Parts) -> Result<String, ExtractError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(ExtractError::Missing)?;

    // "Bearer " = 7 chars
    if header.len() > MAX_TOKEN_SIZE + 7 {
        return Err(ExtractError::TooLarge);
    }

    let value = header.to_str().map_err(|_| ExtractError::Malformed)?;
    parse_bearer(value).map(str::to_string)
}

fn token_from_query(parts: &Parts) -> Result<String, ExtractError> {
    let query = parts.uri.query().ok_or(ExtractError::Missing)?;

    // Limit query string parsing
    if query.len() > MAX_TOKEN_SIZE * 2 {
        return Err(ExtractError::TooLarge);
    }

    let params: TokenQuery =
        serde_urlencoded::from_str(query).map_err(|_| ExtractError::Malformed)?;
    match params.token {
        Some(token) if token.len() > MAX_TOKEN_SIZE => Err(ExtractError::TooLarge),
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ExtractError::Missing),
    }
}

fn token_from_socket_protocol(parts: &Parts) -> Result<String, ExtractError> {
    let header = parts
        .headers
        .get(SEC_WEBSOCKET_PROTOCOL)
        .ok_or(ExtractError::Missing)?;

    if header.len() > MAX_TOKEN_SIZE + 8 {
        return Err(ExtractError::TooLarge);
    }

    let value = header.to_str().map_err(|_| ExtractError::Malformed)?;
    let mut protocols = value.split(',').map(str::trim);
    match (protocols.next(), protocols.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ExtractError::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Ok("abc"));
        assert_eq!(parse_bearer("  Bearer abc  "), Ok("abc"));
        assert_eq!(parse_bearer("Bearer "), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer("Bearer"), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer("Basic abcdef"), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer("bearer abc"), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer("Bearer a b"), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer("Bearer  abc"), Err(ExtractError::Malformed));
        assert_eq!(parse_bearer(""), Err(ExtractError::Malformed));
    }

    #[test]
    fn test_header_source() {
        let p = parts(Request::builder().header(AUTHORIZATION, "Bearer tok"));
        assert_eq!(extract_token(&p, TokenSource::Header).unwrap(), "tok");

        let p = parts(Request::builder().uri("/x?token=tok"));
        assert_eq!(
            extract_token(&p, TokenSource::Header),
            Err(ExtractError::Missing)
        );
    }

    #[test]
    fn test_query_fallback() {
        let p = parts(Request::builder().uri("/avatar?token=from-query"));
        assert_eq!(
            extract_token(&p, TokenSource::HeaderOrQuery).unwrap(),
            "from-query"
        );

        // Malformed header still falls back
        let p = parts(
            Request::builder()
                .uri("/avatar?token=from-query")
                .header(AUTHORIZATION, "Basic xyz"),
        );
        assert_eq!(
            extract_token(&p, TokenSource::HeaderOrQuery).unwrap(),
            "from-query"
        );

        // Header wins when valid
        let p = parts(
            Request::builder()
                .uri("/avatar?token=from-query")
                .header(AUTHORIZATION, "Bearer from-header"),
        );
        assert_eq!(
            extract_token(&p, TokenSource::HeaderOrQuery).unwrap(),
            "from-header"
        );

        let p = parts(Request::builder().uri("/avatar?token="));
        assert_eq!(
            extract_token(&p, TokenSource::HeaderOrQuery),
            Err(ExtractError::Missing)
        );
    }

    #[test]
    fn test_socket_protocol() {
        let p = parts(Request::builder().header(SEC_WEBSOCKET_PROTOCOL, "Bearer, tok"));
        assert_eq!(
            extract_token(&p, TokenSource::SocketProtocol).unwrap(),
            "tok"
        );

        let p = parts(Request::builder().header(SEC_WEBSOCKET_PROTOCOL, "Bearer,  tok , extra"));
        assert_eq!(
            extract_token(&p, TokenSource::SocketProtocol).unwrap(),
            "tok"
        );

        let p = parts(Request::builder().header(SEC_WEBSOCKET_PROTOCOL, "Bearer"));
        assert_eq!(
            extract_token(&p, TokenSource::SocketProtocol),
            Err(ExtractError::Malformed)
        );

        let p = parts(Request::builder().header(SEC_WEBSOCKET_PROTOCOL, "chat, tok"));
        assert_eq!(
            extract_token(&p, TokenSource::SocketProtocol),
            Err(ExtractError::Malformed)
        );
    }

    #[test]
    fn test_oversized_token() {
        let huge = format!("Bearer {}", "a".repeat(MAX_TOKEN_SIZE + 1));
        let p = parts(Request::builder().header(AUTHORIZATION, huge));
        assert_eq!(
            extract_token(&p, TokenSource::HeaderOrQuery),
            Err(ExtractError::TooLarge)
        );
    }
}
