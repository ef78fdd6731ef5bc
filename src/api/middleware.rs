/// Actor identity plumbing
///
/// Authentication is owned by the session layer fronting this service; it
/// resolves the caller and forwards their user id in the `X-Actor-Id`
/// header. Handlers that mutate content require it.
use crate::error::{WisperError, WisperResult};
use axum::http::HeaderMap;

/// Header carrying the authenticated actor's user id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extract the actor id from request headers, if present and well-formed
pub fn extract_actor_id(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(ACTOR_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Require an actor identity or fail with 401
pub fn require_actor(headers: &HeaderMap) -> WisperResult<i64> {
    extract_actor_id(headers).ok_or_else(|| {
        WisperError::Authentication("Missing or invalid actor identity".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_actor_id() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("42"));
        assert_eq!(extract_actor_id(&headers), Some(42));
    }

    #[test]
    fn test_extract_actor_id_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_actor_id(&headers), None);
        assert!(require_actor(&headers).is_err());
    }

    #[test]
    fn test_extract_actor_id_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("not-a-number"));
        assert_eq!(extract_actor_id(&headers), None);
    }
}
