/// Tests for the interaction protocol surface
///
/// Note: These are unit tests that verify the wire-level conventions are
/// correct. Component tests against a live database live next to each
/// module; full end-to-end tests would require a running server.

#[cfg(test)]
mod tests {
    use serde_json::json;

    // The auth layer forwards the caller's id in the X-Actor-Id header
    #[test]
    fn test_actor_header_parsing() {
        let header_value = "42";
        let actor: Option<i64> = header_value.trim().parse().ok();
        assert_eq!(actor, Some(42));

        let invalid = "forty-two";
        let actor: Option<i64> = invalid.trim().parse().ok();
        assert_eq!(actor, None);

        let padded = " 7 ";
        let actor: Option<i64> = padded.trim().parse().ok();
        assert_eq!(actor, Some(7));
    }

    #[test]
    fn test_notification_payload_shape() {
        // The push channel delivers the notification record as-is; clients
        // rely on these exact field names
        let payload = json!({
            "id": 12,
            "userId": 3,
            "kind": "comment",
            "content": "Someone commented on your wisper: \"hello\"...",
            "wisperId": 9,
            "read": false,
            "createdAt": "2025-06-01T12:00:00Z"
        });

        assert_eq!(payload["userId"], 3);
        assert_eq!(payload["kind"], "comment");
        assert_eq!(payload["read"], false);
        assert!(payload.get("wisperId").is_some());
    }

    #[test]
    fn test_snippet_truncation_is_char_safe() {
        // Notification messages quote the first 50 characters of the body;
        // truncation must never split a multi-byte character
        let body = "é".repeat(80);
        let snippet: String = body.chars().take(50).collect();

        assert_eq!(snippet.chars().count(), 50);
        assert!(snippet.is_char_boundary(snippet.len()));
    }

    #[test]
    fn test_vote_type_wire_values() {
        let upvote = json!("upvote");
        let downvote = json!("downvote");

        assert_eq!(upvote.as_str(), Some("upvote"));
        assert_eq!(downvote.as_str(), Some("downvote"));
    }

    #[test]
    fn test_ws_connect_query_parsing() {
        // The push channel endpoint takes the user id as a query parameter
        let query = "userId=17";
        let user_id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("userId="))
            .and_then(|v| v.parse::<i64>().ok());

        assert_eq!(user_id, Some(17));
    }
}
