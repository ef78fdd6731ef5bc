/// Ledger database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database
///
/// Credential fields live in the auth layer fronting this service; the
/// ledger stores identity only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Wisper (anonymous short post) record
///
/// `upvotes` and `downvotes` are derived values: they always equal the
/// count of active votes of that type referencing this wisper.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wisper {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

/// Vote type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

/// Vote record: a typed association between a user and a wisper
///
/// At most one active vote exists per (user_id, wisper_id) pair. Votes are
/// never updated in place: retraction deletes the row, re-voting inserts a
/// fresh one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub wisper_id: i64,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// Comment record, append-only, ordered by creation time
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub wisper_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Notification kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
        }
    }
}

/// Notification record: a durable interaction event for a recipient
///
/// `content` holds a plain pre-truncated snippet of the wisper body captured
/// at emission time. `wisper_id` is nulled when the wisper is deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub content: String,
    pub wisper_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_type_round_trip() {
        assert_eq!(VoteType::Upvote.as_str(), "upvote");
        assert_eq!(VoteType::Downvote.as_str(), "downvote");

        let parsed: VoteType = serde_json::from_str("\"upvote\"").unwrap();
        assert_eq!(parsed, VoteType::Upvote);
    }

    #[test]
    fn test_notification_wire_shape() {
        let notification = Notification {
            id: 7,
            user_id: 2,
            kind: NotificationKind::Comment,
            content: "Someone commented on your wisper: \"hello\"...".to_string(),
            wisper_id: Some(3),
            read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains("\"userId\":2"));
        assert!(json.contains("\"kind\":\"comment\""));
        assert!(json.contains("\"wisperId\":3"));
        assert!(json.contains("\"read\":false"));
    }

    #[test]
    fn test_wisper_wire_shape() {
        let wisper = Wisper {
            id: 1,
            user_id: 4,
            content: "hello".to_string(),
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&wisper).unwrap();
        assert!(json.contains("\"userId\":4"));
        assert!(json.contains("\"upvotes\":0"));
        assert!(json.contains("\"createdAt\""));
    }
}
