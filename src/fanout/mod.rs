/// Connection registry and notification fan-out
///
/// The registry is a runtime routing table from user id to their live push
/// channel; it carries no persisted lifecycle. The notifier orchestrates
/// the interaction path: suppress self-notifications, write the durable log
/// entry, then attempt a best-effort push. A missed push is not an error;
/// the record is already durable and will surface on the next pull query.
use crate::{
    db::models::{Notification, NotificationKind, Wisper},
    error::WisperResult,
    metrics,
    notify::{self, NotificationLog},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// A registered live channel for one user
struct Connection {
    id: Uuid,
    tx: mpsc::Sender<String>,
}

/// Runtime table routing a user id to their live push channel, if any
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<i64, Connection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live channel for a user, replacing any prior entry
    ///
    /// Returns the connection id the transport must present on unregister,
    /// so a stale disconnect cannot evict a successor connection.
    pub async fn register(&self, user_id: i64, tx: mpsc::Sender<String>) -> Uuid {
        let id = Uuid::new_v4();
        let mut guard = self.inner.write().await;
        guard.insert(user_id, Connection { id, tx });
        id
    }

    /// Remove a user's channel; no-op when absent or already superseded
    pub async fn unregister(&self, user_id: i64, connection_id: Uuid) {
        let mut guard = self.inner.write().await;
        if let Some(conn) = guard.get(&user_id) {
            if conn.id == connection_id {
                guard.remove(&user_id);
            }
        }
    }

    /// Push a serialized notification to a user's live channel
    ///
    /// Non-blocking best effort: a missing entry, a closed channel, or a
    /// full buffer all yield `false`. Never an error, never a retry.
    pub async fn push(&self, user_id: i64, notification: &Notification) -> bool {
        let payload = match serde_json::to_string(notification) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize notification {}: {}", notification.id, e);
                return false;
            }
        };

        let guard = self.inner.read().await;
        match guard.get(&user_id) {
            Some(conn) => conn.tx.try_send(payload).is_ok(),
            None => false,
        }
    }

    /// Number of registered channels
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Interaction notifier: durable emit, then best-effort fan-out
#[derive(Clone)]
pub struct Notifier {
    log: NotificationLog,
    registry: ConnectionRegistry,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(log: NotificationLog, registry: ConnectionRegistry) -> Self {
        Self { log, registry }
    }

    /// Notify a wisper's author that someone liked it
    pub async fn notify_like(
        &self,
        wisper: &Wisper,
        actor_id: i64,
    ) -> WisperResult<Option<Notification>> {
        self.notify(
            wisper,
            actor_id,
            NotificationKind::Like,
            notify::like_message(&wisper.content),
        )
        .await
    }

    /// Notify a wisper's author that someone commented on it
    pub async fn notify_comment(
        &self,
        wisper: &Wisper,
        actor_id: i64,
    ) -> WisperResult<Option<Notification>> {
        self.notify(
            wisper,
            actor_id,
            NotificationKind::Comment,
            notify::comment_message(&wisper.content),
        )
        .await
    }

    async fn notify(
        &self,
        wisper: &Wisper,
        actor_id: i64,
        kind: NotificationKind,
        message: String,
    ) -> WisperResult<Option<Notification>> {
        // Self-notifications are never created
        if wisper.user_id == actor_id {
            return Ok(None);
        }

        // Durable write strictly before any push attempt
        let notification = self
            .log
            .emit(wisper.user_id, kind, &message, Some(wisper.id))
            .await?;
        metrics::NOTIFICATIONS_EMITTED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        let delivered = self.registry.push(wisper.user_id, &notification).await;
        if delivered {
            metrics::PUSH_DELIVERED_TOTAL.inc();
        } else {
            metrics::PUSH_MISSED_TOTAL.inc();
            tracing::debug!(
                "No live channel for user {}, notification {} kept for pull",
                wisper.user_id,
                notification.id
            );
        }

        Ok(Some(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerStore;
    use chrono::Utc;

    fn test_notification(id: i64, user_id: i64) -> Notification {
        Notification {
            id,
            user_id,
            kind: NotificationKind::Like,
            content: "Someone liked your wisper: \"hi...\"".to_string(),
            wisper_id: Some(1),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_push_to_connected_user() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(7, tx).await;

        let delivered = registry.push(7, &test_notification(1, 7)).await;
        assert!(delivered);

        let payload = rx.recv().await.unwrap();
        assert!(payload.contains("\"userId\":7"));
        assert!(payload.contains("\"kind\":\"like\""));
    }

    #[tokio::test]
    async fn test_push_to_disconnected_user() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.push(7, &test_notification(1, 7)).await);
    }

    #[tokio::test]
    async fn test_push_to_full_channel_is_a_miss() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register(7, tx).await;

        assert!(registry.push(7, &test_notification(1, 7)).await);
        // Buffer full now; push must not block, just report a miss
        assert!(!registry.push(7, &test_notification(2, 7)).await);
    }

    #[tokio::test]
    async fn test_new_connection_replaces_prior() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = mpsc::channel(8);
        let (new_tx, mut new_rx) = mpsc::channel(8);

        let old_id = registry.register(7, old_tx).await;
        registry.register(7, new_tx).await;

        assert!(registry.push(7, &test_notification(1, 7)).await);
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());

        // The stale connection's disconnect must not evict the successor
        registry.unregister(7, old_id).await;
        assert_eq!(registry.connection_count().await, 1);
        assert!(registry.push(7, &test_notification(2, 7)).await);
    }

    #[tokio::test]
    async fn test_unregister_is_safe_when_absent() {
        let registry = ConnectionRegistry::new();
        registry.unregister(7, Uuid::new_v4()).await;
        assert_eq!(registry.connection_count().await, 0);
    }

    async fn create_test_notifier() -> (Notifier, ConnectionRegistry, LedgerStore, NotificationLog)
    {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let registry = ConnectionRegistry::new();
        let log = NotificationLog::new(pool.clone());
        let notifier = Notifier::new(log.clone(), registry.clone());
        (notifier, registry, LedgerStore::new(pool), log)
    }

    #[tokio::test]
    async fn test_self_notification_is_suppressed() {
        let (notifier, _registry, store, log) = create_test_notifier().await;
        let author = store.create_user("author").await.unwrap();
        let wisper = store.create_wisper(author.id, "mine").await.unwrap();

        let result = notifier.notify_comment(&wisper, author.id).await.unwrap();
        assert!(result.is_none());
        assert!(log.list(author.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_notifies_author() {
        let (notifier, _registry, store, log) = create_test_notifier().await;
        let author = store.create_user("author").await.unwrap();
        let commenter = store.create_user("commenter").await.unwrap();
        let wisper = store.create_wisper(author.id, "talk to me").await.unwrap();

        let notification = notifier
            .notify_comment(&wisper, commenter.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(notification.user_id, author.id);
        assert_eq!(notification.kind, NotificationKind::Comment);
        assert_eq!(notification.wisper_id, Some(wisper.id));

        let listed = log.list(author.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_missed_push_still_durable() {
        let (notifier, registry, store, log) = create_test_notifier().await;
        let author = store.create_user("author").await.unwrap();
        let commenter = store.create_user("commenter").await.unwrap();
        let wisper = store.create_wisper(author.id, "hello").await.unwrap();

        // Author connected: first notification is pushed live
        let (tx, mut rx) = mpsc::channel(8);
        let connection_id = registry.register(author.id, tx).await;
        notifier.notify_comment(&wisper, commenter.id).await.unwrap();
        assert!(rx.try_recv().is_ok());

        // Author disconnects: second notification misses the push but is
        // still in the log alongside the first
        registry.unregister(author.id, connection_id).await;
        notifier.notify_comment(&wisper, commenter.id).await.unwrap();

        let listed = log.list(author.id).await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
