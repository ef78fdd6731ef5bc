/// Ledger store: durable record of users, wispers, and comments
///
/// Votes and notifications have their own modules (`votes`, `notify`); this
/// store owns the content rows they reference. Deleting a wisper cascades
/// to its votes and comments through the schema's foreign keys.
use crate::{
    db::models::{Comment, User, Wisper},
    error::{WisperError, WisperResult},
};
use chrono::Utc;
use sqlx::SqlitePool;

/// Ledger store service
#[derive(Clone)]
pub struct LedgerStore {
    db: SqlitePool,
}

impl LedgerStore {
    /// Create a new ledger store
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new user with a unique handle
    pub async fn create_user(&self, username: &str) -> WisperResult<User> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await
            .map_err(WisperError::Database)?;

        if exists > 0 {
            return Err(WisperError::Conflict(format!(
                "Username {} already taken",
                username
            )));
        }

        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(username)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(User {
            id,
            username: username.to_string(),
            created_at: now,
        })
    }

    /// Get a user by id
    pub async fn get_user(&self, id: i64) -> WisperResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(WisperError::Database)?;

        Ok(user)
    }

    /// Create a new wisper; counters start at zero
    pub async fn create_wisper(&self, user_id: i64, content: &str) -> WisperResult<Wisper> {
        self.ensure_user(user_id).await?;

        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO wispers (user_id, content, created_at) VALUES (?1, ?2, ?3) RETURNING id",
        )
        .bind(user_id)
        .bind(content)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(Wisper {
            id,
            user_id,
            content: content.to_string(),
            upvotes: 0,
            downvotes: 0,
            created_at: now,
        })
    }

    /// Get a wisper by id
    pub async fn get_wisper(&self, id: i64) -> WisperResult<Option<Wisper>> {
        let wisper = sqlx::query_as::<_, Wisper>("SELECT * FROM wispers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(WisperError::Database)?;

        Ok(wisper)
    }

    /// Get the public feed, newest first
    pub async fn get_wispers(&self) -> WisperResult<Vec<Wisper>> {
        let wispers =
            sqlx::query_as::<_, Wisper>("SELECT * FROM wispers ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.db)
                .await
                .map_err(WisperError::Database)?;

        Ok(wispers)
    }

    /// Get all wispers authored by a user, newest first
    pub async fn get_user_wispers(&self, user_id: i64) -> WisperResult<Vec<Wisper>> {
        let wispers = sqlx::query_as::<_, Wisper>(
            "SELECT * FROM wispers WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(wispers)
    }

    /// Delete a wisper; author only
    ///
    /// The schema cascades the delete to all votes and comments referencing
    /// the wisper and nulls the reference on notifications.
    pub async fn delete_wisper(&self, wisper_id: i64, user_id: i64) -> WisperResult<()> {
        let result = sqlx::query("DELETE FROM wispers WHERE id = ?1 AND user_id = ?2")
            .bind(wisper_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(WisperError::Database)?;

        if result.rows_affected() == 0 {
            return Err(WisperError::NotFound(format!(
                "Wisper {} not found",
                wisper_id
            )));
        }

        Ok(())
    }

    /// Append a comment to a wisper
    pub async fn create_comment(
        &self,
        wisper_id: i64,
        user_id: i64,
        content: &str,
    ) -> WisperResult<Comment> {
        let mut tx = self.db.begin().await.map_err(WisperError::Database)?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wispers WHERE id = ?1")
            .bind(wisper_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(WisperError::Database)?;

        if exists == 0 {
            return Err(WisperError::NotFound(format!(
                "Wisper {} not found",
                wisper_id
            )));
        }

        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (wisper_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(wisper_id)
        .bind(user_id)
        .bind(content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(WisperError::Database)?;

        tx.commit().await.map_err(WisperError::Database)?;

        Ok(Comment {
            id,
            wisper_id,
            user_id,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Get the comment thread for a wisper, oldest first
    pub async fn get_comments(&self, wisper_id: i64) -> WisperResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE wisper_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(wisper_id)
        .fetch_all(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(comments)
    }

    async fn ensure_user(&self, user_id: i64) -> WisperResult<()> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .map_err(WisperError::Database)?;

        if exists == 0 {
            return Err(WisperError::NotFound(format!("User {} not found", user_id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> LedgerStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        LedgerStore::new(pool)
    }

    #[tokio::test]
    async fn test_create_user_and_wisper() {
        let store = create_test_store().await;

        let user = store.create_user("ghost").await.unwrap();
        let wisper = store.create_wisper(user.id, "first wisper").await.unwrap();

        assert_eq!(wisper.user_id, user.id);
        assert_eq!(wisper.upvotes, 0);
        assert_eq!(wisper.downvotes, 0);

        let fetched = store.get_wisper(wisper.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "first wisper");
    }

    #[tokio::test]
    async fn test_duplicate_username_conflict() {
        let store = create_test_store().await;

        store.create_user("ghost").await.unwrap();
        let result = store.create_user("ghost").await;
        assert!(matches!(result, Err(WisperError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_wisper_unknown_user() {
        let store = create_test_store().await;

        let result = store.create_wisper(999, "orphan").await;
        assert!(matches!(result, Err(WisperError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let store = create_test_store().await;
        let user = store.create_user("ghost").await.unwrap();

        let first = store.create_wisper(user.id, "one").await.unwrap();
        let second = store.create_wisper(user.id, "two").await.unwrap();

        let feed = store.get_wispers().await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, second.id);
        assert_eq!(feed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_comments_are_oldest_first() {
        let store = create_test_store().await;
        let author = store.create_user("author").await.unwrap();
        let reader = store.create_user("reader").await.unwrap();
        let wisper = store.create_wisper(author.id, "thread").await.unwrap();

        store
            .create_comment(wisper.id, reader.id, "first")
            .await
            .unwrap();
        store
            .create_comment(wisper.id, author.id, "second")
            .await
            .unwrap();

        let thread = store.get_comments(wisper.id).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].content, "first");
        assert_eq!(thread[1].content, "second");
    }

    #[tokio::test]
    async fn test_comment_on_missing_wisper() {
        let store = create_test_store().await;
        let user = store.create_user("ghost").await.unwrap();

        let result = store.create_comment(42, user.id, "hello?").await;
        assert!(matches!(result, Err(WisperError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_wisper_cascades() {
        let store = create_test_store().await;
        let author = store.create_user("author").await.unwrap();
        let voter = store.create_user("voter").await.unwrap();
        let wisper = store.create_wisper(author.id, "doomed").await.unwrap();

        store
            .create_comment(wisper.id, voter.id, "nice")
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO votes (user_id, wisper_id, vote_type, created_at)
             VALUES (?1, ?2, 'upvote', ?3)",
        )
        .bind(voter.id)
        .bind(wisper.id)
        .bind(Utc::now())
        .execute(&store.db)
        .await
        .unwrap();

        store.delete_wisper(wisper.id, author.id).await.unwrap();

        assert!(store.get_wisper(wisper.id).await.unwrap().is_none());
        let votes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE wisper_id = ?1")
            .bind(wisper.id)
            .fetch_one(&store.db)
            .await
            .unwrap();
        let comments =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE wisper_id = ?1")
                .bind(wisper.id)
                .fetch_one(&store.db)
                .await
                .unwrap();
        assert_eq!(votes, 0);
        assert_eq!(comments, 0);
    }

    #[tokio::test]
    async fn test_delete_wisper_author_only() {
        let store = create_test_store().await;
        let author = store.create_user("author").await.unwrap();
        let stranger = store.create_user("stranger").await.unwrap();
        let wisper = store.create_wisper(author.id, "mine").await.unwrap();

        let result = store.delete_wisper(wisper.id, stranger.id).await;
        assert!(matches!(result, Err(WisperError::NotFound(_))));
        assert!(store.get_wisper(wisper.id).await.unwrap().is_some());
    }
}
