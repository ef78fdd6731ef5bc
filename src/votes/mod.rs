/// Vote engine: at-most-one-active-vote bookkeeping
///
/// Counters on wispers are derived, never incremented independently: every
/// mutation recomputes them from the votes table inside the same
/// transaction, so the displayed count cannot drift from the ledger under
/// concurrent cast/retract races. The UNIQUE index on (user_id, wisper_id)
/// is the atomic insert-if-absent backstop.
use crate::{
    db::models::{Vote, VoteType, Wisper},
    error::{WisperError, WisperResult},
    metrics,
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Result of a cast operation
///
/// `created` is false when the caller had already voted and the cast was a
/// no-op; the fan-out path uses it to avoid re-notifying on repeats.
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub wisper: Wisper,
    pub created: bool,
}

/// Vote engine service
#[derive(Clone)]
pub struct VoteEngine {
    db: SqlitePool,
}

impl VoteEngine {
    /// Create a new vote engine
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Cast a vote on a wisper
    ///
    /// Idempotent per (user, wisper): an existing active vote makes this a
    /// no-op that returns the current wisper unchanged; the existing vote's
    /// type is never overwritten.
    pub async fn cast_vote(
        &self,
        wisper_id: i64,
        user_id: i64,
        vote_type: VoteType,
    ) -> WisperResult<CastOutcome> {
        let mut tx = self.db.begin().await.map_err(WisperError::Database)?;

        Self::ensure_wisper(&mut tx, wisper_id).await?;

        let inserted = sqlx::query(
            "INSERT INTO votes (user_id, wisper_id, vote_type, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, wisper_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(wisper_id)
        .bind(vote_type)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(WisperError::Database)?
        .rows_affected()
            > 0;

        if inserted {
            Self::recount(&mut tx, wisper_id).await?;
        }

        let wisper = Self::fetch_wisper(&mut tx, wisper_id).await?;
        tx.commit().await.map_err(WisperError::Database)?;

        if inserted {
            metrics::VOTES_CAST_TOTAL
                .with_label_values(&[vote_type.as_str()])
                .inc();
        }

        Ok(CastOutcome {
            wisper,
            created: inserted,
        })
    }

    /// Retract the caller's vote on a wisper
    ///
    /// Retracting when no vote exists is a no-op; counters are recomputed
    /// either way.
    pub async fn retract_vote(&self, wisper_id: i64, user_id: i64) -> WisperResult<Wisper> {
        let mut tx = self.db.begin().await.map_err(WisperError::Database)?;

        Self::ensure_wisper(&mut tx, wisper_id).await?;

        let removed = sqlx::query("DELETE FROM votes WHERE user_id = ?1 AND wisper_id = ?2")
            .bind(user_id)
            .bind(wisper_id)
            .execute(&mut *tx)
            .await
            .map_err(WisperError::Database)?
            .rows_affected()
            > 0;

        Self::recount(&mut tx, wisper_id).await?;

        let wisper = Self::fetch_wisper(&mut tx, wisper_id).await?;
        tx.commit().await.map_err(WisperError::Database)?;

        if removed {
            metrics::VOTES_RETRACTED_TOTAL.inc();
        }

        Ok(wisper)
    }

    /// All active votes by a user, newest first
    pub async fn active_votes(&self, user_id: i64) -> WisperResult<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(
            "SELECT * FROM votes WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(votes)
    }

    /// Ids of all wispers the user currently has an active vote on
    pub async fn list_voted_wisper_ids(&self, user_id: i64) -> WisperResult<Vec<i64>> {
        let votes = self.active_votes(user_id).await?;
        Ok(votes.into_iter().map(|v| v.wisper_id).collect())
    }

    /// Full wisper records the user currently has an active vote on
    pub async fn get_voted_wispers(&self, user_id: i64) -> WisperResult<Vec<Wisper>> {
        let wispers = sqlx::query_as::<_, Wisper>(
            "SELECT w.* FROM wispers w
             JOIN votes v ON v.wisper_id = w.id
             WHERE v.user_id = ?1
             ORDER BY v.created_at DESC, v.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(wispers)
    }

    async fn ensure_wisper(tx: &mut Transaction<'_, Sqlite>, wisper_id: i64) -> WisperResult<()> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wispers WHERE id = ?1")
            .bind(wisper_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(WisperError::Database)?;

        if exists == 0 {
            return Err(WisperError::NotFound(format!(
                "Wisper {} not found",
                wisper_id
            )));
        }

        Ok(())
    }

    /// Recompute both counters from the votes table
    ///
    /// MAX(0, ...) floors the counters at zero.
    async fn recount(tx: &mut Transaction<'_, Sqlite>, wisper_id: i64) -> WisperResult<()> {
        sqlx::query(
            "UPDATE wispers SET
                upvotes = MAX(0, (SELECT COUNT(*) FROM votes
                                  WHERE wisper_id = ?1 AND vote_type = 'upvote')),
                downvotes = MAX(0, (SELECT COUNT(*) FROM votes
                                    WHERE wisper_id = ?1 AND vote_type = 'downvote'))
             WHERE id = ?1",
        )
        .bind(wisper_id)
        .execute(&mut **tx)
        .await
        .map_err(WisperError::Database)?;

        Ok(())
    }

    async fn fetch_wisper(tx: &mut Transaction<'_, Sqlite>, wisper_id: i64) -> WisperResult<Wisper> {
        sqlx::query_as::<_, Wisper>("SELECT * FROM wispers WHERE id = ?1")
            .bind(wisper_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(WisperError::Database)
    }
}
