//! PostgreSQL implementation of the store traits.
//!
//! Lock exclusivity comes from the `locks.name` primary key:
//! `INSERT .. ON CONFLICT DO NOTHING RETURNING` yields no row for the loser
//! of a race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::models::{GameRow, LockRow, SnapshotRow};
use super::store::{AccountStore, GameStore, LockStore, SnapshotStore, WinLoss};
use crate::config::RankingConfig;
use crate::domain::{AccountId, Game, GameId, Lock, LockName, NewGame, RatingSnapshot};
use crate::error::RankingError;

/// Taken before reading the watermark so no uncommitted insert sits below it.
const LOCK_GAMES_FOR_WATERMARK: &str = "LOCK TABLE games IN SHARE MODE";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the configured pool settings and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &RankingConfig) -> Result<Self, RankingError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RankingError::Persistence(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

/// Maps constraint violations on `games` to request errors.
fn game_insert_error(err: sqlx::Error) -> RankingError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());
    match code.as_deref() {
        Some("23503") => RankingError::InvalidRequest("unknown account".to_string()),
        Some("23514") => RankingError::SelfPlay("winner equals loser".to_string()),
        _ => RankingError::from(err),
    }
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl GameStore for PostgresStore {
    async fn append(&self, game: NewGame) -> Result<Game, RankingError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO games (account_id, winner_key, loser_key, played_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(game.account_id().get())
        .bind(game.winner_key())
        .bind(game.loser_key())
        .bind(game.played_at())
        .fetch_one(&self.pool)
        .await
        .map_err(game_insert_error)?;

        Ok(game.into_game(GameId::new(id)))
    }

    async fn append_batch(&self, games: Vec<NewGame>) -> Result<u64, RankingError> {
        let mut accounts = Vec::with_capacity(games.len());
        let mut winners = Vec::with_capacity(games.len());
        let mut losers = Vec::with_capacity(games.len());
        let mut played = Vec::with_capacity(games.len());
        for game in &games {
            accounts.push(game.account_id().get());
            winners.push(game.winner_key().to_string());
            losers.push(game.loser_key().to_string());
            played.push(game.played_at());
        }

        let result = sqlx::query(
            "INSERT INTO games (account_id, winner_key, loser_key, played_at) \
             SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::timestamptz[])",
        )
        .bind(&accounts)
        .bind(&winners)
        .bind(&losers)
        .bind(&played)
        .execute(&self.pool)
        .await
        .map_err(game_insert_error)?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, RankingError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(count))
    }

    async fn max_id(&self) -> Result<Option<GameId>, RankingError> {
        // SHARE conflicts with the ROW EXCLUSIVE lock every insert holds, so
        // this waits out inserts whose ids were already drawn and blocks new
        // ones until the maximum is read.
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_GAMES_FOR_WATERMARK)
            .execute(&mut *tx)
            .await?;
        let max = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(id) FROM games")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(max.map(GameId::new))
    }

    async fn games_in_window(
        &self,
        after: Option<GameId>,
        up_to: GameId,
    ) -> Result<Vec<Game>, RankingError> {
        let rows = sqlx::query_as::<_, GameRow>(
            "SELECT id, account_id, winner_key, loser_key, played_at FROM games \
             WHERE ($1::bigint IS NULL OR id > $1) AND id <= $2 \
             ORDER BY played_at ASC, id ASC",
        )
        .bind(after.map(GameId::get))
        .bind(up_to.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Game::from).collect())
    }

    async fn win_loss(&self, key: &str) -> Result<WinLoss, RankingError> {
        let (wins, losses) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*) FILTER (WHERE winner_key = $1), \
                    COUNT(*) FILTER (WHERE loser_key = $1) \
             FROM games WHERE winner_key = $1 OR loser_key = $1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(WinLoss {
            wins: to_u64(wins),
            losses: to_u64(losses),
        })
    }
}

#[async_trait]
impl SnapshotStore for PostgresStore {
    async fn latest(&self) -> Result<Option<RatingSnapshot>, RankingError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT computed_at, watermark_game_id, algorithm_fingerprint, ratings \
             FROM rating_snapshots ORDER BY computed_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RatingSnapshot::from))
    }

    async fn append(&self, snapshot: &RatingSnapshot) -> Result<(), RankingError> {
        sqlx::query(
            "INSERT INTO rating_snapshots \
             (computed_at, watermark_game_id, algorithm_fingerprint, ratings) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(snapshot.computed_at)
        .bind(snapshot.watermark.get())
        .bind(&snapshot.algorithm_fingerprint)
        .bind(Json(&snapshot.ratings))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LockStore for PostgresStore {
    async fn insert_if_absent(
        &self,
        name: LockName,
        acquired_at: DateTime<Utc>,
    ) -> Result<Option<Lock>, RankingError> {
        let row = sqlx::query_as::<_, LockRow>(
            "INSERT INTO locks (name, acquired_at, progress, generation) \
             VALUES ($1, $2, 0, nextval('lock_generation_seq')) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING name, acquired_at, progress, generation",
        )
        .bind(name.as_str())
        .bind(acquired_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lock::try_from).transpose()
    }

    async fn get(&self, name: LockName) -> Result<Option<Lock>, RankingError> {
        let row = sqlx::query_as::<_, LockRow>(
            "SELECT name, acquired_at, progress, generation FROM locks WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lock::try_from).transpose()
    }

    async fn set_progress(
        &self,
        name: LockName,
        generation: i64,
        progress: u8,
    ) -> Result<bool, RankingError> {
        let result =
            sqlx::query("UPDATE locks SET progress = $3 WHERE name = $1 AND generation = $2")
                .bind(name.as_str())
                .bind(generation)
                .bind(i16::from(progress.min(100)))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, name: LockName) -> Result<bool, RankingError> {
        let result = sqlx::query("DELETE FROM locks WHERE name = $1")
            .bind(name.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_generation(
        &self,
        name: LockName,
        generation: i64,
    ) -> Result<bool, RankingError> {
        let result = sqlx::query("DELETE FROM locks WHERE name = $1 AND generation = $2")
            .bind(name.as_str())
            .bind(generation)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn find_or_create(
        &self,
        email: &str,
        username: &str,
    ) -> Result<AccountId, RankingError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO accounts (email, username) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(AccountId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_lock_conflicts_with_inserts() {
        // Modes that conflict with ROW EXCLUSIVE but still allow readers.
        let blocking = ["SHARE MODE", "SHARE ROW EXCLUSIVE MODE", "EXCLUSIVE MODE"];
        assert!(LOCK_GAMES_FOR_WATERMARK.starts_with("LOCK TABLE games IN "));
        assert!(blocking.iter().any(|m| LOCK_GAMES_FOR_WATERMARK.ends_with(m)));
    }
}
