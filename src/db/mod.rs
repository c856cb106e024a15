mod models;

pub use models::*;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("flashdeck.db");

    info!("Initializing database at {}", db_path.display());

    // WAL for better concurrency; foreign keys must be on for deck
    // deletion to cascade to cards.
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Migration 002: Add due-card index
    let has_review_index: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='index' AND name='idx_cards_next_review'",
    )
    .fetch_optional(pool)
    .await?;
    if has_review_index.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_review_index.sql")).await?;
    }

    info!("Migrations completed");
    Ok(())
}

/// Tables whose rows are exposed through an external GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidTable {
    Decks,
    Cards,
}

impl GuidTable {
    pub fn as_str(self) -> &'static str {
        match self {
            GuidTable::Decks => "decks",
            GuidTable::Cards => "cards",
        }
    }
}

/// Resolve an externally-exposed GUID to the internal row id.
///
/// A missing row is a normal outcome, not an error: the caller decides
/// whether `None` becomes a 404. The match is exact and case-sensitive.
pub async fn guid_to_id(
    pool: &DbPool,
    table: GuidTable,
    guid: &str,
) -> Result<Option<i64>, sqlx::Error> {
    if guid.is_empty() {
        return Ok(None);
    }

    let query = format!("SELECT id FROM {} WHERE guid = ?", table.as_str());
    let row: Option<(i64,)> = sqlx::query_as(&query)
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(id,)| id))
}

/// Resolve a request identifier that may arrive as either an internal id
/// or a GUID. The id wins when both are present.
pub async fn resolve_id(
    pool: &DbPool,
    table: GuidTable,
    id: Option<i64>,
    guid: Option<&str>,
) -> Result<Option<i64>, sqlx::Error> {
    match id {
        Some(id) => Ok(Some(id)),
        None => match guid {
            Some(guid) => guid_to_id(pool, table, guid).await,
            None => Ok(None),
        },
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory database options")
        .foreign_keys(true);

    // A single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn insert_user(pool: &DbPool, username: &str) -> i64 {
        sqlx::query("INSERT INTO users (username, password_hash, password_salt, created_at) VALUES (?, 'x', 'y', 'now')")
            .bind(username)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn insert_deck(pool: &DbPool, user_id: i64, guid: &str) -> i64 {
        sqlx::query(
            "INSERT INTO decks (guid, user_id, deck_name, card_count, created_at) VALUES (?, ?, 'Deck', 0, 'now')",
        )
        .bind(guid)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_guid_to_id_resolves_existing_row() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "resolver").await;
        let deck_id = insert_deck(&pool, user_id, "deck-guid-1").await;

        let resolved = guid_to_id(&pool, GuidTable::Decks, "deck-guid-1")
            .await
            .unwrap();
        assert_eq!(resolved, Some(deck_id));
    }

    #[tokio::test]
    async fn test_guid_to_id_missing_row_is_none() {
        let pool = test_pool().await;

        let resolved = guid_to_id(&pool, GuidTable::Decks, "no-such-guid")
            .await
            .unwrap();
        assert_eq!(resolved, None);

        let resolved = guid_to_id(&pool, GuidTable::Cards, "").await.unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_guid_match_is_case_sensitive() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "casing").await;
        insert_deck(&pool, user_id, "AbCdEf").await;

        let exact = guid_to_id(&pool, GuidTable::Decks, "AbCdEf").await.unwrap();
        assert!(exact.is_some());

        let wrong_case = guid_to_id(&pool, GuidTable::Decks, "abcdef").await.unwrap();
        assert_eq!(wrong_case, None);
    }

    #[tokio::test]
    async fn test_resolve_id_prefers_explicit_id() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "prefer").await;
        insert_deck(&pool, user_id, "some-guid").await;

        let resolved = resolve_id(&pool, GuidTable::Decks, Some(42), Some("some-guid"))
            .await
            .unwrap();
        assert_eq!(resolved, Some(42));

        let resolved = resolve_id(&pool, GuidTable::Decks, None, None).await.unwrap();
        assert_eq!(resolved, None);
    }
}
