//! Keyword registry implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use solmi_core::{new_v7, Error, Keyword, KeywordRepository, Result};

/// PostgreSQL implementation of KeywordRepository.
pub struct PgKeywordRepository {
    pool: Pool<Postgres>,
}

impl PgKeywordRepository {
    /// Create a new PgKeywordRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput("keyword value cannot be empty".into()));
    }
    Ok(())
}

/// Map a unique violation on `keyword.name` to [`Error::DuplicateKeyword`].
fn map_insert_error(value: &str, e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::DuplicateKeyword(value.to_string())
        }
        _ => Error::Database(e),
    }
}

#[async_trait]
impl KeywordRepository for PgKeywordRepository {
    async fn find_by_value(&self, value: &str) -> Result<Option<Uuid>> {
        sqlx::query_scalar("SELECT id FROM keyword WHERE name = $1")
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn create(&self, value: &str) -> Result<Uuid> {
        validate_value(value)?;

        sqlx::query_scalar(
            "INSERT INTO keyword (id, name, created_at_utc) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new_v7())
        .bind(value)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(value, e))
    }

    async fn list_all(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query("SELECT id, name FROM keyword ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Keyword {
                id: row.get("id"),
                value: row.get("name"),
            })
            .collect())
    }

    /// Single-statement upsert. The no-op update makes `RETURNING` yield the
    /// existing row's id when another writer won the insert.
    async fn upsert(&self, value: &str) -> Result<Uuid> {
        validate_value(value)?;

        sqlx::query_scalar(
            r#"
            INSERT INTO keyword (id, name, created_at_utc)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(new_v7())
        .bind(value)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
