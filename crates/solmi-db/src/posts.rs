//! Post repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

use solmi_core::{ContentTree, Error, PostEvent, PostId, PostLinks, PostRepository, Result};

/// PostgreSQL implementation of PostRepository.
pub struct PgPostRepository {
    pool: Pool<Postgres>,
}

impl PgPostRepository {
    /// Create a new PgPostRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert or update a post and return the event describing the write.
    ///
    /// Publishing the returned event is the caller's job, after this
    /// returns, so subscribers only ever see committed content.
    pub async fn save(&self, post_id: &PostId, title: &str, content: &JsonValue) -> Result<PostEvent> {
        if post_id.as_str().is_empty() {
            return Err(Error::InvalidInput("post id cannot be empty".into()));
        }

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO post (id, title, content, created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (id) DO UPDATE
                SET title = EXCLUDED.title,
                    content = EXCLUDED.content,
                    updated_at_utc = EXCLUDED.updated_at_utc
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(post_id.as_str())
        .bind(title)
        .bind(content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tree = ContentTree::from_json(content);
        let inserted: bool = row.get("inserted");
        Ok(if inserted {
            PostEvent::created(post_id.clone(), tree)
        } else {
            PostEvent::updated(post_id.clone(), tree)
        })
    }

    /// Posts associated with a keyword.
    pub async fn posts_for_keyword(&self, keyword_id: Uuid) -> Result<BTreeSet<PostId>> {
        let rows = sqlx::query("SELECT post_id FROM post_keyword WHERE keyword_id = $1")
            .bind(keyword_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| PostId::new(row.get::<String, _>("post_id")))
            .collect())
    }

    async fn ensure_exists(&self, post_id: &PostId) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM post WHERE id = $1)")
            .bind(post_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        if exists {
            Ok(())
        } else {
            Err(Error::PostNotFound(post_id.clone()))
        }
    }
}

fn to_strings(ids: &BTreeSet<PostId>) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn fetch_content(&self, post_id: &PostId) -> Result<ContentTree> {
        let content: Option<JsonValue> =
            sqlx::query_scalar("SELECT content FROM post WHERE id = $1")
                .bind(post_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        content
            .map(|value| ContentTree::from_json(&value))
            .ok_or_else(|| Error::PostNotFound(post_id.clone()))
    }

    async fn list_post_ids(&self) -> Result<Vec<PostId>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM post ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(ids.into_iter().map(PostId::new).collect())
    }

    async fn replace_outbound_links(
        &self,
        post_id: &PostId,
        targets: &BTreeSet<PostId>,
    ) -> Result<BTreeSet<PostId>> {
        let target_ids = to_strings(targets);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // NO KEY UPDATE serializes rebuilds of the same post without blocking
        // the FOR KEY SHARE taken by link inserts that reference this row.
        let locked: Option<String> =
            sqlx::query_scalar("SELECT id FROM post WHERE id = $1 FOR NO KEY UPDATE")
                .bind(post_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if locked.is_none() {
            return Err(Error::PostNotFound(post_id.clone()));
        }

        let existing: Vec<String> = sqlx::query_scalar("SELECT id FROM post WHERE id = ANY($1)")
            .bind(&target_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;
        let written: BTreeSet<PostId> = existing.iter().cloned().map(PostId::new).collect();
        if written.len() < targets.len() {
            let missing: Vec<&PostId> = targets.difference(&written).collect();
            warn!(
                subsystem = "database",
                component = "links",
                post_id = %post_id,
                skipped_count = missing.len(),
                missing = ?missing,
                "Skipping links to missing posts"
            );
        }

        sqlx::query("DELETE FROM post_internal_link WHERE from_post_id = $1")
            .bind(post_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if !existing.is_empty() {
            sqlx::query(
                "INSERT INTO post_internal_link (from_post_id, to_post_id)
                 SELECT $1, UNNEST($2::text[])",
            )
            .bind(post_id.as_str())
            .bind(&existing)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(written)
    }

    async fn links(&self, post_id: &PostId) -> Result<PostLinks> {
        self.ensure_exists(post_id).await?;

        let outbound: Vec<String> = sqlx::query_scalar(
            "SELECT to_post_id FROM post_internal_link WHERE from_post_id = $1",
        )
        .bind(post_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let inbound: Vec<String> = sqlx::query_scalar(
            "SELECT from_post_id FROM post_internal_link WHERE to_post_id = $1",
        )
        .bind(post_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(PostLinks {
            outbound: outbound.into_iter().map(PostId::new).collect(),
            inbound: inbound.into_iter().map(PostId::new).collect(),
        })
    }

    async fn replace_keywords(
        &self,
        post_id: &PostId,
        keyword_ids: &BTreeSet<Uuid>,
    ) -> Result<()> {
        let ids: Vec<Uuid> = keyword_ids.iter().copied().collect();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let locked: Option<String> =
            sqlx::query_scalar("SELECT id FROM post WHERE id = $1 FOR NO KEY UPDATE")
                .bind(post_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if locked.is_none() {
            return Err(Error::PostNotFound(post_id.clone()));
        }

        sqlx::query("DELETE FROM post_keyword WHERE post_id = $1")
            .bind(post_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if !ids.is_empty() {
            sqlx::query(
                "INSERT INTO post_keyword (post_id, keyword_id)
                 SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(post_id.as_str())
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn keywords_for(&self, post_id: &PostId) -> Result<BTreeSet<Uuid>> {
        self.ensure_exists(post_id).await?;

        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT keyword_id FROM post_keyword WHERE post_id = $1")
                .bind(post_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(ids.into_iter().collect())
    }
}
