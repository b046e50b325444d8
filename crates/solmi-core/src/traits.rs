//! Repository traits consumed by the indexing pipeline.
//!
//! These define the narrow contract the pipeline needs from the document
//! store, enabling the PostgreSQL backend in `solmi-db` and the in-memory
//! [`MemoryStore`](crate::memory::MemoryStore) to be used interchangeably.

use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{ContentTree, Keyword, PostId, PostLinks};

// =============================================================================
// POST REPOSITORY TRAITS
// =============================================================================

/// Read/write access to a post's content and relationship fields.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Fetch the saved content tree of a post.
    async fn fetch_content(&self, post_id: &PostId) -> Result<ContentTree>;

    /// Ids of every stored post.
    async fn list_post_ids(&self) -> Result<Vec<PostId>>;

    /// Replace the post's outbound internal links with the posts in
    /// `targets` that exist, and return that written set.
    ///
    /// Targets that do not exist are skipped, not treated as errors.
    /// Implementations keep the inverse (inbound) side consistent in the
    /// same atomic write.
    async fn replace_outbound_links(
        &self,
        post_id: &PostId,
        targets: &BTreeSet<PostId>,
    ) -> Result<BTreeSet<PostId>>;

    /// Both directions of the post's internal link graph.
    async fn links(&self, post_id: &PostId) -> Result<PostLinks>;

    /// Replace the post's keyword associations with exactly `keyword_ids`.
    async fn replace_keywords(&self, post_id: &PostId, keyword_ids: &BTreeSet<Uuid>)
        -> Result<()>;

    /// Keyword ids currently associated with the post.
    async fn keywords_for(&self, post_id: &PostId) -> Result<BTreeSet<Uuid>>;
}

// =============================================================================
// KEYWORD REPOSITORY TRAITS
// =============================================================================

/// Registry of keywords, unique by normalized value.
#[async_trait]
pub trait KeywordRepository: Send + Sync {
    /// Look up a keyword id by its exact normalized value.
    async fn find_by_value(&self, value: &str) -> Result<Option<Uuid>>;

    /// Create a keyword.
    ///
    /// Fails with [`Error::DuplicateKeyword`] when the value already exists.
    async fn create(&self, value: &str) -> Result<Uuid>;

    /// List every keyword in the registry.
    async fn list_all(&self) -> Result<Vec<Keyword>>;

    /// Return the id for `value`, creating the keyword if needed.
    ///
    /// Idempotent under concurrent callers: a uniqueness conflict on create
    /// is resolved by looking the winner up. Backends with a native upsert
    /// should override this.
    async fn upsert(&self, value: &str) -> Result<Uuid> {
        match self.create(value).await {
            Ok(id) => Ok(id),
            Err(Error::DuplicateKeyword(_)) => {
                tracing::warn!(
                    subsystem = "index",
                    component = "keyword_registry",
                    keyword = value,
                    "Keyword created concurrently, re-resolving"
                );
                self.find_by_value(value).await?.ok_or_else(|| {
                    Error::Internal(format!(
                        "keyword '{}' reported as duplicate but not found",
                        value
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }
}
