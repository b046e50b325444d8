//! Keyword registry sync.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use solmi_core::{Keyword, KeywordRepository, PostId, PostRepository, Result};

/// Result of one keyword sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Keyword ids now associated with the post.
    pub keyword_ids: BTreeSet<Uuid>,
    /// Keywords found in the registry snapshot.
    pub reused: usize,
    /// Keywords missing from the snapshot, resolved through upsert. Counts
    /// both new keywords and ones another run created after the snapshot.
    pub resolved_via_upsert: usize,
}

/// Resolves extracted keyword strings to registry ids and writes a post's
/// keyword associations.
pub struct KeywordSync {
    posts: Arc<dyn PostRepository>,
    keywords: Arc<dyn KeywordRepository>,
}

impl KeywordSync {
    pub fn new(posts: Arc<dyn PostRepository>, keywords: Arc<dyn KeywordRepository>) -> Self {
        Self { posts, keywords }
    }

    /// Replace the post's keyword associations with the ids of `extracted`.
    ///
    /// `registry` should be a fresh read of every keyword. Values missing
    /// from it go through [`KeywordRepository::upsert`], so a keyword created
    /// concurrently by another run resolves to the existing id.
    pub async fn sync(
        &self,
        extracted: &[String],
        registry: &[Keyword],
        post_id: &PostId,
    ) -> Result<SyncOutcome> {
        let known: HashMap<&str, Uuid> = registry
            .iter()
            .map(|keyword| (keyword.value.as_str(), keyword.id))
            .collect();

        let mut outcome = SyncOutcome::default();
        for value in extracted {
            let id = match known.get(value.as_str()) {
                Some(&id) => {
                    outcome.reused += 1;
                    id
                }
                None => {
                    outcome.resolved_via_upsert += 1;
                    self.keywords.upsert(value).await?
                }
            };
            outcome.keyword_ids.insert(id);
        }

        self.posts
            .replace_keywords(post_id, &outcome.keyword_ids)
            .await?;

        debug!(
            subsystem = "index",
            component = "keywords",
            post_id = %post_id,
            keyword_count = outcome.keyword_ids.len(),
            upserted_count = outcome.resolved_via_upsert,
            "Keyword associations replaced"
        );
        Ok(outcome)
    }
}
