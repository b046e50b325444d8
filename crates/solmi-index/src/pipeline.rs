//! Indexing orchestrator.
//!
//! Runs two independent branches for a saved post:
//!
//! - links: content tree → internal link targets → outbound link write
//! - keywords: content tree → plain text → keywords → registry sync
//!
//! The branches run concurrently and share no state. One failing never
//! stops or rolls back the other; both outcomes land in the [`IndexReport`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use solmi_core::{
    flatten, ContentTree, Error, KeywordExtractor, KeywordRepository, PostEvent, PostId,
    PostRepository, Result,
};

use crate::config::IndexerConfig;
use crate::links::LinkGraphRebuilder;
use crate::sync::{KeywordSync, SyncOutcome};

/// Outcome of indexing one post.
#[derive(Debug)]
pub struct IndexReport {
    pub post_id: PostId,
    /// Outbound link set written, or the links branch error.
    pub links: Result<BTreeSet<PostId>>,
    /// Keyword sync outcome, or the keywords branch error.
    pub keywords: Result<SyncOutcome>,
    pub duration_ms: u64,
}

impl IndexReport {
    /// Whether both branches succeeded.
    pub fn is_success(&self) -> bool {
        self.links.is_ok() && self.keywords.is_ok()
    }

    /// Branch error messages, prefixed with the branch name.
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if let Err(e) = &self.links {
            failures.push(format!("links: {}", e));
        }
        if let Err(e) = &self.keywords {
            failures.push(format!("keywords: {}", e));
        }
        failures
    }

    /// Collapse the report into a single result for hook callers.
    pub fn ensure_success(&self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(Error::Indexing(format!(
            "post {}: {}",
            self.post_id,
            self.failures().join("; ")
        )))
    }
}

/// Post-write indexing pipeline.
pub struct IndexingPipeline {
    posts: Arc<dyn PostRepository>,
    keywords: Arc<dyn KeywordRepository>,
    extractor: KeywordExtractor,
    links: LinkGraphRebuilder,
    sync: KeywordSync,
}

impl IndexingPipeline {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        keywords: Arc<dyn KeywordRepository>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            links: LinkGraphRebuilder::new(posts.clone(), config.allow_self_links),
            sync: KeywordSync::new(posts.clone(), keywords.clone()),
            extractor: KeywordExtractor::new(config.keywords.clone()),
            posts,
            keywords,
        }
    }

    /// Index a post from the content tree that was just saved.
    #[instrument(skip(self, tree))]
    pub async fn index(&self, post_id: &PostId, tree: &ContentTree) -> IndexReport {
        let start = Instant::now();

        let (links, keywords) = tokio::join!(
            self.links.rebuild(post_id, tree),
            self.index_keywords(post_id, tree)
        );

        let report = IndexReport {
            post_id: post_id.clone(),
            links,
            keywords,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if report.is_success() {
            info!(
                subsystem = "index",
                component = "pipeline",
                op = "index",
                post_id = %post_id,
                link_count = report.links.as_ref().map(|l| l.len()).unwrap_or(0),
                keyword_count = report.keywords.as_ref().map(|k| k.keyword_ids.len()).unwrap_or(0),
                duration_ms = report.duration_ms,
                "Post indexed"
            );
        } else {
            error!(
                subsystem = "index",
                component = "pipeline",
                op = "index",
                post_id = %post_id,
                error = %report.failures().join("; "),
                duration_ms = report.duration_ms,
                "Post indexing failed"
            );
        }
        report
    }

    /// Index a post by reading its stored content first.
    pub async fn index_stored(&self, post_id: &PostId) -> Result<IndexReport> {
        let tree = self.posts.fetch_content(post_id).await?;
        Ok(self.index(post_id, &tree).await)
    }

    /// Ids of every stored post, for full reindexing.
    pub async fn stored_post_ids(&self) -> Result<Vec<PostId>> {
        self.posts.list_post_ids().await
    }

    /// Index the post carried by an after-write event.
    pub async fn handle_event(&self, event: &PostEvent) -> IndexReport {
        self.index(event.post_id(), event.content()).await
    }

    async fn index_keywords(&self, post_id: &PostId, tree: &ContentTree) -> Result<SyncOutcome> {
        let text = flatten(tree);
        let extracted = self.extractor.extract(&text);
        debug!(
            post_id = %post_id,
            text_len = text.chars().count(),
            keyword_count = extracted.len(),
            "Keywords extracted"
        );
        let registry = self.keywords.list_all().await?;
        self.sync.sync(&extracted, &registry, post_id).await
    }
}
