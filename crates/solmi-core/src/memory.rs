//! In-memory implementation of the repository traits.
//!
//! Backs tests and embedders that do not run PostgreSQL. Every write takes
//! one lock, so a link replacement updates both directions atomically and
//! keyword values stay unique.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{ContentTree, Keyword, PostId, PostLinks};
use crate::traits::{KeywordRepository, PostRepository};
use crate::uuid_utils::new_v7;

#[derive(Debug, Default)]
struct PostRecord {
    content: ContentTree,
    outbound: BTreeSet<PostId>,
    inbound: BTreeSet<PostId>,
    keywords: BTreeSet<Uuid>,
}

#[derive(Debug, Default)]
struct Inner {
    posts: HashMap<PostId, PostRecord>,
    keywords: BTreeMap<Uuid, String>,
    keyword_ids: HashMap<String, Uuid>,
}

/// Thread-safe in-memory post and keyword store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a post or replace its content. Relationship fields are kept.
    pub async fn save_post(&self, post_id: impl Into<PostId>, content: ContentTree) {
        let mut inner = self.inner.write().await;
        inner.posts.entry(post_id.into()).or_default().content = content;
    }

    /// Posts associated with a keyword (inverse of the post's keyword set).
    pub async fn posts_for_keyword(&self, keyword_id: Uuid) -> BTreeSet<PostId> {
        let inner = self.inner.read().await;
        inner
            .posts
            .iter()
            .filter(|(_, record)| record.keywords.contains(&keyword_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of keywords in the registry.
    pub async fn keyword_count(&self) -> usize {
        self.inner.read().await.keywords.len()
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn fetch_content(&self, post_id: &PostId) -> Result<ContentTree> {
        let inner = self.inner.read().await;
        inner
            .posts
            .get(post_id)
            .map(|record| record.content.clone())
            .ok_or_else(|| Error::PostNotFound(post_id.clone()))
    }

    async fn list_post_ids(&self) -> Result<Vec<PostId>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<PostId> = inner.posts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn replace_outbound_links(
        &self,
        post_id: &PostId,
        targets: &BTreeSet<PostId>,
    ) -> Result<BTreeSet<PostId>> {
        let mut inner = self.inner.write().await;

        if !inner.posts.contains_key(post_id) {
            return Err(Error::PostNotFound(post_id.clone()));
        }
        let (existing, missing): (BTreeSet<PostId>, BTreeSet<PostId>) = targets
            .iter()
            .cloned()
            .partition(|t| inner.posts.contains_key(t));
        if !missing.is_empty() {
            warn!(
                post_id = %post_id,
                skipped_count = missing.len(),
                missing = ?missing,
                "Skipping links to missing posts"
            );
        }

        let previous = match inner.posts.get_mut(post_id) {
            Some(record) => std::mem::replace(&mut record.outbound, existing.clone()),
            None => return Err(Error::PostNotFound(post_id.clone())),
        };

        for removed in previous.difference(&existing) {
            if let Some(record) = inner.posts.get_mut(removed) {
                record.inbound.remove(post_id);
            }
        }
        for added in &existing {
            if let Some(record) = inner.posts.get_mut(added) {
                record.inbound.insert(post_id.clone());
            }
        }
        Ok(existing)
    }

    async fn links(&self, post_id: &PostId) -> Result<PostLinks> {
        let inner = self.inner.read().await;
        inner
            .posts
            .get(post_id)
            .map(|record| PostLinks {
                outbound: record.outbound.clone(),
                inbound: record.inbound.clone(),
            })
            .ok_or_else(|| Error::PostNotFound(post_id.clone()))
    }

    async fn replace_keywords(
        &self,
        post_id: &PostId,
        keyword_ids: &BTreeSet<Uuid>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;

        if let Some(unknown) = keyword_ids.iter().find(|id| !inner.keywords.contains_key(*id)) {
            return Err(Error::NotFound(format!("keyword {}", unknown)));
        }

        let record = inner
            .posts
            .get_mut(post_id)
            .ok_or_else(|| Error::PostNotFound(post_id.clone()))?;
        record.keywords = keyword_ids.clone();
        Ok(())
    }

    async fn keywords_for(&self, post_id: &PostId) -> Result<BTreeSet<Uuid>> {
        let inner = self.inner.read().await;
        inner
            .posts
            .get(post_id)
            .map(|record| record.keywords.clone())
            .ok_or_else(|| Error::PostNotFound(post_id.clone()))
    }
}

#[async_trait]
impl KeywordRepository for MemoryStore {
    async fn find_by_value(&self, value: &str) -> Result<Option<Uuid>> {
        Ok(self.inner.read().await.keyword_ids.get(value).copied())
    }

    async fn create(&self, value: &str) -> Result<Uuid> {
        if value.is_empty() {
            return Err(Error::InvalidInput("keyword value cannot be empty".into()));
        }

        let mut inner = self.inner.write().await;
        if inner.keyword_ids.contains_key(value) {
            return Err(Error::DuplicateKeyword(value.to_string()));
        }

        let id = new_v7();
        inner.keyword_ids.insert(value.to_string(), id);
        inner.keywords.insert(id, value.to_string());
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Keyword>> {
        let inner = self.inner.read().await;
        Ok(inner
            .keywords
            .iter()
            .map(|(id, value)| Keyword {
                id: *id,
                value: value.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentNode;

    fn ids(list: &[&str]) -> BTreeSet<PostId> {
        list.iter().map(|s| PostId::from(*s)).collect()
    }

    async fn store_with(posts: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for id in posts {
            store.save_post(*id, ContentTree::default()).await;
        }
        store
    }

    #[tokio::test]
    async fn test_fetch_content_roundtrip() {
        let store = MemoryStore::new();
        let tree = ContentTree::new(vec![ContentNode::text("hello")]);
        store.save_post("a", tree.clone()).await;

        assert_eq!(store.fetch_content(&"a".into()).await.unwrap(), tree);
        assert!(matches!(
            store.fetch_content(&"missing".into()).await,
            Err(Error::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_outbound_links_maintains_inverse() {
        let store = store_with(&["a", "b", "c"]).await;
        let a = PostId::from("a");

        store.replace_outbound_links(&a, &ids(&["b", "c"])).await.unwrap();
        assert_eq!(store.links(&"b".into()).await.unwrap().inbound, ids(&["a"]));
        assert_eq!(store.links(&"c".into()).await.unwrap().inbound, ids(&["a"]));

        store.replace_outbound_links(&a, &ids(&["c"])).await.unwrap();
        assert!(store.links(&"b".into()).await.unwrap().inbound.is_empty());
        assert_eq!(store.links(&"c".into()).await.unwrap().inbound, ids(&["a"]));
        assert_eq!(store.links(&a).await.unwrap().outbound, ids(&["c"]));
    }

    #[tokio::test]
    async fn test_replace_outbound_links_skips_missing_targets() {
        let store = store_with(&["a", "b"]).await;
        let a = PostId::from("a");

        let written = store
            .replace_outbound_links(&a, &ids(&["b", "ghost"]))
            .await
            .unwrap();
        assert_eq!(written, ids(&["b"]));
        assert_eq!(store.links(&a).await.unwrap().outbound, ids(&["b"]));
        assert_eq!(store.links(&"b".into()).await.unwrap().inbound, ids(&["a"]));
    }

    #[tokio::test]
    async fn test_replace_outbound_links_unknown_source() {
        let store = store_with(&["b"]).await;
        let err = store
            .replace_outbound_links(&"ghost".into(), &ids(&["b"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PostNotFound(id) if id.as_str() == "ghost"));
        assert!(store.links(&"b".into()).await.unwrap().inbound.is_empty());
    }

    #[tokio::test]
    async fn test_list_post_ids_sorted() {
        let store = store_with(&["c", "a", "b"]).await;
        assert_eq!(
            store.list_post_ids().await.unwrap(),
            vec![PostId::from("a"), PostId::from("b"), PostId::from("c")]
        );
    }

    #[tokio::test]
    async fn test_save_post_keeps_relationships() {
        let store = store_with(&["a", "b"]).await;
        store
            .replace_outbound_links(&"a".into(), &ids(&["b"]))
            .await
            .unwrap();
        store.save_post("a", ContentTree::default()).await;
        assert_eq!(store.links(&"a".into()).await.unwrap().outbound, ids(&["b"]));
    }

    #[tokio::test]
    async fn test_keyword_create_is_unique() {
        let store = MemoryStore::new();
        let id = store.create("여행").await.unwrap();
        assert!(crate::uuid_utils::is_v7(&id));

        assert!(store.create("여행").await.unwrap_err().is_duplicate_keyword());
        assert_eq!(store.find_by_value("여행").await.unwrap(), Some(id));
        assert_eq!(store.find_by_value("기록").await.unwrap(), None);
        assert_eq!(store.keyword_count().await, 1);
    }

    #[tokio::test]
    async fn test_keyword_create_rejects_empty() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create("").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_default_resolves_existing() {
        let store = MemoryStore::new();
        let id = store.create("rust").await.unwrap();
        assert_eq!(store.upsert("rust").await.unwrap(), id);
        assert_eq!(store.keyword_count().await, 1);
    }

    #[tokio::test]
    async fn test_replace_keywords_and_inverse() {
        let store = store_with(&["a", "b"]).await;
        let k1 = store.create("k1").await.unwrap();
        let k2 = store.create("k2").await.unwrap();

        store
            .replace_keywords(&"a".into(), &[k1, k2].into_iter().collect())
            .await
            .unwrap();
        store
            .replace_keywords(&"b".into(), &[k2].into_iter().collect())
            .await
            .unwrap();

        assert_eq!(store.posts_for_keyword(k1).await, ids(&["a"]));
        assert_eq!(store.posts_for_keyword(k2).await, ids(&["a", "b"]));

        store
            .replace_keywords(&"a".into(), &BTreeSet::new())
            .await
            .unwrap();
        assert!(store.keywords_for(&"a".into()).await.unwrap().is_empty());
        assert_eq!(store.posts_for_keyword(k2).await, ids(&["b"]));
    }

    #[tokio::test]
    async fn test_list_all_keywords() {
        let store = MemoryStore::new();
        store.create("a1").await.unwrap();
        store.create("b2").await.unwrap();

        let mut values: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.value)
            .collect();
        values.sort();
        assert_eq!(values, vec!["a1", "b2"]);
    }
}
