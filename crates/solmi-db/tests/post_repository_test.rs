//! Integration tests for PgPostRepository and PgKeywordRepository.
//!
//! All tests need a reachable PostgreSQL server (see `DATABASE_URL`).

use serde_json::json;
use solmi_core::{Error, KeywordRepository, PostEvent, PostId, PostRepository};
use solmi_db::test_fixtures::TestDatabase;
use std::collections::BTreeSet;

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

fn ids(list: &[&str]) -> BTreeSet<PostId> {
    list.iter().map(|s| PostId::from(*s)).collect()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_save_reports_created_then_updated() {
    let test_db = setup().await;
    let id = PostId::new("post-1");
    let content = json!([{ "type": "paragraph", "children": [{ "text": "hello" }] }]);

    let first = test_db.db.posts.save(&id, "One", &content).await.unwrap();
    assert!(matches!(first, PostEvent::Created { .. }));

    let second = test_db.db.posts.save(&id, "One", &content).await.unwrap();
    assert!(matches!(second, PostEvent::Updated { .. }));
    assert_eq!(second.content().nodes.len(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_fetch_content_parses_stored_json() {
    let test_db = setup().await;
    let id = test_db
        .seed_post(
            "post-1",
            json!([{ "type": "paragraph", "children": [{ "text": "고양이" }] }]),
        )
        .await;

    let tree = test_db.db.posts.fetch_content(&id).await.unwrap();
    assert_eq!(solmi_core::flatten(&tree), "고양이 ");

    let missing = test_db.db.posts.fetch_content(&"nope".into()).await;
    assert!(matches!(missing, Err(Error::PostNotFound(_))));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_replace_outbound_links_is_set_replace() {
    let test_db = setup().await;
    for id in ["a", "b", "c"] {
        test_db.seed_post(id, json!([])).await;
    }
    let posts = &test_db.db.posts;
    let a = PostId::from("a");

    posts.replace_outbound_links(&a, &ids(&["b", "c"])).await.unwrap();
    posts.replace_outbound_links(&a, &ids(&["c"])).await.unwrap();

    assert_eq!(posts.links(&a).await.unwrap().outbound, ids(&["c"]));
    assert!(posts.links(&"b".into()).await.unwrap().inbound.is_empty());
    assert_eq!(posts.links(&"c".into()).await.unwrap().inbound, ids(&["a"]));

    posts.replace_outbound_links(&a, &BTreeSet::new()).await.unwrap();
    assert!(posts.links(&"c".into()).await.unwrap().inbound.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_replace_outbound_links_skips_missing_targets() {
    let test_db = setup().await;
    test_db.seed_post("a", json!([])).await;
    test_db.seed_post("b", json!([])).await;
    test_db.seed_post("c", json!([])).await;
    let posts = &test_db.db.posts;
    let a = PostId::from("a");

    posts.replace_outbound_links(&a, &ids(&["c"])).await.unwrap();
    let written = posts
        .replace_outbound_links(&a, &ids(&["b", "ghost"]))
        .await
        .unwrap();

    assert_eq!(written, ids(&["b"]));
    assert_eq!(posts.links(&a).await.unwrap().outbound, ids(&["b"]));
    assert!(posts.links(&"c".into()).await.unwrap().inbound.is_empty());

    let missing_source = posts
        .replace_outbound_links(&"ghost".into(), &ids(&["b"]))
        .await;
    assert!(matches!(missing_source, Err(Error::PostNotFound(_))));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_mutual_links_rebuilt_concurrently() {
    let test_db = setup().await;
    test_db.seed_post("a", json!([])).await;
    test_db.seed_post("b", json!([])).await;
    let posts = &test_db.db.posts;
    let (a, b) = (PostId::from("a"), PostId::from("b"));
    let (to_b, to_a) = (ids(&["b"]), ids(&["a"]));

    for _ in 0..20 {
        let (ra, rb) = tokio::join!(
            posts.replace_outbound_links(&a, &to_b),
            posts.replace_outbound_links(&b, &to_a)
        );
        assert_eq!(ra.unwrap(), to_b);
        assert_eq!(rb.unwrap(), to_a);
    }

    let a_links = posts.links(&a).await.unwrap();
    assert_eq!(a_links.outbound, to_b);
    assert_eq!(a_links.inbound, to_b);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_list_post_ids() {
    let test_db = setup().await;
    test_db.seed_post("b", json!([])).await;
    test_db.seed_post("a", json!([])).await;

    assert_eq!(
        test_db.db.posts.list_post_ids().await.unwrap(),
        vec![PostId::from("a"), PostId::from("b")]
    );

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_keyword_registry_uniqueness() {
    let test_db = setup().await;
    let keywords = &test_db.db.keywords;

    let id = keywords.create("여행").await.unwrap();
    let dup = keywords.create("여행").await.unwrap_err();
    assert!(dup.is_duplicate_keyword());

    assert_eq!(keywords.upsert("여행").await.unwrap(), id);
    assert_eq!(keywords.find_by_value("여행").await.unwrap(), Some(id));
    assert_eq!(keywords.list_all().await.unwrap().len(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_concurrent_upserts_resolve_to_one_keyword() {
    let test_db = setup().await;
    let keywords = &test_db.db.keywords;

    let (a, b) = tokio::join!(keywords.upsert("기록"), keywords.upsert("기록"));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(keywords.list_all().await.unwrap().len(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_replace_keywords_and_inverse_lookup() {
    let test_db = setup().await;
    let id = test_db.seed_post("post-1", json!([])).await;
    let k1 = test_db.db.keywords.upsert("k1").await.unwrap();
    let k2 = test_db.db.keywords.upsert("k2").await.unwrap();
    let posts = &test_db.db.posts;

    posts
        .replace_keywords(&id, &[k1, k2].into_iter().collect())
        .await
        .unwrap();
    posts
        .replace_keywords(&id, &[k2].into_iter().collect())
        .await
        .unwrap();

    assert_eq!(
        posts.keywords_for(&id).await.unwrap(),
        [k2].into_iter().collect()
    );
    assert!(posts.posts_for_keyword(k1).await.unwrap().is_empty());
    assert_eq!(posts.posts_for_keyword(k2).await.unwrap(), ids(&["post-1"]));

    test_db.cleanup().await;
}
