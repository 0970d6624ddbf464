//! End-to-end tests for the gateway: builder wiring, threads and feeds,
//! driven through a wiremock upstream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use huginn::cache::item_cache_key;
use huginn::{
    CacheStore, Context, ConversationNode, FeedSource, Huginn, HuginnError, ItemId,
    MemoryCacheStore, Result,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_item(server: &MockServer, body: serde_json::Value) {
    let id = body["id"].as_u64().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/v0/item/{id}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_null(server: &MockServer, id: ItemId) {
    Mock::given(method("GET"))
        .and(path(format!("/v0/item/{id}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(server)
        .await;
}

/// Story 100 with replies 101 (which has reply 103), 102 and a vanished 104.
async fn mount_thread(server: &MockServer) {
    mount_item(
        server,
        json!({
            "id": 100,
            "type": "story",
            "title": "Show HN",
            "time": 1000,
            "kids": [102, 101, 104]
        }),
    )
    .await;
    mount_item(
        server,
        json!({"id": 101, "type": "comment", "parent": 100, "time": 1010, "kids": [103]}),
    )
    .await;
    mount_item(
        server,
        json!({"id": 102, "type": "comment", "parent": 100, "time": 1030}),
    )
    .await;
    mount_item(
        server,
        json!({"id": 103, "type": "comment", "parent": 101, "time": 1020}),
    )
    .await;
    mount_null(server, 104).await;
}

#[tokio::test]
async fn item_thread_builds_tree_and_sorted_comments() {
    let server = MockServer::start().await;
    mount_thread(&server).await;

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let thread = gateway
        .item_thread(&Context::background(), 100)
        .await
        .unwrap();

    assert_eq!(thread.item.title.as_deref(), Some("Show HN"));
    assert_eq!(
        thread.conversation,
        ConversationNode {
            id: 100,
            kids: vec![
                ConversationNode::leaf(102),
                ConversationNode {
                    id: 101,
                    kids: vec![ConversationNode::leaf(103)],
                },
            ],
        }
    );

    let by_time: Vec<_> = thread.comments.iter().map(|c| c.id).collect();
    assert_eq!(by_time, vec![101, 103, 102]);
}

#[tokio::test]
async fn second_lookup_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "type": "story"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCacheStore::new());
    let gateway = Huginn::builder()
        .base_url(server.uri())
        .cache_store(store.clone())
        .build()
        .unwrap();
    let ctx = Context::background();

    assert_eq!(gateway.items(&ctx, &[1]).await.len(), 1);
    assert_eq!(gateway.items(&ctx, &[1]).await.len(), 1);
    assert!(store.get(&item_cache_key(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn childless_item_thread_makes_no_reply_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/item/50.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 50, "type": "job", "kids": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let thread = gateway
        .item_thread(&Context::background(), 50)
        .await
        .unwrap();

    assert!(!thread.item.has_kids());
    assert_eq!(thread.conversation, ConversationNode::leaf(50));
    assert!(thread.comments.is_empty());
}

#[tokio::test]
async fn missing_item_thread_is_not_found() {
    let server = MockServer::start().await;
    mount_null(&server, 9).await;

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let err = gateway
        .item_thread(&Context::background(), 9)
        .await
        .unwrap_err();

    assert!(matches!(err, HuginnError::NotFound(9)));
}

#[tokio::test]
async fn cancelled_item_thread_reports_cancellation() {
    let server = MockServer::start().await;
    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();

    let ctx = Context::background();
    ctx.cancel();
    let err = gateway.item_thread(&ctx, 1).await.unwrap_err();

    assert!(matches!(err, HuginnError::Cancelled));
}

#[tokio::test]
async fn slow_upstream_is_dropped_without_cache_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/item/5.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 5, "type": "comment"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCacheStore::new());
    let gateway = Huginn::builder()
        .base_url(server.uri())
        .request_timeout(Duration::from_millis(50))
        .cache_store(store.clone())
        .build()
        .unwrap();

    let items = gateway.items(&Context::background(), &[5]).await;

    assert!(items.is_empty());
    store.sync().await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn caller_deadline_bounds_the_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/item/5.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 5, "type": "comment"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let ctx = Context::background().with_timeout(Duration::from_millis(100));

    let started = std::time::Instant::now();
    let items = gateway.items(&ctx, &[5]).await;

    assert!(items.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn top_items_hydrates_feed_in_rank_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([3, 1, 2, 4])))
        .mount(&server)
        .await;
    for id in 1..=4u64 {
        mount_item(&server, json!({"id": id, "type": "story", "score": id * 10})).await;
    }

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let items = gateway.top_items(&Context::background(), 3).await.unwrap();

    let ids: Vec<_> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn top_items_propagates_feed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = Huginn::builder().base_url(server.uri()).build().unwrap();
    let err = gateway
        .top_items(&Context::background(), 10)
        .await
        .unwrap_err();

    assert!(matches!(err, HuginnError::Api { status: 500, .. }));
}

struct StuckFeed;

#[async_trait]
impl FeedSource for StuckFeed {
    async fn top_story_ids(&self) -> Result<Vec<ItemId>> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn top_items_honours_deadline_on_feed() {
    let gateway = Huginn::builder()
        .feed_source(Arc::new(StuckFeed))
        .build()
        .unwrap();
    let ctx = Context::background().with_timeout(Duration::from_secs(1));

    let err = gateway.top_items(&ctx, 5).await.unwrap_err();
    assert!(matches!(err, HuginnError::DeadlineExceeded));
}

#[test]
fn zero_request_timeout_is_rejected() {
    let result = Huginn::builder().request_timeout(Duration::ZERO).build();
    assert!(matches!(result, Err(HuginnError::Configuration(_))));
}

#[test]
fn builder_settings_are_visible_on_gateway() {
    let gateway = Huginn::builder()
        .max_concurrent(5)
        .item_ttl(Duration::from_secs(30))
        .build()
        .unwrap();
    assert_eq!(gateway.max_concurrent(), 5);
    assert_eq!(gateway.item_ttl(), Duration::from_secs(30));
}
