//! End-to-end crawls against a mock HTTP server into a temporary SQLite database.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use apicrawl::config::CrawlConfig;
use apicrawl::crawl::{seed_requests, seed_values, AbortReason, Pipeline, RunState};
use apicrawl::http_client::{ClientOptions, HttpFetcher, RequestBudget};
use apicrawl::models::EntityKind;
use apicrawl::rate_limit::{RateLimitConfig, RateLimiter};
use apicrawl::repository::{
    run_migrations, DieselSink, QueueRepository, RecordRepository, SqlitePool,
};

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let url = dir.path().join("apicrawl.db").display().to_string();
    run_migrations(&url).await.unwrap();
    (dir, SqlitePool::new(&url))
}

fn fetcher(budget: usize) -> Arc<HttpFetcher> {
    let options = ClientOptions {
        user_agent: "apicrawl-test".to_string(),
        timeout: Duration::from_secs(5),
    };
    let limiter = RateLimiter::with_config(RateLimitConfig::per_minute(60_000));
    Arc::new(HttpFetcher::new(&options, limiter, 2, RequestBudget::new(budget)).unwrap())
}

fn fans_crawl(server: &MockServer) -> CrawlConfig {
    serde_json::from_value(json!({
        "name": "fans",
        "entity": "fan",
        "url": format!("{}/getUserRelationList", server.uri()),
        "method": "POST",
        "headers": {"x-token": "secret"},
        "params": {"listType": "follower", "pageSize": 2},
        "chain_param": "targetUserId",
        "seeds": {"source": "static", "values": [691067]},
        "pagination": {
            "policy": "size",
            "page_param": "pageIndex",
            "page_size_param": "pageSize",
            "page_size": 2,
            "items_path": "data.list",
            "total_path": null
        },
        "success": {"path": "success", "require": ["data"]},
        "requests_per_minute": 60000
    }))
    .unwrap()
}

async fn mount_fans(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/getUserRelationList"))
        .and(header("x-token", "secret"))
        .and(body_partial_json(json!({"targetUserId": 691067, "pageIndex": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"list": [
                {"unionUserId": 1, "userName": "alice"},
                {"unionUserId": 2, "userName": "bob"}
            ]}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/getUserRelationList"))
        .and(body_partial_json(json!({"targetUserId": 691067, "pageIndex": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"list": [{"unionUserId": 3, "userName": "carol"}]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_crawl_stops_at_total() {
    let server = MockServer::start().await;
    for (page, ids) in [("1", vec!["a1", "a2"]), ("2", vec!["a3"])] {
        let items: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "name": format!("activity {}", id)}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/search/activity"))
            .and(query_param("page", page))
            .and(query_param("timeline", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"items": items, "total": 3}})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let crawl: CrawlConfig = serde_json::from_value(json!({
        "name": "activity",
        "entity": "activity",
        "url": format!("{}/search/activity", server.uri()),
        "params": {"timeline": 1, "page_size": 2},
        "pagination": {"page_size_param": "page_size", "page_size": 2},
        "requests_per_minute": 60000
    }))
    .unwrap();

    let (_dir, pool) = setup_db().await;
    let pipeline = Pipeline::new(
        crawl.clone(),
        fetcher(0),
        Arc::new(DieselSink::new(pool.clone())),
    )
    .unwrap()
    .with_queue_store(QueueRepository::new(pool.clone()));

    let seeds = seed_requests(&crawl, pipeline.paginator(), &[]);
    let summary = pipeline.run(seeds).await.unwrap();

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.totals().pages, 2);
    assert_eq!(summary.totals().saved, 3);

    let records = RecordRepository::new(pool.clone());
    assert_eq!(records.count(EntityKind::Activity).await.unwrap(), 3);
    assert_eq!(records.raw_page_count().await.unwrap(), 2);

    let counts = QueueRepository::new(pool).counts("activity").await.unwrap();
    assert_eq!(counts.done, 2);
    assert_eq!(counts.pending, 0);
}

#[tokio::test]
async fn test_budget_abort_then_resume() {
    let server = MockServer::start().await;
    mount_fans(&server).await;

    let (_dir, pool) = setup_db().await;
    let crawl = fans_crawl(&server);
    let records = RecordRepository::new(pool.clone());
    let queue = QueueRepository::new(pool.clone());

    let first = Pipeline::new(
        crawl.clone(),
        fetcher(1),
        Arc::new(DieselSink::new(pool.clone())),
    )
    .unwrap()
    .with_queue_store(queue.clone());
    let values = seed_values(&crawl.seeds, &records).await.unwrap();
    let seeds = seed_requests(&crawl, first.paginator(), &values);
    assert_eq!(seeds[0].unique_key, "fans_691067_p1");

    let summary = first.run(seeds).await.unwrap();
    assert_eq!(summary.state, RunState::Aborted(AbortReason::BudgetExhausted));
    assert_eq!(summary.remaining, 1);
    assert_eq!(records.count(EntityKind::Fan).await.unwrap(), 2);

    let pending = queue.pending("fans").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].unique_key, "fans_691067_p2");
    let done = queue.done_keys("fans").await.unwrap();
    assert!(done.contains("fans_691067_p1"));

    let second = Pipeline::new(crawl, fetcher(0), Arc::new(DieselSink::new(pool.clone())))
        .unwrap()
        .with_queue_store(queue.clone());
    let summary = second.resume(pending, done).await.unwrap();

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.totals().pages, 1);
    assert_eq!(records.count(EntityKind::Fan).await.unwrap(), 3);
    let counts = queue.counts("fans").await.unwrap();
    assert_eq!(counts.done, 2);
    assert_eq!(counts.pending, 0);
}

#[tokio::test]
async fn test_rerun_upserts_without_duplicates() {
    let server = MockServer::start().await;
    mount_fans(&server).await;

    let (_dir, pool) = setup_db().await;
    let crawl = fans_crawl(&server);
    let records = RecordRepository::new(pool.clone());

    for _ in 0..2 {
        let pipeline = Pipeline::new(
            crawl.clone(),
            fetcher(0),
            Arc::new(DieselSink::new(pool.clone())),
        )
        .unwrap()
        .with_queue_store(QueueRepository::new(pool.clone()));
        let values = seed_values(&crawl.seeds, &records).await.unwrap();
        let seeds = seed_requests(&crawl, pipeline.paginator(), &values);
        let summary = pipeline.run(seeds).await.unwrap();
        assert_eq!(summary.state, RunState::Done);
    }

    assert_eq!(records.count(EntityKind::Fan).await.unwrap(), 3);
    assert_eq!(records.fan_user_ids().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(records.raw_page_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_error_status_marks_row_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getUserRelationList"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let (_dir, pool) = setup_db().await;
    let crawl = fans_crawl(&server);
    let queue = QueueRepository::new(pool.clone());
    let pipeline = Pipeline::new(
        crawl.clone(),
        fetcher(0),
        Arc::new(DieselSink::new(pool.clone())),
    )
    .unwrap()
    .with_queue_store(queue.clone());

    let seeds = seed_requests(&crawl, pipeline.paginator(), &[json!(691067)]);
    let summary = pipeline.run(seeds).await.unwrap();

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.rejected_pages, 1);
    let counts = queue.counts("fans").await.unwrap();
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.pending, 0);
}

#[tokio::test]
async fn test_throttled_plain_text_page_marks_row_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getUserRelationList"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let (_dir, pool) = setup_db().await;
    let crawl = fans_crawl(&server);
    let queue = QueueRepository::new(pool.clone());
    let pipeline = Pipeline::new(
        crawl.clone(),
        fetcher(0),
        Arc::new(DieselSink::new(pool.clone())),
    )
    .unwrap()
    .with_queue_store(queue.clone());

    let seeds = seed_requests(&crawl, pipeline.paginator(), &[json!(691067)]);
    let summary = pipeline.run(seeds).await.unwrap();

    assert_eq!(summary.rejected_pages, 1);
    assert_eq!(summary.decode_failures, 0);
    let counts = queue.counts("fans").await.unwrap();
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.done, 0);
    assert_eq!(
        RecordRepository::new(pool).raw_page_count().await.unwrap(),
        1
    );
}
