//! Provider and exam discovery tests

use crate::common::{listing_page, mount_page, question_link, request_count, test_config};
use chrono::Duration;
use exam_harvest::crawler::{Coordinator, ExamCatalog};
use exam_harvest::{DiscoveryCache, HarvestError};
use std::collections::BTreeSet;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exam_index(providers: &[&str]) -> String {
    let anchors: String = providers
        .iter()
        .map(|p| format!(r#"<a href="/exams/{}/">{}</a>"#, p, p))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

fn discussion_index(rows: &[(&str, &str)], declared: Option<u32>) -> String {
    let indicator = declared
        .map(|n| {
            format!(
                r#"<div class="discussion-list-page-indicator"><span>Showing</span> <span>{}</span> categories</div>"#,
                n
            )
        })
        .unwrap_or_default();
    let rows: String = rows
        .iter()
        .map(|(provider, replies)| {
            format!(
                r#"<div class="discussion-row"><a href="/discussions/{}/">{}</a><span class="discussion-stats-replies">{}</span></div>"#,
                provider, provider, replies
            )
        })
        .collect();
    format!("<html><body>{}{}</body></html>", indicator, rows)
}

#[tokio::test]
async fn test_discover_providers_unions_both_sources() {
    let server = MockServer::start().await;
    mount_page(&server, "/exams/", exam_index(&["cisco", "amazon"])).await;
    mount_page(
        &server,
        "/discussions/",
        discussion_index(&[("cisco", "1,200"), ("oracle", "45"), ("dormant", "0")], Some(3)),
    )
    .await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let set = coordinator.discover_providers().await.unwrap();

    assert_eq!(set.providers, vec!["amazon", "cisco", "oracle"]);
    assert!(!set.partial);
    assert_eq!(request_count(&server, "/discussions/").await, 1);
}

#[tokio::test]
async fn test_discover_providers_reports_partial_listing() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/discussions/",
        discussion_index(&[("cisco", "10"), ("oracle", "4")], None),
    )
    .await;

    let mut config = test_config(&server.uri());
    config.crawler.provider_discovery_attempts = 2;
    let coordinator = Coordinator::new(config).unwrap();
    let set = coordinator.discover_providers().await.unwrap();

    // Two providers are well below the floor, so every attempt was used
    assert_eq!(set.providers, vec!["cisco", "oracle"]);
    assert!(set.partial);
    assert_eq!(request_count(&server, "/discussions/").await, 2);
}

#[tokio::test]
async fn test_discover_providers_fails_when_empty() {
    let server = MockServer::start().await;

    let mut config = test_config(&server.uri());
    config.crawler.max_retries = 0;
    let coordinator = Coordinator::new(config).unwrap();

    let result = coordinator.discover_providers().await;
    assert!(matches!(result, Err(HarvestError::NoProviders)));
}

#[tokio::test]
async fn test_discover_providers_stops_once_floor_is_reached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discussions/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(discussion_index(&[("cisco", "10"), ("oracle", "4")], None)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/discussions/",
        discussion_index(&[("amazon", "7"), ("cisco", "10"), ("oracle", "4")], None),
    )
    .await;

    let mut config = test_config(&server.uri());
    config.crawler.provider_discovery_attempts = 3;
    config.crawler.provider_floor = 3;
    let coordinator = Coordinator::new(config).unwrap();
    let set = coordinator.discover_providers().await.unwrap();

    assert_eq!(set.providers, vec!["amazon", "cisco", "oracle"]);
    assert!(!set.partial);
    assert_eq!(request_count(&server, "/discussions/").await, 2);
}

#[tokio::test]
async fn test_discover_providers_keeps_largest_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discussions/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(discussion_index(
            &[("amazon", "7"), ("cisco", "10"), ("oracle", "4")],
            None,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/discussions/", discussion_index(&[("cisco", "10")], None)).await;

    let mut config = test_config(&server.uri());
    config.crawler.provider_discovery_attempts = 2;
    let coordinator = Coordinator::new(config).unwrap();
    let set = coordinator.discover_providers().await.unwrap();

    // The shorter second listing does not replace the first
    assert_eq!(set.providers, vec!["amazon", "cisco", "oracle"]);
    assert!(set.partial);
    assert_eq!(request_count(&server, "/discussions/").await, 2);
}

async fn mount_oracle_site(server: &MockServer) {
    mount_page(
        server,
        "/exams/oracle/",
        r#"<a href="/exams/oracle/1z0-083/">1Z0-083</a><a href="/exams/oracle/1z0-1042-20/">1Z0-1042</a>"#
            .to_string(),
    )
    .await;
    mount_page(server, "/discussions/oracle/", listing_page(&[], Some(2))).await;
    mount_page(
        server,
        "/discussions/oracle/1",
        listing_page(
            &[
                question_link("oracle", 1, "1z0-1042-20", 1, 1),
                question_link("oracle", 2, "1z0-1042-23", 1, 2),
            ],
            Some(2),
        ),
    )
    .await;
    mount_page(
        server,
        "/discussions/oracle/2",
        listing_page(&[question_link("oracle", 3, "1z0-1106-1", 1, 1)], Some(2)),
    )
    .await;
}

#[tokio::test]
async fn test_exam_catalog_merges_official_and_inferred() {
    let server = MockServer::start().await;
    mount_oracle_site(&server).await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let catalog = coordinator.discover_exam_slugs("oracle").await.unwrap();

    assert_eq!(
        catalog,
        ExamCatalog::Exams(vec![
            "1z0-083".to_string(),
            "1z0-1042".to_string(),
            "1z0-1106".to_string(),
        ])
    );
}

#[tokio::test]
async fn test_exam_catalog_fills_and_uses_cache() {
    let server = MockServer::start().await;
    mount_oracle_site(&server).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("discussion_exam_slugs.json");

    let first = Coordinator::new(test_config(&server.uri()))
        .unwrap()
        .with_cache(Some(DiscoveryCache::new(&cache_path, Duration::hours(24))));
    let cold = first.discover_exam_slugs("oracle").await.unwrap();

    let cached = DiscoveryCache::new(&cache_path, Duration::hours(24))
        .get("oracle")
        .expect("inferred slugs were cached");
    let expected: BTreeSet<String> = ["1z0-1042-20", "1z0-1042-23", "1z0-1106-1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(cached, expected);

    let second = Coordinator::new(test_config(&server.uri()))
        .unwrap()
        .with_cache(Some(DiscoveryCache::new(&cache_path, Duration::hours(24))));
    let warm = second.discover_exam_slugs("oracle").await.unwrap();

    assert_eq!(cold, warm);
    assert_eq!(request_count(&server, "/discussions/oracle/1").await, 1);
    assert_eq!(request_count(&server, "/discussions/oracle/2").await, 1);

    // An explicit refresh forces the listing crawl again
    second.refresh_cache("oracle").await;
    second.discover_exam_slugs("oracle").await.unwrap();
    assert_eq!(request_count(&server, "/discussions/oracle/1").await, 2);
}

#[tokio::test]
async fn test_incomplete_inference_is_not_cached() {
    let server = MockServer::start().await;
    mount_page(&server, "/discussions/acme/", listing_page(&[], Some(2))).await;
    mount_page(
        &server,
        "/discussions/acme/1",
        listing_page(&[question_link("acme", 1, "core-100", 1, 1)], Some(2)),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");
    let coordinator = Coordinator::new(test_config(&server.uri()))
        .unwrap()
        .with_cache(Some(DiscoveryCache::new(&cache_path, Duration::hours(24))));

    let catalog = coordinator.discover_exam_slugs("acme").await.unwrap();
    assert_eq!(catalog, ExamCatalog::Exams(vec!["core-100".to_string()]));
    assert!(!cache_path.exists());
}

#[tokio::test]
async fn test_exam_catalog_falls_back_to_all_discussions() {
    let server = MockServer::start().await;

    let mut config = test_config(&server.uri());
    config.crawler.max_retries = 0;
    let coordinator = Coordinator::new(config).unwrap();

    let catalog = coordinator.discover_exam_slugs("ghost").await.unwrap();
    assert!(catalog.is_all_discussions());
    assert_eq!(catalog.selections(), vec!["all-discussions"]);
}

#[tokio::test]
async fn test_exam_catalog_rejects_blank_provider() {
    let server = MockServer::start().await;
    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();

    let result = coordinator.discover_exam_slugs("").await;
    assert!(matches!(result, Err(HarvestError::InvalidProvider(_))));
}
