//! Exam crawl tests

use crate::common::{listing_page, mount_page, question_link, question_page, request_count, test_config};
use exam_harvest::crawler::Coordinator;
use exam_harvest::slug::RuleTable;
use exam_harvest::HarvestError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_orders_and_deduplicates_records() {
    let server = MockServer::start().await;

    let t1q1 = question_link("cisco", 101, "200-301", 1, 1);
    let t1q2 = question_link("cisco", 102, "200-301", 1, 2);
    let t1q10 = question_link("cisco", 110, "200-301", 1, 10);
    let t2q1 = question_link("cisco", 201, "200-301", 2, 1);
    let other = question_link("cisco", 301, "350-401", 1, 1);

    mount_page(&server, "/discussions/cisco/", listing_page(&[], Some(2))).await;
    mount_page(
        &server,
        "/discussions/cisco/1",
        listing_page(&[t1q10.clone(), t1q2.clone(), other.clone(), t1q1.clone()], Some(2)),
    )
    .await;
    mount_page(
        &server,
        "/discussions/cisco/2",
        listing_page(&[t2q1.clone(), t1q2.clone()], Some(2)),
    )
    .await;

    for (link, topic, question) in [(&t1q1, 1, 1), (&t1q2, 1, 2), (&t1q10, 1, 10), (&t2q1, 2, 1)] {
        mount_page(&server, link, question_page("200-301", topic, question)).await;
    }

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let outcome = coordinator.crawl_exam("cisco", "200-301").await.unwrap();

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.failed_pages, 0);
    assert_eq!(outcome.matched_links, 4);
    assert_eq!(outcome.failed_records, 0);

    let titles: Vec<&str> = outcome.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Exam 200-301 topic 1 question 1 discussion",
            "Exam 200-301 topic 1 question 2 discussion",
            "Exam 200-301 topic 1 question 10 discussion",
            "Exam 200-301 topic 2 question 1 discussion",
        ]
    );

    let first = &outcome.records[0];
    assert_eq!(first.body, "Question 1 body.");
    assert_eq!(first.correct_answers, vec!['B']);
    assert_eq!(first.comments[0].selected_answer, Some('B'));
    assert_eq!(first.source_link, format!("{}{}", server.uri(), t1q1));

    // The other exam's question was never fetched, the duplicate only once
    assert_eq!(request_count(&server, &other).await, 0);
    assert_eq!(request_count(&server, &t1q2).await, 1);

    // Two listing pages and four questions
    assert_eq!(coordinator.progress().completed(), 6);
}

#[tokio::test]
async fn test_missing_pagination_means_one_page() {
    let server = MockServer::start().await;
    let link = question_link("acme", 1, "core-100", 1, 1);

    mount_page(&server, "/discussions/acme/", "<html><body>No pager</body></html>".to_string()).await;
    mount_page(&server, "/discussions/acme/1", listing_page(&[link.clone()], None)).await;
    mount_page(&server, &link, question_page("core-100", 1, 1)).await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let outcome = coordinator.crawl_exam("acme", "").await.unwrap();

    assert_eq!(outcome.pages, 1);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(request_count(&server, "/discussions/acme/2").await, 0);
}

#[tokio::test]
async fn test_service_unavailable_is_retried() {
    let server = MockServer::start().await;
    let link = question_link("cisco", 7, "200-301", 1, 7);

    mount_page(&server, "/discussions/cisco/", listing_page(&[], Some(1))).await;
    mount_page(&server, "/discussions/cisco/1", listing_page(&[link.clone()], Some(1))).await;

    Mock::given(method("GET"))
        .and(path(link.as_str()))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, &link, question_page("200-301", 1, 7)).await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let outcome = coordinator.crawl_exam("cisco", "200-301").await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(request_count(&server, &link).await, 3);
}

#[tokio::test]
async fn test_terminal_status_is_not_retried() {
    let server = MockServer::start().await;
    let good = question_link("cisco", 1, "200-301", 1, 1);
    let gone = question_link("cisco", 2, "200-301", 1, 2);

    mount_page(&server, "/discussions/cisco/", listing_page(&[], Some(1))).await;
    mount_page(
        &server,
        "/discussions/cisco/1",
        listing_page(&[good.clone(), gone.clone()], Some(1)),
    )
    .await;
    mount_page(&server, &good, question_page("200-301", 1, 1)).await;

    Mock::given(method("GET"))
        .and(path(gone.as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.debug = true;
    let coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.crawl_exam("cisco", "200-301").await.unwrap();

    assert_eq!(outcome.matched_links, 2);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.failed_records, 1);
    assert_eq!(request_count(&server, &gone).await, 1);
}

#[tokio::test]
async fn test_retries_exhausted_drops_record() {
    let server = MockServer::start().await;
    let link = question_link("cisco", 3, "200-301", 1, 3);

    mount_page(&server, "/discussions/cisco/", listing_page(&[], Some(1))).await;
    mount_page(&server, "/discussions/cisco/1", listing_page(&[link.clone()], Some(1))).await;
    Mock::given(method("GET"))
        .and(path(link.as_str()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.crawler.max_retries = 2;
    let coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.crawl_exam("cisco", "200-301").await.unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.failed_records, 1);
    assert_eq!(request_count(&server, &link).await, 3);
}

#[tokio::test]
async fn test_failed_listing_page_shrinks_result() {
    let server = MockServer::start().await;
    let link = question_link("cisco", 1, "200-301", 1, 1);

    mount_page(&server, "/discussions/cisco/", listing_page(&[], Some(2))).await;
    mount_page(&server, "/discussions/cisco/1", listing_page(&[link.clone()], Some(2))).await;
    mount_page(&server, &link, question_page("200-301", 1, 1)).await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let outcome = coordinator.crawl_exam("cisco", "200-301").await.unwrap();

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.failed_pages, 1);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_oracle_variants_are_grouped() {
    let server = MockServer::start().await;
    let v20 = question_link("oracle", 1, "1z0-1042-20", 1, 1);
    let v23 = question_link("oracle", 2, "1z0-1042-23", 1, 2);
    let other = question_link("oracle", 3, "1z0-1106-1", 1, 1);

    mount_page(&server, "/discussions/oracle/", listing_page(&[], Some(1))).await;
    mount_page(
        &server,
        "/discussions/oracle/1",
        listing_page(&[v20.clone(), v23.clone(), other.clone()], Some(1)),
    )
    .await;
    mount_page(&server, &v20, question_page("1z0-1042-20", 1, 1)).await;
    mount_page(&server, &v23, question_page("1z0-1042-23", 1, 2)).await;

    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();
    let outcome = coordinator.crawl_exam("oracle", "1z0-1042").await.unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(request_count(&server, &other).await, 0);

    let summary = outcome.variant_summary.expect("variants were folded");
    assert_eq!(
        summary.to_string(),
        "Including grouped variants for 1z0-1042: 1z0-1042-20 (1), 1z0-1042-23 (1)"
    );
}

#[tokio::test]
async fn test_empty_rule_table_keeps_variants_apart() {
    let server = MockServer::start().await;
    let v20 = question_link("oracle", 1, "1z0-1042-20", 1, 1);
    let base = question_link("oracle", 2, "1z0-1042", 1, 2);

    mount_page(&server, "/discussions/oracle/", listing_page(&[], Some(1))).await;
    mount_page(
        &server,
        "/discussions/oracle/1",
        listing_page(&[v20.clone(), base.clone()], Some(1)),
    )
    .await;
    mount_page(&server, &v20, question_page("1z0-1042-20", 1, 1)).await;
    mount_page(&server, &base, question_page("1z0-1042", 1, 2)).await;

    let coordinator = Coordinator::new(test_config(&server.uri()))
        .unwrap()
        .with_rules(RuleTable::new());
    let outcome = coordinator.crawl_exam("oracle", "1z0-1042").await.unwrap();

    assert_eq!(outcome.matched_links, 1);
    assert_eq!(outcome.records[0].title, "Exam 1z0-1042 topic 1 question 2 discussion");
    assert!(outcome.variant_summary.is_none());
    assert_eq!(request_count(&server, &v20).await, 0);
}

#[tokio::test]
async fn test_blank_provider_is_rejected() {
    let server = MockServer::start().await;
    let coordinator = Coordinator::new(test_config(&server.uri())).unwrap();

    let result = coordinator.crawl_exam("  ", "200-301").await;
    assert!(matches!(result, Err(HarvestError::InvalidProvider(_))));
}
