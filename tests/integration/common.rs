//! Shared fixtures for the integration tests

use exam_harvest::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration pointed at the mock server with short delays
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.cache.enabled = false;
    config.crawler.requests_per_second = 1000.0;
    config.crawler.initial_backoff_ms = 10;
    config.crawler.max_jitter_ms = 0;
    config.crawler.provider_discovery_pause_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config
}

/// Site-relative discussion link for one question
pub fn question_link(provider: &str, id: u32, exam: &str, topic: u32, question: u32) -> String {
    format!(
        "/discussions/{}/view/{}-exam-{}-topic-{}-question-{}-discussion/",
        provider, id, exam, topic, question
    )
}

/// A listing page holding the given links and an optional page count
pub fn listing_page(links: &[String], total_pages: Option<u32>) -> String {
    let indicator = match total_pages {
        Some(total) => format!(
            r#"<div class="discussion-list-page-indicator">Page <strong>1</strong> of <strong>{}</strong></div>"#,
            total
        ),
        None => String::new(),
    };

    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<div class="discussion-header"><a href="{}">Question</a></div>"#, link))
        .collect();

    format!("<html><body>{}{}</body></html>", indicator, anchors)
}

/// A question page whose title names its topic and question
pub fn question_page(exam: &str, topic: u32, question: u32) -> String {
    format!(
        r#"<html><body>
        <h1>Exam {exam} topic {topic} question {question} discussion</h1>
        <div class="question-discussion-header">Question #: {question}
	Topic #: {topic}</div>
        <div class="card-text">Question {question} body. Suggested Answer: B</div>
        <ul>
          <li class="multi-choice-item">A. first</li>
          <li class="multi-choice-item">B. second</li>
        </ul>
        <span class="correct-answer">B</span>
        <div class="discussion-meta-data"><i>Jan 1, 2024</i></div>
        <div class="discussion-container">
          <div class="comment-container">
            <h5 class="comment-username">tester</h5>
            <div class="comment-selected-answers">Selected Answer: <strong>B</strong></div>
            <div class="comment-content">B for sure</div>
          </div>
        </div>
        </body></html>"#,
        exam = exam,
        topic = topic,
        question = question
    )
}

/// Serves `body` with status 200 for GET `route`
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Number of requests the server received for `route`
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
