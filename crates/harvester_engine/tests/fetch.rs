use std::sync::Mutex;
use std::time::Duration;

use harvester_core::{Identifier, PageOutcome, RetryPolicy};
use harvester_engine::{
    fetch_page, resolve_encoding, FailureKind, FetchSettings, Fetcher, HarvestEvent, HarvestSink,
    ReqwestFetcher,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl TestSink {
    fn retries(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, HarvestEvent::Retrying { .. }))
            .count()
    }
}

impl HarvestSink for TestSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        backoff: Duration::from_millis(10),
    }
}

fn id() -> Identifier {
    Identifier::new(1, 3)
}

#[tokio::test]
async fn fetcher_returns_html_and_sends_client_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", "PromptAggregator/1.0 (educational project)"))
        .and(header("accept-language", "ja,en;q=0.9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/doc", server.uri());

    let output = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(output.metadata.url, url);
    assert_eq!(output.metadata.final_url, url);
    assert_eq!(output.metadata.status, 200);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, b"<html>ok</html>");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert!(err.kind.is_not_found());
    assert!(!err.kind.is_retryable());
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).unwrap();
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.kind.is_retryable());
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).unwrap();
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn not_found_short_circuits_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    assert_eq!(report.outcome, PageOutcome::NotFound);
    assert_eq!(report.retries, 0);
    assert_eq!(report.attempts, 1);
    assert_eq!(sink.retries(), 0);
}

#[tokio::test]
async fn server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    match report.outcome {
        PageOutcome::TransientFailure(cause) => assert!(cause.contains("503"), "{cause}"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.attempts, 3);
    assert_eq!(report.retries, 2);
    assert_eq!(sink.retries(), 2);
}

#[tokio::test]
async fn transient_errors_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    assert_eq!(report.outcome, PageOutcome::Fetched("<p>hello</p>".to_string()));
    assert_eq!(report.retries, 1);
}

#[tokio::test]
async fn redirect_is_followed_and_reported() {
    let server = MockServer::start().await;
    let target = format!("{}/prompt/moved.html", server.uri());
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", target.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/prompt/moved.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>moved</p>"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    assert_eq!(report.outcome, PageOutcome::Fetched("<p>moved</p>".to_string()));
    let events = sink.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![HarvestEvent::Redirected { id: id(), to: target }]
    );
}

#[tokio::test]
async fn direct_fetch_reports_no_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>here</p>"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    assert!(sink.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn page_is_decoded_with_forced_encoding_despite_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompt/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<p>café プロンプト</p>".as_bytes().to_vec(),
            "text/html; charset=ISO-8859-1",
        ))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let url = format!("{}/prompt/001.html", server.uri());
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), &url, &policy(), utf8, &sink).await;
    assert_eq!(
        report.outcome,
        PageOutcome::Fetched("<p>café プロンプト</p>".to_string())
    );
}

#[tokio::test]
async fn invalid_url_is_not_retried() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let sink = TestSink::default();
    let utf8 = resolve_encoding("utf-8").unwrap();

    let report = fetch_page(&fetcher, id(), "not a url", &policy(), utf8, &sink).await;
    assert!(matches!(report.outcome, PageOutcome::TransientFailure(_)));
    assert_eq!(report.attempts, 1);
    assert_eq!(sink.retries(), 0);
}
