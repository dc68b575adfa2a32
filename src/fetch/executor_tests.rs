//! Tests for `RequestExecutor` and `ApiRequest`.

use super::{
    ApiRequest, AttemptError, FetchError, HttpClient, HttpError, HttpRequest, HttpResponse,
    RequestExecutor, RetryPolicy, Verdict, classify,
};
use crate::time::Sleeper;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock HTTP client that returns a configurable sequence of responses.
#[derive(Debug)]
struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockClient {
    fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);
        self.responses.lock().unwrap().remove(0)
    }
}

impl HttpClient for Arc<MockClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}

/// Sleeper that records requested durations without waiting.
#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for Arc<RecordingSleeper> {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn ok(body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::with_status(http::StatusCode::OK, body))
}

fn status(code: u16) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::with_status(
        http::StatusCode::from_u16(code).unwrap(),
        "error",
    ))
}

fn refused() -> Result<HttpResponse, HttpError> {
    Err(HttpError::Connection("connection refused".into()))
}

fn test_url() -> url::Url {
    url::Url::parse("https://example.com/api").unwrap()
}

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

fn executor(
    responses: Vec<Result<HttpResponse, HttpError>>,
) -> (
    RequestExecutor<Arc<MockClient>, Arc<RecordingSleeper>>,
    Arc<MockClient>,
    Arc<RecordingSleeper>,
) {
    let client = Arc::new(MockClient::new(responses));
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = RequestExecutor::new(client.clone()).with_sleeper(sleeper.clone());
    (executor, client, sleeper)
}

mod api_request {
    use super::*;

    #[test]
    fn without_body_is_get() {
        let request = ApiRequest::new(test_url());

        assert_eq!(request.method(), http::Method::GET);
        assert!(request.body().is_none());
        assert!(request.headers().is_empty());
        assert_eq!(request.max_attempts(), None);
    }

    #[test]
    fn with_body_is_post() {
        let request = ApiRequest::new(test_url()).with_json_body(serde_json::json!({"k": "v"}));

        assert_eq!(request.method(), http::Method::POST);
    }

    #[test]
    fn with_max_attempts_sets_override() {
        let request = ApiRequest::new(test_url()).with_max_attempts(3);
        assert_eq!(request.max_attempts(), Some(3));
    }

    #[test]
    #[should_panic(expected = "max_attempts must be at least 1")]
    fn zero_max_attempts_panics() {
        let _ = ApiRequest::new(test_url()).with_max_attempts(0);
    }
}

mod classification {
    use super::*;

    fn status_error(code: u16) -> AttemptError {
        AttemptError::Status {
            status: http::StatusCode::from_u16(code).unwrap(),
            body: None,
        }
    }

    #[test]
    fn not_found_is_fatal() {
        assert_eq!(classify(&status_error(404)), Verdict::Fatal);
    }

    #[test]
    fn other_error_statuses_retry() {
        for code in [400, 401, 403, 408, 429, 500, 502, 503] {
            assert_eq!(classify(&status_error(code)), Verdict::Retry, "status {code}");
        }
    }

    #[test]
    fn transport_failures_retry() {
        let refused = AttemptError::Transport(HttpError::Connection("refused".into()));
        let timeout = AttemptError::Transport(HttpError::Timeout);

        assert_eq!(classify(&refused), Verdict::Retry);
        assert_eq!(classify(&timeout), Verdict::Retry);
    }

    #[test]
    fn invalid_request_is_fatal() {
        let error = AttemptError::Transport(HttpError::InvalidRequest("bad url".into()));
        assert_eq!(classify(&error), Verdict::Fatal);
    }
}

mod execute {
    use super::*;

    #[tokio::test]
    async fn first_success_returns_payload_without_waiting() {
        let (executor, client, sleeper) = executor(vec![ok(r#"{"a":1}"#)]);

        let payload = executor.execute(&ApiRequest::new(test_url())).await.unwrap();

        assert_eq!(payload, serde_json::json!({"a": 1}));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn server_errors_exhaust_budget() {
        let (executor, client, sleeper) = executor(vec![status(500), status(500), status(500)]);
        let request = ApiRequest::new(test_url()).with_max_attempts(3);

        let error = executor.execute(&request).await.unwrap_err();

        match error {
            FetchError::HttpExhausted { attempts, status } => {
                assert_eq!(attempts, 3);
                assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected HttpExhausted, got {other:?}"),
        }
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.delays(), secs(&[1, 2]));
    }

    #[tokio::test]
    async fn not_found_fails_immediately() {
        let (executor, client, sleeper) = executor(vec![status(404), ok("{}")]);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::NotFound { ref url } if url == "https://example.com/api"));
        assert_eq!(error.status(), Some(http::StatusCode::NOT_FOUND));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn not_found_after_retries_stops_retrying() {
        let (executor, client, sleeper) = executor(vec![status(503), status(404), ok("{}")]);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::NotFound { .. }));
        assert_eq!(client.calls(), 2);
        assert_eq!(sleeper.delays(), secs(&[1]));
    }

    #[tokio::test]
    async fn recovers_after_connection_errors() {
        let (executor, client, sleeper) = executor(vec![refused(), refused(), ok("{}")]);

        let payload = executor.execute(&ApiRequest::new(test_url())).await.unwrap();

        assert_eq!(payload, serde_json::json!({}));
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.delays(), secs(&[1, 2]));
    }

    #[tokio::test]
    async fn connection_errors_exhaust_budget() {
        let (executor, client, _) = executor(vec![refused(), Err(HttpError::Timeout)]);
        let request = ApiRequest::new(test_url()).with_max_attempts(2);

        let error = executor.execute(&request).await.unwrap_err();

        assert!(matches!(
            error,
            FetchError::ConnectionExhausted {
                attempts: 2,
                source: HttpError::Timeout
            }
        ));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn timeouts_consume_attempt_budget() {
        let (executor, client, sleeper) = executor(vec![
            Err(HttpError::Timeout),
            Err(HttpError::Timeout),
            Err(HttpError::Timeout),
        ]);
        let request = ApiRequest::new(test_url()).with_max_attempts(3);

        let error = executor.execute(&request).await.unwrap_err();

        assert!(matches!(
            error,
            FetchError::ConnectionExhausted {
                attempts: 3,
                source: HttpError::Timeout
            }
        ));
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.delays(), secs(&[1, 2]));
    }

    #[tokio::test]
    async fn exhaustion_reports_status_of_last_response() {
        let (executor, _, _) = executor(vec![status(500), status(429), status(502)]);
        let request = ApiRequest::new(test_url()).with_max_attempts(3);

        let error = executor.execute(&request).await.unwrap_err();

        assert_eq!(error.status(), Some(http::StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn exhaustion_after_status_then_transport_is_connection_error() {
        let (executor, _, _) = executor(vec![status(500), refused()]);
        let request = ApiRequest::new(test_url()).with_max_attempts(2);

        let error = executor.execute(&request).await.unwrap_err();

        assert!(matches!(error, FetchError::ConnectionExhausted { .. }));
    }

    #[tokio::test]
    async fn cooloff_doubles_regardless_of_failure_kind() {
        let (executor, client, sleeper) = executor(vec![
            refused(),
            status(500),
            Err(HttpError::Timeout),
            status(429),
            ok("[]"),
        ]);

        let payload = executor.execute(&ApiRequest::new(test_url())).await.unwrap();

        assert_eq!(payload, serde_json::json!([]));
        assert_eq!(client.calls(), 5);
        assert_eq!(sleeper.delays(), secs(&[1, 2, 4, 8]));
    }

    #[tokio::test]
    async fn default_budget_is_ten_attempts() {
        let responses = (0..12).map(|_| status(503)).collect();
        let (executor, client, sleeper) = executor(responses);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::HttpExhausted { attempts: 10, .. }));
        assert_eq!(client.calls(), 10);
        assert_eq!(
            sleeper.delays(),
            secs(&[1, 2, 4, 8, 16, 32, 64, 128, 256])
        );
    }

    #[tokio::test]
    async fn executor_policy_applies_without_request_override() {
        let (executor, client, sleeper) = executor(vec![status(500), status(500)]);
        let executor = executor.with_retry_policy(
            RetryPolicy::new()
                .with_max_attempts(2)
                .with_initial_delay(Duration::from_millis(10)),
        );

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::HttpExhausted { attempts: 2, .. }));
        assert_eq!(client.calls(), 2);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(10)]);
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let (executor, client, _) = executor(vec![ok("not json")]);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::Decode(_)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn non_utf8_success_body_is_decode_error() {
        let (executor, _, _) = executor(vec![Ok(HttpResponse::with_status(
            http::StatusCode::OK,
            vec![0xff, 0xfe],
        ))]);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::Decode(ref m) if m.contains("UTF-8")));
    }

    #[tokio::test]
    async fn invalid_request_is_not_retried() {
        let (executor, client, sleeper) = executor(vec![
            Err(HttpError::InvalidRequest("bad".into())),
            ok("{}"),
        ]);

        let error = executor.execute(&ApiRequest::new(test_url())).await.unwrap_err();

        assert!(matches!(error, FetchError::InvalidRequest(_)));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }
}

mod request_shape {
    use super::*;

    #[tokio::test]
    async fn get_sends_headers_and_no_body() {
        let (executor, client, _) = executor(vec![ok("{}")]);
        let request = ApiRequest::new(test_url()).with_header(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/json"),
        );

        executor.execute(&request).await.unwrap();

        let sent = client.captured_requests();
        assert_eq!(sent[0].method, http::Method::GET);
        assert_eq!(sent[0].url.as_str(), "https://example.com/api");
        assert_eq!(sent[0].headers.get(http::header::ACCEPT).unwrap(), "application/json");
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn post_sends_json_body_with_content_type() {
        let (executor, client, _) = executor(vec![ok("{}")]);
        let request = ApiRequest::new(test_url()).with_json_body(serde_json::json!({"city": "Madrid"}));

        executor.execute(&request).await.unwrap();

        let sent = client.captured_requests();
        assert_eq!(sent[0].method, http::Method::POST);
        assert_eq!(
            sent[0].headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: serde_json::Value = serde_json::from_slice(sent[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"city": "Madrid"}));
    }

    #[tokio::test]
    async fn explicit_content_type_is_kept() {
        let (executor, client, _) = executor(vec![ok("{}")]);
        let request = ApiRequest::new(test_url())
            .with_header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/vnd.api+json"),
            )
            .with_json_body(serde_json::json!({}));

        executor.execute(&request).await.unwrap();

        let sent = client.captured_requests();
        assert_eq!(
            sent[0].headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/vnd.api+json"
        );
    }

    #[tokio::test]
    async fn every_attempt_sends_identical_request() {
        let (executor, client, _) = executor(vec![status(500), ok("{}")]);
        let request = ApiRequest::new(test_url()).with_json_body(serde_json::json!({"n": 1}));

        executor.execute(&request).await.unwrap();

        let sent = client.captured_requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, sent[1].body);
        assert_eq!(sent[0].url, sent[1].url);
    }
}
