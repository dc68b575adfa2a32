//! Resilient request executor.

use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::time::{Sleeper, TokioSleeper};

use super::{
    AttemptError, FetchError, HttpClient, HttpError, HttpRequest, HttpResponse, RetryError,
    RetryPolicy, Verdict, retry_with_backoff,
};

/// A JSON API call: URL, headers, optional JSON body and attempt budget.
///
/// The method is derived from the body: a request with a body is sent as
/// POST, one without as GET.
///
/// # Example
///
/// ```
/// use meteo_cooloff::fetch::ApiRequest;
/// use url::Url;
///
/// let request = ApiRequest::new(Url::parse("https://example.com/api").unwrap())
///     .with_json_body(serde_json::json!({"q": 1}))
///     .with_max_attempts(3);
///
/// assert_eq!(request.method(), http::Method::POST);
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    url: Url,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    max_attempts: Option<u32>,
}

impl ApiRequest {
    /// Creates a GET request with no headers.
    ///
    /// The attempt budget falls back to the executor's [`RetryPolicy`].
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            body: None,
            max_attempts: None,
        }
    }

    /// Replaces the header mapping.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Inserts a single header, replacing any existing value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches a JSON body, which turns the request into a POST.
    #[must_use]
    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Overrides the executor's attempt budget for this request.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(max_attempts >= 1, "max_attempts must be at least 1");
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the configured headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Returns the per-request attempt budget override, if any.
    #[must_use]
    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// GET without a body, POST with one.
    #[must_use]
    pub fn method(&self) -> http::Method {
        if self.body.is_some() {
            http::Method::POST
        } else {
            http::Method::GET
        }
    }

    fn to_http(&self) -> Result<HttpRequest, FetchError> {
        let mut request = HttpRequest::new(self.method(), self.url.clone());
        request.headers.clone_from(&self.headers);

        if let Some(body) = &self.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| FetchError::InvalidRequest(format!("unserializable body: {e}")))?;
            request
                .headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            request.body = Some(bytes);
        }

        Ok(request)
    }
}

/// Maps a failed attempt to a retry decision.
///
/// 404 and unbuildable requests are fatal. Every other status and every
/// transport failure is retried.
#[must_use]
pub fn classify(error: &AttemptError) -> Verdict {
    match error {
        AttemptError::Transport(HttpError::Connection(_) | HttpError::Timeout) => Verdict::Retry,
        AttemptError::Transport(HttpError::InvalidRequest(_)) => Verdict::Fatal,
        AttemptError::Status { status, .. } if *status == http::StatusCode::NOT_FOUND => {
            Verdict::Fatal
        }
        AttemptError::Status { .. } => Verdict::Retry,
    }
}

/// Executes [`ApiRequest`]s with retry and exponential backoff, returning
/// the decoded JSON body.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used between attempts (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use meteo_cooloff::fetch::{ApiRequest, ReqwestClient, RequestExecutor};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RequestExecutor::new(ReqwestClient::new());
/// let request = ApiRequest::new(Url::parse("https://example.com/data.json")?);
/// let payload = executor.execute(&request).await?;
/// println!("{payload}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestExecutor<H, S = TokioSleeper> {
    client: H,
    sleeper: S,
    retry_policy: RetryPolicy,
}

impl<H> RequestExecutor<H, TokioSleeper> {
    /// Creates an executor with the default retry policy and [`TokioSleeper`].
    #[must_use]
    pub const fn new(client: H) -> Self {
        Self {
            client,
            sleeper: TokioSleeper,
            retry_policy: RetryPolicy::new(),
        }
    }
}

impl<H, S> RequestExecutor<H, S> {
    /// Sets a custom sleeper for the waits between attempts.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> RequestExecutor<H, S2> {
        RequestExecutor {
            client: self.client,
            sleeper,
            retry_policy: self.retry_policy,
        }
    }

    /// Sets the retry policy used when a request carries no override.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Returns the default retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    fn policy_for(&self, request: &ApiRequest) -> RetryPolicy {
        request
            .max_attempts
            .map_or(self.retry_policy, |n| self.retry_policy.with_max_attempts(n))
    }
}

impl<H: HttpClient, S: Sleeper> RequestExecutor<H, S> {
    /// Sends `request` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] on the first 404, without retrying
    /// - [`FetchError::ConnectionExhausted`] when the last attempt failed at transport level
    /// - [`FetchError::HttpExhausted`] when the last attempt got a non-404 error status
    /// - [`FetchError::Decode`] when a 2xx body is not UTF-8 JSON
    /// - [`FetchError::InvalidRequest`] when the request cannot be built
    pub async fn execute(&self, request: &ApiRequest) -> Result<serde_json::Value, FetchError> {
        let http_request = request.to_http()?;
        let policy = self.policy_for(request);

        tracing::debug!(
            method = %http_request.method,
            url = %http_request.url,
            max_attempts = policy.max_attempts,
            "Sending request"
        );

        let response = retry_with_backoff(&policy, &self.sleeper, classify, |_| {
            self.attempt(&http_request)
        })
        .await
        .map_err(|e| into_fetch_error(e, &http_request.url))?;

        decode_body(&response)
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, AttemptError> {
        let response = self.client.request(request.clone()).await?;

        if response.is_success() {
            return Ok(response);
        }

        Err(AttemptError::Status {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }
}

fn into_fetch_error(error: RetryError<AttemptError>, url: &Url) -> FetchError {
    let attempts = error.attempts();

    match error.into_inner() {
        AttemptError::Transport(HttpError::InvalidRequest(reason)) => {
            FetchError::InvalidRequest(reason)
        }
        AttemptError::Transport(source) => FetchError::ConnectionExhausted { attempts, source },
        AttemptError::Status { status, .. } if status == http::StatusCode::NOT_FOUND => {
            FetchError::NotFound {
                url: url.to_string(),
            }
        }
        AttemptError::Status { status, .. } => FetchError::HttpExhausted { attempts, status },
    }
}

fn decode_body(response: &HttpResponse) -> Result<serde_json::Value, FetchError> {
    let text = std::str::from_utf8(&response.body)
        .map_err(|e| FetchError::Decode(format!("body is not valid UTF-8: {e}")))?;

    serde_json::from_str(text).map_err(|e| FetchError::Decode(format!("invalid JSON: {e}")))
}
