//! Exchange logging.
//!
//! Every compiled request is logged inside an `endpoint_call` span carrying
//! the endpoint name, method and URL without its query. The outcome is logged
//! with status, body size and latency. Header and query values that carry
//! secrets are redacted.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{Error, Request, Response, Result};

const REDACTED: &str = "<redacted>";

/// How much of each exchange is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Headers (redacted), query pairs and body kind at debug level.
    Debug,
    /// One line per request and per outcome.
    #[default]
    Info,
}

/// Layer producing [`Logging`] services.
///
/// # Example
///
/// ```
/// use rink::HyperClient;
/// use rink::middleware::LoggingLayer;
///
/// let client = HyperClient::builder().layer(LoggingLayer::debug()).build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Summary logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detailed logging.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Logs compiled requests and their outcome.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Wrap `inner` with summary logging.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

fn is_secret(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "authorization"
        || ["token", "api-key", "api_key", "apikey", "secret", "password"]
            .iter()
            .any(|marker| name.contains(marker))
}

fn redacted<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> Vec<(String, String)> {
    pairs
        .map(|(name, value)| {
            let value = if is_secret(name) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Header pairs with secret values replaced.
fn redacted_headers(request: &Request) -> Vec<(String, String)> {
    redacted(request.headers().iter())
}

/// Query pairs with secret values replaced.
fn redacted_query(request: &Request) -> Vec<(String, String)> {
    redacted(request.query().iter())
}

fn log_request(level: LogLevel, request: &Request) {
    match level {
        LogLevel::Debug => debug!(
            headers = ?redacted_headers(request),
            query = ?redacted_query(request),
            body = request.body().kind(),
            content_type = %request.content_type(),
            credentials = request.credentials().is_some(),
            "sending request"
        ),
        LogLevel::Info => info!("sending request"),
    }
}

fn log_outcome(result: &Result<Response<Bytes>>, started: Instant) {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(response) if response.is_success() => info!(
            status = response.status(),
            bytes = response.body().len(),
            content_type = response.header("content-type").unwrap_or_default(),
            elapsed_ms,
            "response received"
        ),
        Ok(response) => warn!(
            status = response.status(),
            bytes = response.body().len(),
            elapsed_ms,
            "error status received"
        ),
        Err(err) => warn!(error = %err, kind = ?err.kind(), elapsed_ms, "request failed"),
    }
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = info_span!(
            "endpoint_call",
            endpoint = request.endpoint(),
            method = %request.method(),
            url = %request.url(),
        );
        let level = self.level;

        // The ready service goes into the future; a fresh clone stays behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                log_request(level, &request);
                let started = Instant::now();
                let result = inner.call(request).await;
                log_outcome(&result, started);
                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use rink_core::{Endpoint, EndpointDefinition, RequestBuilder, WireValue};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    fn compiled(builder: RequestBuilder) -> Request {
        let endpoint = Endpoint::new(
            "ping",
            "https://api.example.test",
            EndpointDefinition::default(),
        );
        builder.build(&endpoint).expect("compiles")
    }

    #[test]
    fn layer_levels() {
        assert_eq!(LoggingLayer::new().level(), LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level(), LogLevel::Debug);
    }

    #[test]
    fn secret_headers_are_redacted() {
        let request = compiled(
            RequestBuilder::new()
                .add_header_param("X-HockeyAppToken", WireValue::Json(json!("4567abcd")))
                .add_header_param("Authorization", WireValue::Json(json!("Bearer t")))
                .add_header_param("X-Trace", WireValue::Json(json!("42"))),
        );

        let headers = redacted_headers(&request);

        assert!(headers.contains(&("X-HockeyAppToken".to_string(), REDACTED.to_string())));
        assert!(headers.contains(&("Authorization".to_string(), REDACTED.to_string())));
        assert!(headers.contains(&("X-Trace".to_string(), "42".to_string())));
    }

    #[test]
    fn secret_query_values_are_redacted() {
        let request = compiled(
            RequestBuilder::new()
                .add_query_param("api_token", WireValue::Json(json!("SECRET123")))
                .add_query_param("page", WireValue::Json(json!(2))),
        );

        let query = redacted_query(&request);

        assert!(query.contains(&("api_token".to_string(), REDACTED.to_string())));
        assert!(query.contains(&("page".to_string(), "2".to_string())));
    }

    /// Log output captured from a fmt subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn logged_lines_never_carry_query_secrets() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let ok = tower::service_fn(|_: Request| async {
            Ok::<_, Error>(Response::new(200, HashMap::new(), Bytes::new()))
        });
        let request = compiled(
            RequestBuilder::new()
                .add_query_param("api_token", WireValue::Json(json!("SECRET123")))
                .add_header_param("X-HockeyAppToken", WireValue::Json(json!("4567abcd"))),
        );

        LoggingLayer::debug()
            .layer(ok)
            .oneshot(request)
            .await
            .expect("response");

        let output = String::from_utf8(captured.0.lock().expect("lock").clone()).expect("utf-8");
        assert!(output.contains("url=https://api.example.test/"));
        assert!(output.contains("sending request"));
        assert!(!output.contains("SECRET123"));
        assert!(!output.contains("4567abcd"));
    }

    #[tokio::test]
    async fn logging_passes_response_through() {
        let echo = tower::service_fn(|request: Request| async move {
            Ok::<_, Error>(Response::new(
                201,
                HashMap::new(),
                Bytes::from(request.endpoint().to_string()),
            ))
        });

        let response = LoggingLayer::debug()
            .layer(echo)
            .oneshot(compiled(RequestBuilder::new()))
            .await
            .expect("response");

        assert_eq!(response.status(), 201);
        assert_eq!(response.body().as_ref(), b"ping");
    }

    #[tokio::test]
    async fn logging_passes_errors_through() {
        let failing =
            tower::service_fn(|_: Request| async { Err::<Response<Bytes>, _>(Error::Timeout) });

        let err = Logging::new(failing)
            .oneshot(compiled(RequestBuilder::new()))
            .await
            .expect_err("fails");

        assert!(err.is_timeout());
    }
}
