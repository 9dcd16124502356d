//! The hyper transport and its middleware stack.

use std::collections::HashMap;
use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::trace;

use crate::{
    Error, Request, Response, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
    encode::encode,
};

#[cfg(feature = "middleware-logging")]
use crate::middleware::LoggingLayer;
#[cfg(feature = "middleware-concurrency")]
use tower::limit::ConcurrencyLimitLayer;

/// Type-erased middleware stack: compiled request in, buffered response out.
pub type BoxedService = BoxCloneService<Request, Response<Bytes>, Error>;

/// Future returned by [`HyperClient`] as a tower service.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type Wrap = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// `BoxCloneService` is not `Sync`; each call works on its own clone.
#[derive(Clone)]
struct SharedStack(Arc<Mutex<BoxedService>>);

impl SharedStack {
    fn new(service: BoxedService) -> Self {
        Self(Arc::new(Mutex::new(service)))
    }

    fn dispatch(&self, request: Request) -> ServiceFuture {
        let service = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Box::pin(service.oneshot(request))
    }
}

/// Bottom of the stack: encodes the request and performs the exchange.
#[derive(Clone)]
struct Transport {
    hyper: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl Transport {
    fn new(config: ClientConfig) -> Self {
        let hyper = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));
        Self { hyper, config }
    }

    async fn exchange(self, request: Request) -> Result<Response<Bytes>> {
        let wire = encode(request, &self.config).await?;
        trace!(method = %wire.method(), uri = %wire.uri(), "exchange");

        // One deadline covers the response head and the whole body
        let exchange = async {
            let response = self
                .hyper
                .request(wire)
                .await
                .map_err(|err| transport_error(&err))?;

            let status = response.status().as_u16();
            let headers: HashMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    let value = value.to_str().ok()?;
                    Some((name.to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|err| Error::connection(err.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

impl Service<Request> for Transport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        Box::pin(self.clone().exchange(request))
    }
}

/// Classify a hyper failure; TLS problems only show up in the source chain.
fn transport_error(err: &hyper_util::client::legacy::Error) -> Error {
    let mut message = err.to_string();
    let mut is_tls = false;

    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        is_tls |= cause.is::<rustls::Error>()
            || cause
                .downcast_ref::<std::io::Error>()
                .and_then(std::io::Error::get_ref)
                .is_some_and(|inner| inner.is::<rustls::Error>());
        source = cause.source();
    }

    if is_tls {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// [`HttpClient`](rink_core::HttpClient) over hyper-util: pooled
/// connections, rustls, and a tower middleware stack.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rink::HyperClient;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(10))
///     .user_agent("hockeyapp-cli/2.0")
///     .with_logging()
///     .build();
/// assert_eq!(client.config().timeout, Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct HyperClient {
    stack: SharedStack,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Default configuration, no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Custom configuration, no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        HyperClientBuilder {
            config: config.into(),
            layers: Vec::new(),
        }
        .build()
    }

    /// Builder with the default configuration.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl rink_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.stack.dispatch(request).await
    }
}

impl Service<Request> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // Readiness of the stack is awaited inside `dispatch`
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.stack.dispatch(request)
    }
}

/// Builder for [`HyperClient`].
///
/// The first layer added is the outermost: it sees the request first and
/// the response last.
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Wrap>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Exchange deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Connection deadline.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Idle connections kept per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Idle connection lifetime.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a tower layer.
    ///
    /// ```
    /// use rink::HyperClient;
    /// use rink::middleware::ConcurrencyLimitLayer;
    ///
    /// let client = HyperClient::builder()
    ///     .layer(ConcurrencyLimitLayer::new(4))
    ///     .build();
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Same as [`HyperClientBuilder::layer`].
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layer(layer)
    }

    /// Log every exchange at info level.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every exchange with redacted headers and body kind.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// At most `max` exchanges in flight; others wait.
    #[cfg(feature = "middleware-concurrency")]
    #[must_use]
    pub fn with_concurrency_limit(self, max: usize) -> Self {
        self.layer(ConcurrencyLimitLayer::new(max))
    }

    /// Assemble the stack.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();

        let transport = BoxCloneService::new(Transport::new(config.clone()));
        let service = self
            .layers
            .iter()
            .rev()
            .fold(transport, |service, wrap| wrap(service));

        HyperClient {
            stack: SharedStack::new(service),
            config,
        }
    }
}
