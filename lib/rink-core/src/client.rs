//! The transport seam.
//!
//! Endpoints compile to a [`Request`]; an [`HttpClient`] sends it. The
//! production implementation lives in the `rink` crate; tests plug in
//! recording stubs.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
///
/// use bytes::Bytes;
/// use rink_core::{HttpClient, Request, Response, Result};
///
/// struct Canned;
///
/// impl HttpClient for Canned {
///     async fn execute(&self, _request: Request) -> Result<Response<Bytes>> {
///         Ok(Response::new(200, HashMap::new(), Bytes::from_static(b"{}")))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Send `request` and return the buffered response.
    ///
    /// Status codes >= 400 are not errors at this level.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Unreadable files in a multipart body
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).execute(request)
    }
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).execute(request)
    }
}
