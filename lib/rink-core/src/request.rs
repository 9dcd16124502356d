//! Request accumulation and compilation.
//!
//! A [`RequestBuilder`] collects serialized parameter values into five
//! disjoint sections (path, query, header, body, auth). [`RequestBuilder::build`]
//! compiles them, for a given [`Endpoint`], into a transport-ready [`Request`]:
//!
//! ```
//! use rink_core::{ApiDefinition, Endpoint, Method, RequestBuilder};
//! use serde_json::json;
//!
//! let definition = ApiDefinition::from_value(json!({
//!     "base": "https://api.example.test",
//!     "endpoints": { "get_item": { "path": "/items/:id" } }
//! })).expect("definition");
//! let endpoint = Endpoint::new(
//!     "get_item",
//!     &definition.base,
//!     definition.endpoints["get_item"].clone(),
//! );
//!
//! let request = RequestBuilder::new()
//!     .add_path_param("id", json!("42").into())
//!     .add_query_param("expand", json!("owner").into())
//!     .build(&endpoint)
//!     .expect("compiles");
//!
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(request.full_url().as_str(), "https://api.example.test/items/42?expand=owner");
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    ContentType, Endpoint, Error, HttpClient, Method, PathTemplate, Place, Response, Result,
    WireValue,
};

// ============================================================================
// Builder
// ============================================================================

/// Accumulates serialized parameter values by section.
///
/// Each section is keyed by wire name; adding the same key twice to the same
/// section keeps the last value.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    path: BTreeMap<String, WireValue>,
    query: BTreeMap<String, WireValue>,
    header: BTreeMap<String, WireValue>,
    body: BTreeMap<String, WireValue>,
    auth: BTreeMap<String, WireValue>,
}

impl RequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path placeholder value.
    #[must_use]
    pub fn add_path_param(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.path.insert(name.into(), value);
        self
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn add_query_param(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn add_header_param(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.header.insert(name.into(), value);
        self
    }

    /// Sets a body field.
    #[must_use]
    pub fn add_body_param(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.body.insert(name.into(), value);
        self
    }

    /// Sets a credential.
    #[must_use]
    pub fn add_auth_param(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.auth.insert(name.into(), value);
        self
    }

    /// Adds a value to the section matching `place`.
    #[must_use]
    pub fn with_param(self, place: Place, name: impl Into<String>, value: WireValue) -> Self {
        match place {
            Place::Path => self.add_path_param(name, value),
            Place::Query => self.add_query_param(name, value),
            Place::Header => self.add_header_param(name, value),
            Place::Body => self.add_body_param(name, value),
            Place::Auth => self.add_auth_param(name, value),
        }
    }

    /// Values accumulated for `place`.
    #[must_use]
    pub const fn section(&self, place: Place) -> &BTreeMap<String, WireValue> {
        match place {
            Place::Path => &self.path,
            Place::Query => &self.query,
            Place::Header => &self.header,
            Place::Body => &self.body,
            Place::Auth => &self.auth,
        }
    }

    /// Compiles the sections into a [`Request`] for `endpoint`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingPathParameter`] when a path placeholder has no value
    /// - [`Error::MisplacedFile`] when a file is used outside a multipart body
    /// - [`Error::UnsupportedContentType`] when a body cannot be encoded
    /// - [`Error::InvalidUrl`] when base and path do not form a URL
    pub fn build(self, endpoint: &Endpoint) -> Result<Request> {
        let path = PathTemplate::new(endpoint.path())
            .render(|name| self.path.get(name).and_then(WireValue::to_text))
            .map_err(|name| Error::MissingPathParameter {
                endpoint: endpoint.name().to_string(),
                name: name.to_string(),
            })?;
        let url = url::Url::parse(&endpoint.url(&path))?;

        let content_type = endpoint.content_type();
        let response_type = endpoint.response_type();
        let headers = text_section(self.header, Place::Header)?;
        let query = text_section(self.query, Place::Query)?;
        let auth = text_section(self.auth, Place::Auth)?;
        let body = encode_body(self.body, &content_type, endpoint.declared_response_type())?;

        debug!(
            endpoint = endpoint.name(),
            method = %endpoint.method(),
            %url,
            body = body.kind(),
            "compiled request"
        );

        Ok(Request {
            endpoint: endpoint.name().to_string(),
            method: endpoint.method(),
            url,
            headers,
            query,
            body,
            credentials: (!auth.is_empty()).then_some(Credentials(auth)),
            content_type,
            response_type,
        })
    }

    /// Compiles, sends through `client`, and decodes the response body.
    ///
    /// Nothing is sent when compilation fails.
    ///
    /// # Errors
    ///
    /// Compilation errors from [`RequestBuilder::build`], transport errors from
    /// `client`, [`Error::Http`] for status codes >= 400, and
    /// [`Error::JsonDeserialization`] for unreadable JSON responses.
    pub async fn exec<C>(self, endpoint: &Endpoint, client: &C) -> Result<Value>
    where
        C: HttpClient + ?Sized,
    {
        let request = self.build(endpoint)?;
        let response_type = request.response_type().clone();
        let response = client.execute(request).await?;
        decode_response(response, &response_type)
    }
}

fn text_section(
    section: BTreeMap<String, WireValue>,
    place: Place,
) -> Result<BTreeMap<String, String>> {
    section
        .into_iter()
        .map(|(name, value)| match value.to_text() {
            Some(text) => Ok((name, text)),
            None => Err(Error::MisplacedFile {
                parameter: name,
                place,
            }),
        })
        .collect()
}

fn encode_body(
    fields: BTreeMap<String, WireValue>,
    content_type: &ContentType,
    response_type: Option<&ContentType>,
) -> Result<Body> {
    if fields.is_empty() {
        return Ok(Body::Empty);
    }

    match content_type {
        ContentType::Multipart => Ok(Body::Multipart(fields)),
        ContentType::FormUrlEncoded => text_section(fields, Place::Body).map(Body::Form),
        ContentType::Json => {
            let mut object = Map::new();
            for (name, value) in fields {
                match value {
                    WireValue::Json(value) => {
                        object.insert(name, value);
                    }
                    WireValue::File(_) => {
                        return Err(Error::MisplacedFile {
                            parameter: name,
                            place: Place::Body,
                        });
                    }
                }
            }
            // Symmetric JSON endpoints get an object, others a pre-serialized payload
            if response_type.is_none_or(|response_type| response_type == content_type) {
                Ok(Body::Json(object))
            } else {
                Ok(Body::Raw(serde_json::to_string(&object)?))
            }
        }
        ContentType::Other(other) => Err(Error::UnsupportedContentType(other.clone())),
    }
}

/// Turn a transport response into the call result.
///
/// # Errors
///
/// [`Error::Http`] (with the body) for status codes >= 400, or a JSON
/// deserialization error when a JSON response cannot be parsed.
pub fn decode_response(response: Response<Bytes>, response_type: &ContentType) -> Result<Value> {
    let status = response.status();
    if status >= 400 {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("error status");
        let body = response.into_body();
        return Err(if body.is_empty() {
            Error::http(status, reason)
        } else {
            Error::http_with_body(status, reason, body)
        });
    }

    let body = response.into_body();
    if body.is_empty() {
        return Ok(Value::Null);
    }
    match response_type {
        ContentType::Json => crate::from_json(&body),
        _ => Ok(Value::String(String::from_utf8_lossy(&body).into_owned())),
    }
}

// ============================================================================
// Compiled request
// ============================================================================

/// Body of a compiled request.
#[derive(Debug, Default)]
pub enum Body {
    /// No body fields were supplied.
    #[default]
    Empty,
    /// `multipart/form-data` fields; files are read by the transport.
    Multipart(BTreeMap<String, WireValue>),
    /// `application/x-www-form-urlencoded` fields.
    Form(BTreeMap<String, String>),
    /// A JSON object.
    Json(Map<String, Value>),
    /// A pre-serialized payload.
    Raw(String),
}

impl Body {
    /// Short name of the body encoding.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Multipart(_) => "multipart",
            Self::Form(_) => "form",
            Self::Json(_) => "json",
            Self::Raw(_) => "raw",
        }
    }

    /// Returns `true` if there is nothing to send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Credentials collected from `auth` parameters, kept apart from headers,
/// query and body. The transport decides how to present them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    /// Single credential by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// All credentials.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Bearer token (`bearer`).
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.get("bearer")
    }

    /// User and optional password (`user`/`username`, `pass`/`password`).
    #[must_use]
    pub fn basic(&self) -> Option<(&str, Option<&str>)> {
        let user = self.get("user").or_else(|| self.get("username"))?;
        let password = self.get("pass").or_else(|| self.get("password"));
        Some((user, password))
    }
}

impl FromIterator<(String, String)> for Credentials {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A compiled, transport-ready request.
#[derive(Debug)]
pub struct Request {
    endpoint: String,
    method: Method,
    url: url::Url,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Body,
    credentials: Option<Credentials>,
    content_type: ContentType,
    response_type: ContentType,
}

impl Request {
    /// Name of the endpoint this request was compiled for.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Base URL joined with the interpolated path, without query.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// URL including the query parameters.
    #[must_use]
    pub fn full_url(&self) -> url::Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Query parameters.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Credentials, if any `auth` parameter was supplied.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Content type declared by the endpoint.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Response type expected by the endpoint.
    #[must_use]
    pub const fn response_type(&self) -> &ContentType {
        &self.response_type
    }

    /// Consume into the body, e.g. to stream its files.
    #[must_use]
    pub fn into_body(self) -> Body {
        self.body
    }
}
