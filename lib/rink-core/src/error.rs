//! Error types for rink.

use std::path::PathBuf;

use derive_more::{Display, Error, From};

use crate::Place;

// ============================================================================
// Error Kind
// ============================================================================

/// Broad classification of an [`Error`].
///
/// Every kind surfaces to the caller of an endpoint as a failed call; none of
/// them is retried by rink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// The API definition itself is unusable (bad base URL, type cycle, ...).
    #[display("configuration")]
    Configuration,
    /// The call arguments do not match the endpoint declaration.
    #[display("validation")]
    Validation,
    /// A supplied value could not be serialized through its data type.
    #[display("serialization")]
    Serialization,
    /// The transport failed before a response was received.
    #[display("transport")]
    Transport,
    /// The server answered with an error status, or an unreadable body.
    #[display("http")]
    Http,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for rink operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A data type derives from itself, directly or through other types.
    #[display("data type cycle: {}", chain.join(" -> "))]
    #[from(skip)]
    TypeCycle {
        /// Type names in derivation order, ending with the repeated name.
        #[error(not(source))]
        chain: Vec<String>,
    },

    /// The API definition is malformed.
    #[display("invalid API definition: {_0}")]
    #[from(skip)]
    InvalidDefinition(#[error(not(source))] String),

    /// No endpoint with this name is declared.
    #[display("unknown endpoint: {_0}")]
    #[from(skip)]
    UnknownEndpoint(#[error(not(source))] String),

    /// A required parameter was not supplied.
    #[display("missing required parameter `{name}` for endpoint `{endpoint}`")]
    #[from(skip)]
    MissingParameter {
        /// Endpoint name.
        #[error(not(source))]
        endpoint: String,
        /// Declared parameter name.
        #[error(not(source))]
        name: String,
    },

    /// A supplied parameter is not declared by the endpoint.
    #[display("unknown parameter `{name}` for endpoint `{endpoint}`")]
    #[from(skip)]
    UnknownParameter {
        /// Endpoint name.
        #[error(not(source))]
        endpoint: String,
        /// Supplied parameter name.
        #[error(not(source))]
        name: String,
    },

    /// A `:name` placeholder of the path template received no value.
    #[display("no value for path placeholder `:{name}` of endpoint `{endpoint}`")]
    #[from(skip)]
    MissingPathParameter {
        /// Endpoint name.
        #[error(not(source))]
        endpoint: String,
        /// Placeholder name.
        #[error(not(source))]
        name: String,
    },

    /// A value is not one of the keys accepted by an enum data type.
    #[display("invalid enum value `{value}` for parameter `{parameter}`")]
    #[from(skip)]
    InvalidEnumValue {
        /// Parameter name.
        #[error(not(source))]
        parameter: String,
        /// Rejected value, in text form.
        #[error(not(source))]
        value: String,
    },

    /// A file parameter could not be opened.
    #[display("cannot open file `{}` for parameter `{parameter}`: {source}", path.display())]
    #[from(skip)]
    File {
        /// Parameter name.
        #[error(not(source))]
        parameter: String,
        /// Path given by the caller.
        #[error(not(source))]
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A file value was placed somewhere only text can go.
    #[display("file parameter `{parameter}` cannot be sent in the {place} section")]
    #[from(skip)]
    MisplacedFile {
        /// Wire name of the parameter.
        #[error(not(source))]
        parameter: String,
        /// Section the value was placed in.
        #[error(not(source))]
        place: Place,
    },

    /// The endpoint content type has no body encoding.
    #[display("cannot encode a request body as `{_0}`")]
    #[from(skip)]
    UnsupportedContentType(#[error(not(source))] String),

    /// HTTP-level errors (status >= 400).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The compiled request cannot be turned into an HTTP request.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "endpoints.get_item.method").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form body serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid definition error.
    #[must_use]
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeCycle { .. } | Self::InvalidDefinition(_) | Self::UnknownEndpoint(_) => {
                ErrorKind::Configuration
            }
            Self::MissingParameter { .. }
            | Self::UnknownParameter { .. }
            | Self::MissingPathParameter { .. }
            | Self::MisplacedFile { .. }
            | Self::UnsupportedContentType(_)
            | Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::InvalidEnumValue { .. }
            | Self::File { .. }
            | Self::JsonSerialization(_)
            | Self::FormSerialization(_) => ErrorKind::Serialization,
            Self::Connection(_) | Self::Tls(_) | Self::Timeout | Self::InvalidUrl(_) => {
                ErrorKind::Transport
            }
            Self::Http { .. } | Self::JsonDeserialization { .. } => ErrorKind::Http,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the call was rejected before reaching the transport
    /// because its arguments do not fit the endpoint.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}
