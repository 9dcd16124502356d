//! Responses returned by an [`HttpClient`](crate::HttpClient).

use std::collections::HashMap;

use bytes::Bytes;

use crate::ContentType;

/// What the transport hands back: status, headers and the buffered body.
///
/// Header names are stored as the transport received them; hyper lowercases
/// them.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Wrap what the transport received.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// All headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value; the name matches case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Media type announced by the server, without parameters.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.header("content-type").map(ContentType::from)
    }

    /// Body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into the body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    const fn class(&self) -> u16 {
        self.status / 100
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.class() == 2
    }

    /// 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.class() == 4
    }

    /// 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.class() == 5
    }
}

impl Response<Bytes> {
    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
    /// with the path of the offending field.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Body as text; invalid UTF-8 is replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
