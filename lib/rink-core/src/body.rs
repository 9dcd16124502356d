//! Content types and body serialization utilities.

use std::fmt;

use bytes::Bytes;
use serde::Deserialize;

use crate::Result;

/// Media type of a request body or of an expected response.
///
/// Only the essence (`type/subtype`) is kept; parameters such as
/// `; charset=utf-8` are dropped and the name is lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ContentType {
    /// `multipart/form-data`, the default for endpoints.
    Multipart,
    /// `application/x-www-form-urlencoded`.
    FormUrlEncoded,
    /// `application/json`, the default response type.
    Json,
    /// Any other media type.
    Other(String),
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Multipart => "multipart/form-data",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::Json => "application/json",
            Self::Other(other) => other,
        }
    }

    /// Returns `true` for the two form encodings, whose fields live in the body.
    #[must_use]
    pub const fn is_form(&self) -> bool {
        matches!(self, Self::Multipart | Self::FormUrlEncoded)
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        let essence = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "multipart/form-data" => Self::Multipart,
            "application/x-www-form-urlencoded" => Self::FormUrlEncoded,
            "application/json" => Self::Json,
            _ => Self::Other(essence),
        }
    }
}

impl From<String> for ContentType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use rink_core::to_json;
///
/// let bytes = to_json(&serde_json::json!({"rights": 0})).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"rights":0}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use rink_core::to_form;
///
/// let fields = BTreeMap::from([("release_type", "2"), ("status", "1")]);
/// let bytes = to_form(&fields).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"release_type=2&status=1");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "endpoints.upload.method").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Multipart.as_str(), "multipart/form-data");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::Other("text/plain".to_string()).as_str(),
            "text/plain"
        );
    }

    #[test]
    fn content_type_parse_essence() {
        assert_eq!(
            ContentType::from("application/json; charset=utf-8"),
            ContentType::Json
        );
        assert_eq!(
            ContentType::from("Multipart/Form-Data"),
            ContentType::Multipart
        );
        assert_eq!(
            ContentType::from("text/XML"),
            ContentType::Other("text/xml".to_string())
        );
    }

    #[test]
    fn content_type_is_form() {
        assert!(ContentType::Multipart.is_form());
        assert!(ContentType::FormUrlEncoded.is_form());
        assert!(!ContentType::Json.is_form());
        assert!(!ContentType::Other("text/plain".to_string()).is_form());
    }

    #[test]
    fn content_type_deserialize() {
        let ct: ContentType =
            serde_json::from_str(r#""application/x-www-form-urlencoded""#).expect("deserialize");
        assert_eq!(ct, ContentType::FormUrlEncoded);
    }

    #[test]
    fn to_form_serialize() {
        let fields = std::collections::BTreeMap::from([
            ("notes", "fixed crash on launch"),
            ("notify", "1"),
        ]);
        let bytes = to_form(&fields).expect("serialize");
        assert_eq!(bytes.as_ref(), b"notes=fixed+crash+on+launch&notify=1");
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Endpoint {
            #[allow(dead_code)]
            path: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Definition {
            #[allow(dead_code)]
            endpoint: Endpoint,
        }

        let result: Result<Definition> = from_json(br#"{"endpoint":{}}"#);
        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("endpoint"), "Expected path in error: {msg}");
        assert!(msg.contains("path"), "Expected field in error: {msg}");
    }
}
