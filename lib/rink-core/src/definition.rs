//! Declarative API definitions.
//!
//! An [`ApiDefinition`] describes an HTTP API as data: a base URL, a catalog of
//! named data types and a catalog of endpoints with their parameters. It is
//! usually loaded once from JSON (or YAML with the `yaml` feature):
//!
//! ```
//! use rink_core::{ApiDefinition, Method, Place};
//!
//! let definition = ApiDefinition::from_json(br#"{
//!     "name": "items",
//!     "base": "https://api.example.test",
//!     "endpoints": {
//!         "get_item": {
//!             "path": "/items/:id",
//!             "params": { "id": { "required": true, "place": "path" } }
//!         }
//!     }
//! }"#).expect("valid definition");
//!
//! let endpoint = &definition.endpoints["get_item"];
//! assert_eq!(endpoint.method, None);
//! assert_eq!(endpoint.params["id"].place, Some(Place::Path));
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{ContentType, Method, Place, Result};

/// Values supplied to an endpoint call, keyed by declared parameter name.
pub type Params = BTreeMap<String, Value>;

/// Build [`Params`] from name/value pairs.
///
/// ```
/// let params = rink_core::params([("token", "4567abcd"), ("rights", "full_access")]);
/// assert_eq!(params["rights"], "full_access");
/// ```
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// The whole description of an API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    /// Human readable API name.
    #[serde(default)]
    pub name: String,
    /// URL prefix every endpoint path is appended to.
    pub base: String,
    /// API version label.
    #[serde(default)]
    pub version: Option<String>,
    /// Endpoint-shaped defaults merged under every endpoint.
    #[serde(default)]
    pub defaults: EndpointDefinition,
    /// Named data types; a type may derive from another through its `type`.
    #[serde(default)]
    pub data_types: BTreeMap<String, TypeDefinition>,
    /// Declared endpoints by name.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointDefinition>,
}

impl ApiDefinition {
    /// Parse a definition from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::JsonDeserialization`] with the path of the
    /// offending field.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        crate::from_json(bytes)
    }

    /// Build a definition from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_path_to_error::deserialize(value).map_err(|e| {
            crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
        })
    }

    /// Parse a definition from YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(text: &str) -> Result<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(text);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            crate::Error::invalid_definition(format!("{}: {}", e.path(), e.inner()))
        })
    }
}

/// Declaration of one endpoint; also the shape of [`ApiDefinition::defaults`].
///
/// Every field is optional so that defaults can be layered under it with
/// [`EndpointDefinition::with_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
    /// Path template with `:name` placeholders.
    pub path: Option<String>,
    /// HTTP method, GET when absent.
    pub method: Option<Method>,
    /// Request body encoding, `multipart/form-data` when absent.
    pub content_type: Option<ContentType>,
    /// Expected response media type, `application/json` when absent.
    pub response_type: Option<ContentType>,
    /// Declared parameters by name.
    #[serde(default)]
    pub params: BTreeMap<String, ParameterDefinition>,
    /// Free-form description.
    pub description: Option<String>,
}

impl EndpointDefinition {
    /// Layer `defaults` under this definition.
    ///
    /// Fields set here win; missing fields are taken from `defaults`. Parameters
    /// merge by name, and a parameter declared here replaces the default
    /// parameter of the same name as a whole.
    #[must_use]
    pub fn with_defaults(&self, defaults: &Self) -> Self {
        let mut params = defaults.params.clone();
        params.extend(
            self.params
                .iter()
                .map(|(name, param)| (name.clone(), param.clone())),
        );

        Self {
            path: self.path.clone().or_else(|| defaults.path.clone()),
            method: self.method.or(defaults.method),
            content_type: self
                .content_type
                .clone()
                .or_else(|| defaults.content_type.clone()),
            response_type: self
                .response_type
                .clone()
                .or_else(|| defaults.response_type.clone()),
            params,
            description: self
                .description
                .clone()
                .or_else(|| defaults.description.clone()),
        }
    }
}

/// A data type reference: a built-in kind or a catalog name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TypeDefinition {
    /// `scalar`, `enum`, `file`, or the name of a catalog entry.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Accepted inputs and their wire values, for enums.
    #[serde(default)]
    pub values: Option<BTreeMap<String, Value>>,
}

impl TypeDefinition {
    /// Reference a type by name.
    #[must_use]
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            values: None,
        }
    }
}

/// Declaration of one endpoint parameter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Data type of the parameter.
    #[serde(flatten)]
    pub data_type: TypeDefinition,
    /// Whether callers must supply the parameter.
    #[serde(default)]
    pub required: bool,
    /// Name on the wire, when it differs from the declared name.
    pub internal_name: Option<String>,
    /// Explicit placement; derived from the endpoint content type when absent.
    pub place: Option<Place>,
    /// Free-form description.
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    fn hockeyapp() -> ApiDefinition {
        ApiDefinition::from_value(json!({
            "name": "HockeyApp",
            "base": "https://rink.hockeyapp.net/api/2",
            "version": "2",
            "defaults": {
                "contentType": "application/x-www-form-urlencoded",
                "params": {
                    "token": { "required": true, "place": "header", "internalName": "X-HockeyAppToken" }
                }
            },
            "dataTypes": {
                "rights": { "type": "enum", "values": { "upload": 0, "full_access": 2 } }
            },
            "endpoints": {
                "post_auth_tokens": {
                    "path": "/auth_tokens",
                    "method": "POST",
                    "params": { "rights": { "type": "rights" } }
                },
                "get_auth_tokens": { "path": "/auth_tokens", "description": "List tokens" }
            }
        }))
        .expect("valid definition")
    }

    #[test]
    fn definition_from_value() {
        let definition = hockeyapp();
        check!(definition.name == "HockeyApp");
        check!(definition.version.as_deref() == Some("2"));
        check!(definition.endpoints.len() == 2);

        let rights = &definition.data_types["rights"];
        check!(rights.type_name.as_deref() == Some("enum"));
        let_assert!(Some(values) = &rights.values);
        check!(values["full_access"] == json!(2));

        let post = &definition.endpoints["post_auth_tokens"];
        check!(post.method == Some(Method::Post));
        check!(post.params["rights"].data_type == TypeDefinition::named("rights"));
        check!(!post.params["rights"].required);
    }

    #[test]
    fn definition_from_json_reports_path() {
        let err = ApiDefinition::from_json(
            br#"{"base": "https://x.test", "endpoints": {"a": {"method": "FETCH"}}}"#,
        )
        .expect_err("unknown method");
        let msg = err.to_string();
        check!(msg.contains("endpoints.a.method"), "unexpected message: {msg}");
        check!(msg.contains("FETCH"));
    }

    #[test]
    fn definition_requires_base() {
        let result = ApiDefinition::from_value(json!({ "name": "no base" }));
        check!(result.is_err());
    }

    #[test]
    fn endpoint_with_defaults() {
        let definition = hockeyapp();
        let endpoint = definition.endpoints["post_auth_tokens"].with_defaults(&definition.defaults);

        check!(endpoint.method == Some(Method::Post));
        check!(endpoint.content_type == Some(ContentType::FormUrlEncoded));
        check!(endpoint.params.len() == 2);
        check!(endpoint.params["token"].internal_name.as_deref() == Some("X-HockeyAppToken"));
    }

    #[test]
    fn endpoint_settings_win_over_defaults() {
        let defaults = EndpointDefinition {
            method: Some(Method::Post),
            content_type: Some(ContentType::Json),
            params: BTreeMap::from([(
                "token".to_string(),
                ParameterDefinition {
                    required: true,
                    place: Some(Place::Header),
                    ..ParameterDefinition::default()
                },
            )]),
            ..EndpointDefinition::default()
        };
        let endpoint = EndpointDefinition {
            method: Some(Method::Delete),
            params: BTreeMap::from([(
                "token".to_string(),
                ParameterDefinition {
                    place: Some(Place::Query),
                    ..ParameterDefinition::default()
                },
            )]),
            ..EndpointDefinition::default()
        };

        let merged = endpoint.with_defaults(&defaults);
        check!(merged.method == Some(Method::Delete));
        check!(merged.content_type == Some(ContentType::Json));
        // The endpoint's parameter replaces the default one entirely
        check!(merged.params["token"].place == Some(Place::Query));
        check!(!merged.params["token"].required);
    }

    #[test]
    fn params_helper() {
        let params = params([("id", json!(42)), ("name", json!("x"))]);
        check!(params.len() == 2);
        check!(params["id"] == json!(42));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn definition_from_yaml() {
        let definition = ApiDefinition::from_yaml(
            "name: items\nbase: https://api.example.test\nendpoints:\n  get_item:\n    path: /items/:id\n    params:\n      id: { required: true, place: path }\n",
        )
        .expect("valid yaml");
        check!(definition.endpoints["get_item"].params["id"].required);
    }
}
