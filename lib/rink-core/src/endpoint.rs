//! Endpoints: named, parameterized HTTP operations.

use serde_json::Value;
use tracing::debug;

use crate::{
    ContentType, EndpointDefinition, Error, HttpClient, Method, Parameter, Params, Place,
    RequestBuilder, Result, TypeResolver,
};

/// One endpoint of an API, with defaults already merged into its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    name: String,
    base: String,
    def: EndpointDefinition,
}

impl Endpoint {
    /// Create an endpoint named `name` under the `base` URL.
    #[must_use]
    pub fn new(name: impl Into<String>, base: impl Into<String>, def: EndpointDefinition) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            def,
        }
    }

    /// Endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition, including merged defaults.
    #[must_use]
    pub const fn definition(&self) -> &EndpointDefinition {
        &self.def
    }

    /// Path template; empty when undeclared.
    #[must_use]
    pub fn path(&self) -> &str {
        self.def.path.as_deref().unwrap_or_default()
    }

    /// HTTP method; GET when undeclared.
    #[must_use]
    pub fn method(&self) -> Method {
        self.def.method.unwrap_or_default()
    }

    /// Body encoding; `multipart/form-data` when undeclared.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.def.content_type.clone().unwrap_or(ContentType::Multipart)
    }

    /// Expected response type; `application/json` when undeclared.
    #[must_use]
    pub fn response_type(&self) -> ContentType {
        self.def.response_type.clone().unwrap_or(ContentType::Json)
    }

    /// Response type as declared, without the default.
    #[must_use]
    pub const fn declared_response_type(&self) -> Option<&ContentType> {
        self.def.response_type.as_ref()
    }

    /// Description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.def.description.as_deref()
    }

    /// Place of parameters that do not declare one.
    ///
    /// Form-encoded endpoints carry their parameters in the body; every other
    /// endpoint uses the query string.
    #[must_use]
    pub fn default_place(&self) -> Place {
        if self.content_type().is_form() {
            Place::Body
        } else {
            Place::Query
        }
    }

    /// Join the base URL and `path` with a single `/`.
    ///
    /// A trailing `/` on the base and leading `/`s on `path` are not repeated.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base, path)
    }

    /// Look up a declared parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] if `name` is not declared.
    pub fn parameter<'a>(
        &'a self,
        name: &str,
        resolver: TypeResolver<'a>,
    ) -> Result<Parameter<'a>> {
        let default_place = self.default_place();
        self.def
            .params
            .get_key_value(name)
            .map(|(name, def)| Parameter::new(name, def, default_place, resolver))
            .ok_or_else(|| Error::UnknownParameter {
                endpoint: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// All declared parameters, sorted by name.
    pub fn parameters<'a>(
        &'a self,
        resolver: TypeResolver<'a>,
    ) -> impl Iterator<Item = Parameter<'a>> + 'a {
        let default_place = self.default_place();
        self.def
            .params
            .iter()
            .map(move |(name, def)| Parameter::new(name, def, default_place, resolver))
    }

    /// Check that every required parameter is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] for the first missing one.
    pub fn validate(&self, params: &Params, resolver: TypeResolver<'_>) -> Result<()> {
        match self
            .parameters(resolver)
            .find(|parameter| parameter.required() && !params.contains_key(parameter.name()))
        {
            Some(missing) => Err(Error::MissingParameter {
                endpoint: self.name.clone(),
                name: missing.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Validate `params` and process each supplied value into a fresh builder.
    ///
    /// # Errors
    ///
    /// Validation errors (missing or unknown parameter) and serialization
    /// errors.
    pub fn prepare(&self, params: Params, resolver: TypeResolver<'_>) -> Result<RequestBuilder> {
        self.validate(&params, resolver)?;
        debug!(endpoint = %self.name, params = params.len(), "preparing request");

        params
            .into_iter()
            .try_fold(RequestBuilder::new(), |builder, (name, value)| {
                self.parameter(&name, resolver)?.process(builder, value)
            })
    }

    /// Call the endpoint with `params` through `client`.
    ///
    /// Every validation, serialization and compilation error is returned
    /// before `client` is used.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::prepare`] and [`RequestBuilder::exec`].
    pub async fn call<C>(
        &self,
        params: Params,
        resolver: TypeResolver<'_>,
        client: &C,
    ) -> Result<Value>
    where
        C: HttpClient + ?Sized,
    {
        self.prepare(params, resolver)?.exec(self, client).await
    }
}

/// Join `base` and `path` with exactly one `/`.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
