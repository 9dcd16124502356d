//! The API registry: one callable per declared endpoint.
//!
//! ```
//! use std::collections::HashMap;
//!
//! use bytes::Bytes;
//! use rink_core::{Api, ApiDefinition, HttpClient, Request, Response, Result, params};
//! use serde_json::json;
//!
//! struct Echo;
//!
//! impl HttpClient for Echo {
//!     async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
//!         let body = json!({ "url": request.full_url().as_str() }).to_string();
//!         Ok(Response::new(200, HashMap::new(), Bytes::from(body)))
//!     }
//! }
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let definition = ApiDefinition::from_value(json!({
//!     "base": "https://api.example.test",
//!     "endpoints": {
//!         "get_item": {
//!             "path": "/items/:id",
//!             "params": { "id": { "required": true, "place": "path" } }
//!         }
//!     }
//! }))?;
//! let api = Api::new(definition, Echo)?;
//!
//! let value = api.get("get_item")?.call(params([("id", "42")])).await?;
//! assert_eq!(value["url"], "https://api.example.test/items/42");
//! # Ok::<(), rink_core::Error>(())
//! # }).unwrap();
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, debug, info_span};

use crate::endpoint::join_url;
use crate::{
    ApiDefinition, DataType, Endpoint, Error, HttpClient, Params, Result, TypeDefinition,
    TypeResolver,
};

/// A loaded API definition bound to a transport.
///
/// Cloning is cheap: the definition and endpoints are shared.
pub struct Api<C> {
    def: Arc<ApiDefinition>,
    endpoints: Arc<BTreeMap<String, Endpoint>>,
    client: C,
}

impl<C: Clone> Clone for Api<C> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
            endpoints: Arc::clone(&self.endpoints),
            client: self.client.clone(),
        }
    }
}

impl<C> fmt::Debug for Api<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("name", &self.def.name)
            .field("base", &self.def.base)
            .field("endpoints", &self.endpoints.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<C> Api<C> {
    /// Build the registry.
    ///
    /// Defaults are merged into every endpoint once, here.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] when `base` is not an absolute URL
    /// - [`Error::TypeCycle`] when a catalog entry or a parameter type loops
    pub fn new(def: ApiDefinition, client: C) -> Result<Self> {
        url::Url::parse(&def.base)?;

        let resolver = TypeResolver::new(&def.data_types);
        let mut endpoints = BTreeMap::new();
        for (name, endpoint_def) in &def.endpoints {
            let endpoint = Endpoint::new(
                name.as_str(),
                def.base.as_str(),
                endpoint_def.with_defaults(&def.defaults),
            );
            for parameter in endpoint.parameters(resolver) {
                parameter.data_type()?;
            }
            endpoints.insert(name.clone(), endpoint);
        }
        // Catalog entries no parameter uses must resolve too
        for type_name in def.data_types.keys() {
            resolver.resolve(&TypeDefinition::named(type_name.as_str()))?;
        }

        debug!(api = %def.name, base = %def.base, endpoints = endpoints.len(), "api loaded");

        Ok(Self {
            def: Arc::new(def),
            endpoints: Arc::new(endpoints),
            client,
        })
    }

    /// API name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.def.base
    }

    /// API version label.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.def.version.as_deref()
    }

    /// The loaded definition.
    #[must_use]
    pub fn definition(&self) -> &ApiDefinition {
        &self.def
    }

    /// Join the base URL and `path` with a single `/`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.def.base, path)
    }

    /// Resolver over the data-type catalog.
    #[must_use]
    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(&self.def.data_types)
    }

    /// Resolve a type definition against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeCycle`] when the derivation chain loops.
    pub fn data_type(&self, def: &TypeDefinition) -> Result<DataType> {
        self.resolver().resolve(def)
    }

    /// Names of all endpoints, sorted.
    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Endpoint by name.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// The transport.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Callable for the endpoint `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEndpoint`] if there is no such endpoint.
    pub fn get(&self, name: &str) -> Result<BoundEndpoint<'_, C>> {
        self.endpoint(name)
            .map(|endpoint| BoundEndpoint { api: self, endpoint })
            .ok_or_else(|| Error::UnknownEndpoint(name.to_string()))
    }
}

impl<C: HttpClient> Api<C> {
    /// Call the endpoint `name` with `params`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownEndpoint`], then see [`BoundEndpoint::call`].
    pub async fn call(&self, name: &str, params: Params) -> Result<Value> {
        self.get(name)?.call(params).await
    }
}

/// An endpoint bound to its registry, callable with parameters.
pub struct BoundEndpoint<'a, C> {
    api: &'a Api<C>,
    endpoint: &'a Endpoint,
}

impl<C> Clone for BoundEndpoint<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for BoundEndpoint<'_, C> {}

impl<C> fmt::Debug for BoundEndpoint<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundEndpoint").field(&self.endpoint.name()).finish()
    }
}

impl<'a, C> BoundEndpoint<'a, C> {
    /// The endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &'a Endpoint {
        self.endpoint
    }
}

impl<C: HttpClient> BoundEndpoint<'_, C> {
    /// Validate, compile and send a request, then decode the response.
    ///
    /// # Errors
    ///
    /// Validation, serialization and compilation errors (returned before
    /// anything is sent), transport errors, and [`Error::Http`] for error
    /// statuses.
    pub async fn call(&self, params: Params) -> Result<Value> {
        let span = info_span!("endpoint", api = %self.api.name(), endpoint = %self.endpoint.name());
        self.endpoint
            .call(params, self.api.resolver(), &self.api.client)
            .instrument(span)
            .await
    }
}
