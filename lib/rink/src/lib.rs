//! Declarative API clients over hyper.
//!
//! Load an [`ApiDefinition`], bind it to a [`HyperClient`], and call
//! endpoints by name:
//!
//! ```no_run
//! use rink::prelude::*;
//!
//! # async fn run() -> rink::Result<()> {
//! let definition = ApiDefinition::from_json(br#"{
//!     "name": "hockeyapp",
//!     "base": "https://rink.hockeyapp.net/api/2",
//!     "endpoints": {
//!         "list_apps": {
//!             "path": "/apps",
//!             "params": {
//!                 "token": { "required": true, "place": "header", "internalName": "X-HockeyAppToken" }
//!             }
//!         }
//!     }
//! }"#)?;
//!
//! let api = Api::new(definition, HyperClient::builder().with_logging().build())?;
//! let apps = api.call("list_apps", params([("token", "4567abcd")])).await?;
//! println!("{apps}");
//! # Ok(())
//! # }
//! ```
//!
//! The request-compilation engine lives in `rink-core` and is re-exported
//! here; this crate adds the transport: connection pooling, rustls, wire
//! encoding of bodies and credentials, and tower middleware.

mod client;
mod config;
mod connector;
mod encode;
pub mod middleware;
pub mod prelude;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use encode::{authorization, encode};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use rink_core::{
    Api, ApiDefinition, Body, BoundEndpoint, ContentType, Credentials, DataType, Endpoint,
    EndpointDefinition, Error, ErrorKind, FileStream, Form, HttpClient, Method, Parameter,
    ParameterDefinition, Params, Part, Place, Request, RequestBuilder, Response, Result,
    TypeDefinition, TypeResolver, WireValue, from_json, params, to_form, to_json,
};

// Re-export http types for status codes and headers
pub use rink_core::{StatusCode, header};
