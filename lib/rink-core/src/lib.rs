//! Request-compilation engine for rink declarative API clients.
//!
//! An [`ApiDefinition`] describes endpoints, their parameters and a catalog of
//! data types. [`Api`] turns it into one callable per endpoint:
//!
//! - [`TypeResolver`] resolves parameter types to a [`DataType`], following
//!   derivation chains and rejecting cycles
//! - [`Parameter`] serializes a value and places it in a request section
//! - [`Endpoint`] validates call parameters and fills a [`RequestBuilder`]
//! - [`RequestBuilder`] compiles the sections into a [`Request`]
//! - [`HttpClient`] sends it; the `rink` crate provides the hyper transport
//!
//! Everything that can be rejected is rejected before the [`HttpClient`] is
//! called.

mod api;
mod body;
mod client;
mod data_type;
mod definition;
mod endpoint;
mod error;
mod method;
mod multipart;
mod parameter;
mod path_template;
mod place;
pub mod prelude;
mod request;
mod response;
mod wire;

pub use api::{Api, BoundEndpoint};
pub use body::{ContentType, from_json, to_form, to_json};
pub use client::HttpClient;
pub use data_type::{DataType, ENUM, FILE, SCALAR, TypeResolver};
pub use definition::{
    ApiDefinition, EndpointDefinition, ParameterDefinition, Params, TypeDefinition, params,
};
pub use endpoint::{Endpoint, join_url};
pub use error::{Error, ErrorKind, Result};
pub use method::Method;
pub use multipart::{Form, Part};
pub use parameter::Parameter;
pub use path_template::PathTemplate;
pub use place::Place;
pub use request::{Body, Credentials, Request, RequestBuilder, decode_response};
pub use response::Response;
pub use wire::{FileStream, WireValue, text_of};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
