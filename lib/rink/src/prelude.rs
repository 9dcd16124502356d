//! Prelude module for convenient imports.
//!
//! ```
//! use rink::prelude::*;
//! ```

pub use crate::{
    Api, ApiDefinition, ClientConfig, ContentType, Error, HttpClient, HyperClient, Method, Params,
    Place, Request, Response, Result, StatusCode, header, params,
};
