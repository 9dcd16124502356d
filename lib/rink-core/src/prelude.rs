//! Prelude module for convenient imports.
//!
//! ```
//! use rink_core::prelude::*;
//! ```

pub use crate::{
    Api, ApiDefinition, ContentType, Endpoint, Error, HttpClient, Method, Params, Place, Request,
    RequestBuilder, Response, Result, params,
};
