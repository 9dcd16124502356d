//! Parameter placement.

use std::fmt;

use serde::Deserialize;

/// Section of the outgoing request that receives a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Place {
    /// Path placeholder (e.g., `:app_id` in `/apps/:app_id`).
    Path,
    /// Query parameter (e.g., `?page=2`).
    Query,
    /// Request header.
    Header,
    /// Body field, encoded according to the endpoint content type.
    Body,
    /// Credential handed to the transport, never sent as-is.
    Auth,
}

impl Place {
    /// All places, in request-section order.
    pub const ALL: [Self; 5] = [Self::Path, Self::Query, Self::Header, Self::Body, Self::Auth];
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
            Self::Auth => write!(f, "auth"),
        }
    }
}
