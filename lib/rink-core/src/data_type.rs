//! Data types and their resolution.
//!
//! A parameter's `type` either names an entry of the definition's data-type
//! catalog or one of the built-in kinds. Catalog entries may themselves name
//! other catalog entries, which forms a derivation chain:
//!
//! ```text
//! app_token -> token -> scalar
//! ```
//!
//! Resolution walks the chain down to a built-in kind and wraps it once per
//! catalog entry crossed. Serialization always happens at the root.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::wire::{FileStream, WireValue, text_of};
use crate::{Error, Result, TypeDefinition};

/// Built-in kind name for identity serialization.
pub const SCALAR: &str = "scalar";
/// Built-in kind name for value-mapped enumerations.
pub const ENUM: &str = "enum";
/// Built-in kind name for file uploads.
pub const FILE: &str = "file";

/// A resolved data type.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// Values pass through unchanged.
    Scalar,
    /// Values must be one of the keys; the mapped value is sent.
    Enum(BTreeMap<String, Value>),
    /// Values are paths, opened as [`FileStream`]s.
    File,
    /// A catalog entry reusing the behavior of `base`.
    Derived {
        /// Catalog name of this type.
        name: String,
        /// The type this one derives from.
        base: Box<DataType>,
    },
}

impl DataType {
    fn builtin(def: &TypeDefinition) -> Self {
        match def.type_name.as_deref() {
            Some(FILE) => Self::File,
            Some(ENUM) => Self::Enum(def.values.clone().unwrap_or_default()),
            _ => Self::Scalar,
        }
    }

    /// The non-derived type at the end of the derivation chain.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Derived { base, .. } = current {
            current = base;
        }
        current
    }

    /// Catalog names crossed to reach the root, outermost first.
    #[must_use]
    pub fn lineage(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self;
        while let Self::Derived { name, base } = current {
            names.push(name.as_str());
            current = base;
        }
        names
    }

    /// Serialize a value supplied for `parameter`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEnumValue`] when an enum does not accept the value
    /// - [`Error::File`] when a file cannot be opened
    pub fn serialize(&self, parameter: &str, value: Value) -> Result<WireValue> {
        match self.root() {
            Self::Scalar | Self::Derived { .. } => Ok(WireValue::Json(value)),
            Self::Enum(values) => {
                let key = text_of(&value);
                values
                    .get(&key)
                    .cloned()
                    .map(WireValue::Json)
                    .ok_or_else(|| Error::InvalidEnumValue {
                        parameter: parameter.to_string(),
                        value: key,
                    })
            }
            Self::File => {
                let path = text_of(&value);
                FileStream::open(&path)
                    .map(WireValue::File)
                    .map_err(|source| Error::File {
                        parameter: parameter.to_string(),
                        path: path.into(),
                        source,
                    })
            }
        }
    }
}

/// Resolves type definitions against a data-type catalog.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    catalog: &'a BTreeMap<String, TypeDefinition>,
}

impl<'a> TypeResolver<'a> {
    /// Create a resolver over `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a BTreeMap<String, TypeDefinition>) -> Self {
        Self { catalog }
    }

    /// Resolve `def` to a [`DataType`].
    ///
    /// Catalog names take precedence over built-in kinds; unknown or missing
    /// names resolve to [`DataType::Scalar`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeCycle`] when the derivation chain loops.
    pub fn resolve(&self, def: &TypeDefinition) -> Result<DataType> {
        let mut chain: Vec<&'a str> = Vec::new();
        let mut current = def;

        while let Some((name, parent)) = current
            .type_name
            .as_deref()
            .and_then(|type_name| self.catalog.get_key_value(type_name))
        {
            if chain.contains(&name.as_str()) {
                let mut names: Vec<String> = chain.iter().map(ToString::to_string).collect();
                names.push(name.clone());
                return Err(Error::TypeCycle { chain: names });
            }
            chain.push(name);
            current = parent;
        }

        trace!(chain = ?chain, root = ?current.type_name, "resolved data type");

        let mut data_type = DataType::builtin(current);
        for name in chain.into_iter().rev() {
            data_type = DataType::Derived {
                name: name.to_string(),
                base: Box::new(data_type),
            };
        }
        Ok(data_type)
    }
}
