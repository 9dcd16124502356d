//! Endpoint parameters bound to their declarations.

use serde_json::Value;

use crate::{DataType, ParameterDefinition, Place, RequestBuilder, Result, TypeResolver};

/// A declared parameter of one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    name: &'a str,
    def: &'a ParameterDefinition,
    default_place: Place,
    resolver: TypeResolver<'a>,
}

impl<'a> Parameter<'a> {
    /// Bind the declaration `def` of parameter `name`.
    ///
    /// `default_place` is used when the declaration has no explicit place.
    #[must_use]
    pub const fn new(
        name: &'a str,
        def: &'a ParameterDefinition,
        default_place: Place,
        resolver: TypeResolver<'a>,
    ) -> Self {
        Self {
            name,
            def,
            default_place,
            resolver,
        }
    }

    /// Declared name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Declaration.
    #[must_use]
    pub const fn definition(&self) -> &'a ParameterDefinition {
        self.def
    }

    /// Whether callers must supply this parameter.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.def.required
    }

    /// Section the serialized value goes to.
    #[must_use]
    pub fn place(&self) -> Place {
        self.def.place.unwrap_or(self.default_place)
    }

    /// Name on the wire.
    #[must_use]
    pub fn internal_name(&self) -> &'a str {
        self.def.internal_name.as_deref().unwrap_or(self.name)
    }

    /// Resolve the declared data type.
    pub fn data_type(&self) -> Result<DataType> {
        self.resolver.resolve(&self.def.data_type)
    }

    /// Serialize `value` and add it to `builder` under the wire name.
    ///
    /// # Errors
    ///
    /// Type resolution errors and serialization errors (invalid enum value,
    /// unreadable file).
    pub fn process(&self, builder: RequestBuilder, value: Value) -> Result<RequestBuilder> {
        let serialized = self.data_type()?.serialize(self.name, value)?;
        Ok(builder.with_param(self.place(), self.internal_name(), serialized))
    }
}
