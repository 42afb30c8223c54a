//! Named, idempotent source transformations used by `ENHANCE_FILE`.
//!
//! Each modifier declares a [`ParameterSchema`]; the executor resolves the
//! action's params against it before calling [`FileModifier::apply`].
//! Applying a modifier to its own output must return that output unchanged.

mod json;
mod lines;
mod object_literal;
mod ts_module;

use std::collections::BTreeMap;

use crate::domain::{
    error::DomainError,
    parameters::{ParameterResolver, ParameterSchema, ParameterWarning, ResolvedParameters},
    value_objects::ParameterValue,
};

pub use json::JsonMerger;
pub use lines::LineAppender;
pub use object_literal::ObjectLiteralMerger;
pub use ts_module::TsModuleEnhancer;

pub trait FileModifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn params_schema(&self) -> ParameterSchema;

    /// Transform `source`, the current text of `path`.
    fn apply(
        &self,
        path: &str,
        source: &str,
        params: &ResolvedParameters,
    ) -> Result<String, DomainError>;
}

/// A modifier's output plus anything odd about the params it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Modified {
    pub content: String,
    pub warnings: Vec<ParameterWarning>,
}

/// Lookup table from modifier name to implementation.
pub struct ModifierRegistry {
    modifiers: BTreeMap<&'static str, Box<dyn FileModifier>>,
}

impl ModifierRegistry {
    pub fn empty() -> Self {
        Self {
            modifiers: BTreeMap::new(),
        }
    }

    /// `ts-module-enhancer`, `object-literal-merger`, `json-merger` and
    /// `line-appender`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TsModuleEnhancer));
        registry.register(Box::new(ObjectLiteralMerger));
        registry.register(Box::new(JsonMerger));
        registry.register(Box::new(LineAppender));
        registry
    }

    pub fn register(&mut self, modifier: Box<dyn FileModifier>) {
        self.modifiers.insert(modifier.name(), modifier);
    }

    pub fn get(&self, name: &str) -> Result<&dyn FileModifier, DomainError> {
        self.modifiers
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| DomainError::UnknownModifier {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modifiers.keys().copied()
    }

    /// Validate `params` against the modifier's schema, then apply it.
    /// Params the schema does not declare come back as warnings.
    pub fn apply(
        &self,
        name: &str,
        path: &str,
        source: &str,
        params: &BTreeMap<String, ParameterValue>,
    ) -> Result<Modified, DomainError> {
        let modifier = self.get(name)?;
        let resolved = ParameterResolver::resolve(name, params, &modifier.params_schema())?;
        Ok(Modified {
            content: modifier.apply(path, source, &resolved.parameters)?,
            warnings: resolved.warnings,
        })
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.modifiers.keys()).finish()
    }
}

/// String items of an array parameter; non-strings are rejected.
pub(crate) fn string_list(
    params: &ResolvedParameters,
    name: &str,
) -> Result<Vec<String>, DomainError> {
    let Some(value) = params.get(name) else {
        return Ok(Vec::new());
    };
    let items = value.as_array().ok_or_else(|| DomainError::InvalidParameter {
        parameter: name.to_string(),
        reason: "expected an array of strings".into(),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| DomainError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: format!("expected a string, got {}", item.kind()),
                })
        })
        .collect()
}
