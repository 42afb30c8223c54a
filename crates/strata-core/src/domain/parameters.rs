//! Module parameter schemas and their resolution.
//!
//! A [`ParameterSchema`] declares, per parameter name, its type, whether it is
//! required, an optional default, allowed choices for `select` parameters and
//! an optional custom validator. [`ParameterResolver`] turns the raw,
//! user-supplied values from a recipe into [`ResolvedParameters`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::domain::{
    error::DomainError,
    value_objects::{ParameterType, ParameterValue},
};

/// Custom per-parameter check. Returns `Ok(())` or a human-readable message.
pub type CustomValidator = Arc<dyn Fn(&ParameterValue) -> Result<(), String> + Send + Sync>;

/// Declaration of one parameter.
#[derive(Clone)]
pub struct ParameterDef {
    pub name: String,
    pub param_type: ParameterType,
    pub required: bool,
    pub default: Option<ParameterValue>,
    pub choices: Vec<String>,
    pub description: String,
    validator: Option<CustomValidator>,
}

impl ParameterDef {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: None,
            choices: Vec::new(),
            description: String::new(),
            validator: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<ParameterValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParameterValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Check a single value against this declaration.
    pub fn check(&self, value: &ParameterValue) -> Result<(), DomainError> {
        if !value.matches_type(self.param_type) {
            return Err(DomainError::InvalidParameter {
                parameter: self.name.clone(),
                reason: format!("expected {}, got {}", self.param_type, value.kind()),
            });
        }

        if self.param_type == ParameterType::Select {
            let chosen = value.as_str().unwrap_or_default();
            if !self.choices.iter().any(|c| c == chosen) {
                return Err(DomainError::InvalidParameter {
                    parameter: self.name.clone(),
                    reason: format!(
                        "'{chosen}' is not one of: {}",
                        self.choices.join(", ")
                    ),
                });
            }
        }

        if let Some(validator) = &self.validator {
            validator(value).map_err(|reason| DomainError::InvalidParameter {
                parameter: self.name.clone(),
                reason,
            })?;
        }

        Ok(())
    }
}

impl fmt::Debug for ParameterDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDef")
            .field("name", &self.name)
            .field("param_type", &self.param_type)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("choices", &self.choices)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Ordered mapping from parameter name to its declaration.
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    params: IndexMap<String, ParameterDef>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, def: ParameterDef) -> Self {
        self.insert(def);
        self
    }

    pub fn insert(&mut self, def: ParameterDef) {
        self.params.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDef> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDef> {
        self.params.values()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Parameter values after defaults have been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameters(BTreeMap<String, ParameterValue>);

impl ResolvedParameters {
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(ParameterValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(ParameterValue::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ParameterValue)> for ResolvedParameters {
    fn from_iter<T: IntoIterator<Item = (String, ParameterValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Non-fatal findings from parameter resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterWarning {
    /// A key the schema does not declare. Kept so older recipes keep working.
    UnknownParameter { name: String },
}

impl fmt::Display for ParameterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParameter { name } => write!(f, "unknown parameter '{name}'"),
        }
    }
}

/// Outcome of [`ParameterResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterResolution {
    pub parameters: ResolvedParameters,
    pub warnings: Vec<ParameterWarning>,
}

/// Outcome of [`ParameterResolver::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<DomainError>,
}

/// Resolves raw parameters against a schema. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterResolver;

impl ParameterResolver {
    /// Apply defaults and check the result.
    ///
    /// Each declared key is taken from `user` when present, else from the
    /// declared default. A required key with neither fails with
    /// `MissingRequiredParameter`. Undeclared keys are passed through and
    /// reported as `UnknownParameter` warnings. The resolved set is then
    /// validated, so a returned value always satisfies the schema.
    pub fn resolve(
        module: &str,
        user: &BTreeMap<String, ParameterValue>,
        schema: &ParameterSchema,
    ) -> Result<ParameterResolution, DomainError> {
        let mut resolved = BTreeMap::new();

        for def in schema.iter() {
            match user.get(&def.name).or(def.default.as_ref()) {
                Some(value) => {
                    resolved.insert(def.name.clone(), value.clone());
                }
                None if def.required => {
                    return Err(DomainError::MissingRequiredParameter {
                        module: module.to_string(),
                        parameter: def.name.clone(),
                    });
                }
                None => {}
            }
        }

        let mut warnings = Vec::new();
        for (name, value) in user {
            if schema.get(name).is_none() {
                warnings.push(ParameterWarning::UnknownParameter { name: name.clone() });
                resolved.insert(name.clone(), value.clone());
            }
        }

        let parameters = ResolvedParameters(resolved);
        let report = Self::validate(&parameters, schema);
        if let Some(first) = report.errors.into_iter().next() {
            return Err(first);
        }

        Ok(ParameterResolution {
            parameters,
            warnings,
        })
    }

    /// Type-check every declared parameter independently of resolution.
    pub fn validate(params: &ResolvedParameters, schema: &ParameterSchema) -> ValidationReport {
        let mut errors = Vec::new();

        for def in schema.iter() {
            match params.get(&def.name) {
                Some(value) => {
                    if let Err(e) = def.check(value) {
                        errors.push(e);
                    }
                }
                None if def.required => errors.push(DomainError::InvalidParameter {
                    parameter: def.name.clone(),
                    reason: "required parameter is missing".into(),
                }),
                None => {}
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParameterSchema {
        let pool_size = ParameterDef::new("poolSize", ParameterType::Number).validator(|v| match v {
            ParameterValue::Number(n) if *n >= 1.0 => Ok(()),
            _ => Err("pool size must be at least 1".into()),
        });
        ParameterSchema::new()
            .with(
                ParameterDef::new("provider", ParameterType::Select)
                    .choices(["postgres", "mysql", "sqlite"])
                    .default_value("postgres"),
            )
            .with(ParameterDef::new("databaseUrl", ParameterType::String).required())
            .with(ParameterDef::new("migrations", ParameterType::Boolean).default_value(true))
            .with(pool_size)
    }

    fn user(pairs: &[(&str, ParameterValue)]) -> BTreeMap<String, ParameterValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let res = ParameterResolver::resolve(
            "drizzle",
            &user(&[("databaseUrl", "postgres://x".into())]),
            &schema(),
        )
        .unwrap();

        assert_eq!(res.parameters.get_str("provider"), Some("postgres"));
        assert_eq!(res.parameters.get_bool("migrations"), Some(true));
        assert!(res.parameters.get("poolSize").is_none());
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn user_value_wins_over_default() {
        let res = ParameterResolver::resolve(
            "drizzle",
            &user(&[("databaseUrl", "x".into()), ("provider", "sqlite".into())]),
            &schema(),
        )
        .unwrap();
        assert_eq!(res.parameters.get_str("provider"), Some("sqlite"));
    }

    #[test]
    fn missing_required_without_default_fails() {
        let err = ParameterResolver::resolve("drizzle", &BTreeMap::new(), &schema()).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingRequiredParameter {
                module: "drizzle".into(),
                parameter: "databaseUrl".into(),
            }
        );
    }

    #[test]
    fn unknown_keys_are_warnings_not_errors() {
        let res = ParameterResolver::resolve(
            "drizzle",
            &user(&[("databaseUrl", "x".into()), ("legacyFlag", true.into())]),
            &schema(),
        )
        .unwrap();

        assert_eq!(
            res.warnings,
            vec![ParameterWarning::UnknownParameter {
                name: "legacyFlag".into()
            }]
        );
        assert_eq!(res.parameters.get_bool("legacyFlag"), Some(true));
    }

    #[test]
    fn resolution_is_idempotent() {
        let input = user(&[("databaseUrl", "x".into()), ("poolSize", 4i64.into())]);
        let first = ParameterResolver::resolve("drizzle", &input, &schema()).unwrap();
        let second = ParameterResolver::resolve("drizzle", &input, &schema()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn select_outside_choices_is_rejected() {
        let err = ParameterResolver::resolve(
            "drizzle",
            &user(&[("databaseUrl", "x".into()), ("provider", "oracle".into())]),
            &schema(),
        )
        .unwrap_err();
        let DomainError::InvalidParameter { parameter, .. } = &err else {
            panic!("expected an invalid parameter, got {err:?}");
        };
        assert_eq!(parameter, "provider");
    }

    #[test]
    fn validate_reports_every_type_error() {
        let params: ResolvedParameters = [
            ("databaseUrl".to_string(), ParameterValue::Boolean(true)),
            ("migrations".to_string(), ParameterValue::String("yes".into())),
            ("poolSize".to_string(), ParameterValue::Number(0.0)),
        ]
        .into_iter()
        .collect();

        let report = ParameterResolver::validate(&params, &schema());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn custom_validator_message_is_surfaced() {
        let def = ParameterDef::new("poolSize", ParameterType::Number)
            .validator(|_| Err("nope".into()));
        let err = def.check(&ParameterValue::Number(3.0)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidParameter {
                parameter: "poolSize".into(),
                reason: "nope".into()
            }
        );
    }
}
