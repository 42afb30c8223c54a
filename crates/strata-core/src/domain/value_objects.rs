//! Domain value objects: ModuleCategory, ModuleKey, ParameterType,
//! ParameterValue, ProjectLayout.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. They
//! define the types, their string representations and their `FromStr`
//! parsers. Behaviour that needs more context (schemas, graphs, paths) lives
//! in the dedicated domain modules.

use crate::domain::error::DomainError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── ModuleCategory ───────────────────────────────────────────────────────────

/// The technology category a module belongs to.
///
/// Registry lookups are keyed by `(category, id)`; the string forms below are
/// the exact, case-sensitive spellings used in recipes and manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleCategory {
    Framework,
    Database,
    Auth,
    Payment,
    Email,
    Teams,
    Ui,
    State,
    Testing,
    Observability,
    Deployment,
    Content,
    Tooling,
}

impl ModuleCategory {
    pub const ALL: [ModuleCategory; 13] = [
        Self::Framework,
        Self::Database,
        Self::Auth,
        Self::Payment,
        Self::Email,
        Self::Teams,
        Self::Ui,
        Self::State,
        Self::Testing,
        Self::Observability,
        Self::Deployment,
        Self::Content,
        Self::Tooling,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Framework => "framework",
            Self::Database => "database",
            Self::Auth => "auth",
            Self::Payment => "payment",
            Self::Email => "email",
            Self::Teams => "teams",
            Self::Ui => "ui",
            Self::State => "state",
            Self::Testing => "testing",
            Self::Observability => "observability",
            Self::Deployment => "deployment",
            Self::Content => "content",
            Self::Tooling => "tooling",
        }
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::InvalidRecipe(format!("unknown module category: {s}")))
    }
}

// ── ModuleKey ────────────────────────────────────────────────────────────────

/// Identity of a module within a recipe: the `(category, id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleKey {
    pub category: ModuleCategory,
    pub id: String,
}

impl ModuleKey {
    pub fn new(category: ModuleCategory, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }

    /// Parse the `category:id` form used on the command line and in
    /// `requires`/`conflicts` declarations.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let (category, id) = s
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidModuleKey(s.to_string()))?;
        if id.is_empty() || id.contains(':') {
            return Err(DomainError::InvalidModuleKey(s.to_string()));
        }
        let category = category
            .parse::<ModuleCategory>()
            .map_err(|_| DomainError::InvalidModuleKey(s.to_string()))?;
        Ok(Self::new(category, id))
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

impl FromStr for ModuleKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ModuleKey> for String {
    fn from(key: ModuleKey) -> Self {
        key.to_string()
    }
}

// ── ProjectLayout ────────────────────────────────────────────────────────────

/// Whether the generated project is a single app or a monorepo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectLayout {
    #[default]
    SingleApp,
    Monorepo,
}

impl ProjectLayout {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleApp => "single-app",
            Self::Monorepo => "monorepo",
        }
    }

    pub const fn is_monorepo(&self) -> bool {
        matches!(self, Self::Monorepo)
    }
}

impl fmt::Display for ProjectLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ParameterType ────────────────────────────────────────────────────────────

/// The declared kind of a module parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Boolean,
    Number,
    Array,
    Object,
    Select,
}

impl ParameterType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "boolean" | "bool" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            "select" => Ok(Self::Select),
            other => Err(DomainError::InvalidParameter {
                parameter: "type".into(),
                reason: format!("unknown parameter type: {other}"),
            }),
        }
    }
}

// ── ParameterValue ───────────────────────────────────────────────────────────

/// A concrete parameter value with an explicit discriminant.
///
/// Recipes are loosely typed on disk; every consumer switches on this enum
/// instead of probing raw JSON/YAML. `select` parameters carry a `String`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<ParameterValue>),
    Object(IndexMap<String, ParameterValue>),
}

impl ParameterValue {
    /// Name of the value kind, used in type-mismatch messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Whether this value satisfies the declared type (choices are checked
    /// separately).
    pub fn matches_type(&self, ty: ParameterType) -> bool {
        matches!(
            (ty, self),
            (ParameterType::String, Self::String(_))
                | (ParameterType::Select, Self::String(_))
                | (ParameterType::Boolean, Self::Boolean(_))
                | (ParameterType::Number, Self::Number(_))
                | (ParameterType::Array, Self::Array(_))
                | (ParameterType::Object, Self::Object(_))
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParameterValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, ParameterValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value` for JSON-based merges.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(|num| {
                    if is_integral(*n) {
                        serde_json::Value::from(*n as i64)
                    } else {
                        serde_json::Value::Number(num)
                    }
                })
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Build from a `serde_json::Value`. `null` has no counterpart and yields
    /// `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Boolean(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Array(items) => Some(Self::Array(
                items.iter().filter_map(Self::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(Self::Object(
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

/// Rendering used for `{{module.parameters.x}}` substitution.
impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Array(_) | Self::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for ParameterValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for ParameterValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl<T: Into<ParameterValue>> From<Vec<T>> for ParameterValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
