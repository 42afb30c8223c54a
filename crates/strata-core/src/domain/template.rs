//! Flat variable context for `{{variable}}` substitution.
//!
//! # Variables
//!
//! | Key | Example |
//! |-----|---------|
//! | `project.name` | "My App" |
//! | `project.name_snake` | "my_app" |
//! | `project.name_kebab` | "my-app" |
//! | `project.name_pascal` | "MyApp" |
//! | `project.framework`, `project.path`, `project.structure` | |
//! | `module.id`, `module.category`, `module.version` | |
//! | `module.parameters.<name>` | rendered parameter value |
//! | `paths.<smart_key>` | "src/lib/auth/config" |
//! | `year` | "2026" |
//!
//! A `{{ ... }}` pair is only a variable when its trimmed body is an
//! identifier path (`[A-Za-z_][A-Za-z0-9_.-]*`). Anything else, such as a JSX
//! style object `style={{ color: 'red' }}`, is copied through untouched.
//! A variable with no value is an error, never left in the output.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    variables: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Context with the project name, its case variants and the current year.
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        let year = chrono::Local::now().year();

        Self::default()
            .with("project.name_snake", to_snake_case(&name))
            .with("project.name_kebab", to_kebab_case(&name))
            .with("project.name_pascal", to_pascal_case(&name))
            .with("project.name", name)
            .with("year", year.to_string())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Insert every `(name, value)` pair under `prefix.`.
    pub fn extend_prefixed<I, K, V>(&mut self, prefix: &str, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        for (k, v) in entries {
            self.variables
                .insert(format!("{prefix}.{}", k.as_ref()), v.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Substitute every variable in `template`.
    pub fn render(&self, template: &str) -> Result<String, DomainError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };

            let body = after_open[..end].trim();
            if is_variable(body) {
                let value = self.get(body).ok_or_else(|| DomainError::UnresolvedVariable {
                    name: body.to_string(),
                })?;
                out.push_str(value);
                rest = &after_open[end + 2..];
            } else {
                // Not a variable; emit one brace and rescan so `{{{x}}}` still
                // substitutes the inner pair.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn is_variable(body: &str) -> bool {
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Whether a rendered condition enables its action.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0" | "no" | "off"
    )
}

// ── Case conversion ──────────────────────────────────────────────────────────

pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Split on `_`, `-`, whitespace, lower-to-upper transitions and acronym
/// boundaries (`HTTPServer` -> `http`, `server`). Words come back lowercase.
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        current.push(c);

        if let Some(&next) = chars.peek() {
            let camel = c.is_lowercase() && next.is_uppercase();
            let acronym = c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(char::is_lowercase);
            if camel || acronym {
                words.push(current.to_lowercase());
                current.clear();
            }
        }
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
