//! `object-literal-merger`: add keys to a configuration object literal.
//!
//! Params: `targetObject` (a `const` name, or `default` for
//! `export default { ... }`), `properties` (literal values, strings are
//! quoted), `expressions` (identifier paths emitted verbatim, e.g.
//! `process.env.DATABASE_URL`) and `overwrite`.
//!
//! Only a small literal subset is understood: entries whose values are
//! strings, numbers, booleans, `null`/`undefined` or identifier paths, plus
//! shorthand entries. Anything else (nested objects, arrays, calls, spreads,
//! comments) fails with `UnsupportedMergeSyntax` rather than being guessed at.
//! When the object does not exist yet it is appended as
//! `export const <name> = { ... };`.

use crate::domain::{
    error::DomainError,
    modifiers::FileModifier,
    parameters::{ParameterDef, ParameterSchema, ResolvedParameters},
    value_objects::{ParameterType, ParameterValue},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectLiteralMerger;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    raw_key: String,
    value: String,
}

impl Entry {
    fn new(key: &str, value: String) -> Self {
        let raw_key = if is_identifier(key) {
            key.to_string()
        } else {
            quote(key)
        };
        Self {
            key: key.to_string(),
            raw_key,
            value,
        }
    }

    fn render(&self) -> String {
        if self.raw_key == self.value && is_identifier(&self.value) {
            self.value.clone()
        } else {
            format!("{}: {}", self.raw_key, self.value)
        }
    }
}

impl FileModifier for ObjectLiteralMerger {
    fn name(&self) -> &'static str {
        "object-literal-merger"
    }

    fn params_schema(&self) -> ParameterSchema {
        let empty = || ParameterValue::Object(Default::default());
        ParameterSchema::new()
            .with(
                ParameterDef::new("targetObject", ParameterType::String)
                    .required()
                    .validator(|v| match v.as_str() {
                        Some(name) if name == "default" || is_identifier(name) => Ok(()),
                        _ => Err("must be an identifier or 'default'".into()),
                    }),
            )
            .with(ParameterDef::new("properties", ParameterType::Object).default_value(empty()))
            .with(ParameterDef::new("expressions", ParameterType::Object).default_value(empty()))
            .with(ParameterDef::new("overwrite", ParameterType::Boolean).default_value(false))
    }

    fn apply(
        &self,
        path: &str,
        source: &str,
        params: &ResolvedParameters,
    ) -> Result<String, DomainError> {
        let target = params.get_str("targetObject").unwrap_or("default");
        let overwrite = params.get_bool("overwrite").unwrap_or(false);
        let wanted = wanted_entries(params)?;

        let Some(open) = find_object(path, source, target)? else {
            return Ok(synthesize(source, target, &wanted));
        };

        let unsupported = |reason: String| DomainError::UnsupportedMergeSyntax {
            target: path.to_string(),
            reason,
        };

        let close = matching_brace(source, open)
            .ok_or_else(|| unsupported(format!("unterminated object literal '{target}'")))?;
        let existing = parse_entries(&source[open + 1..close]).map_err(unsupported)?;

        let mut merged = existing.clone();
        for entry in wanted {
            match merged.iter_mut().find(|e| e.key == entry.key) {
                Some(current) if overwrite => current.value = entry.value,
                Some(_) => {}
                None => merged.push(entry),
            }
        }

        if merged == existing {
            return Ok(source.to_string());
        }

        let line_start = source[..open].rfind('\n').map_or(0, |i| i + 1);
        let indent: String = source[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();

        let mut out = String::with_capacity(source.len() + 64);
        out.push_str(&source[..=open]);
        out.push_str(&render_body(&merged, &indent));
        out.push_str(&source[close..]);
        Ok(out)
    }
}

fn wanted_entries(params: &ResolvedParameters) -> Result<Vec<Entry>, DomainError> {
    let mut entries = Vec::new();

    if let Some(props) = params.get("properties").and_then(ParameterValue::as_object) {
        for (key, value) in props {
            let rendered = match value {
                ParameterValue::String(s) => quote(s),
                ParameterValue::Number(_) | ParameterValue::Boolean(_) => value.to_string(),
                other => {
                    return Err(DomainError::InvalidParameter {
                        parameter: format!("properties.{key}"),
                        reason: format!(
                            "{} values are outside the supported literal subset",
                            other.kind()
                        ),
                    });
                }
            };
            entries.push(Entry::new(key, rendered));
        }
    }

    if let Some(exprs) = params.get("expressions").and_then(ParameterValue::as_object) {
        for (key, value) in exprs {
            let expr = value.as_str().filter(|e| is_identifier_path(e)).ok_or_else(|| {
                DomainError::InvalidParameter {
                    parameter: format!("expressions.{key}"),
                    reason: "expected an identifier path such as process.env.NAME".into(),
                }
            })?;
            entries.push(Entry::new(key, expr.to_string()));
        }
    }

    Ok(entries)
}

/// Byte index of the `{` opening the target object, `None` if the object is
/// not declared at all.
fn find_object(path: &str, source: &str, target: &str) -> Result<Option<usize>, DomainError> {
    let unsupported = |reason: String| DomainError::UnsupportedMergeSyntax {
        target: path.to_string(),
        reason,
    };

    if target == "default" {
        let Some(pos) = source.find("export default") else {
            return Ok(None);
        };
        let after = pos + "export default".len();
        return match skip_ws(source, after) {
            Some(i) if source[i..].starts_with('{') => Ok(Some(i)),
            _ => Err(unsupported("default export is not a plain object literal".into())),
        };
    }

    for keyword in ["let", "var"] {
        if declaration(source, keyword, target).is_some() {
            return Err(unsupported(format!(
                "'{target}' is declared with '{keyword}'; only const objects are merged"
            )));
        }
    }

    let Some(after_name) = declaration(source, "const", target) else {
        return Ok(None);
    };
    let eq = source[after_name..]
        .find('=')
        .map(|i| after_name + i)
        .ok_or_else(|| unsupported(format!("'{target}' has no initializer")))?;
    match skip_ws(source, eq + 1) {
        Some(i) if source[i..].starts_with('{') => Ok(Some(i)),
        _ => Err(unsupported(format!(
            "'{target}' is not initialized with an object literal"
        ))),
    }
}

/// Byte index just past `<keyword> <name>` for the first whole-word
/// declaration of `name`.
fn declaration(source: &str, keyword: &str, name: &str) -> Option<usize> {
    let needle = format!("{keyword} {name}");
    let mut search = 0;
    while let Some(found) = source[search..].find(&needle) {
        let start = search + found;
        let after_name = start + needle.len();
        search = after_name;

        let preceded_ok = start == 0
            || source[..start]
                .chars()
                .next_back()
                .is_some_and(|c| !(c.is_alphanumeric() || c == '_' || c == '$'));
        let followed_ok = source[after_name..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == ':' || c == '=');
        if preceded_ok && followed_ok {
            return Some(after_name);
        }
    }
    None
}

fn skip_ws(source: &str, from: usize) -> Option<usize> {
    source[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| from + i)
}

/// Index of the `}` closing the brace at `open`, skipping string contents.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in source[open..].char_indices() {
        if let Some(q) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split the body on top-level commas and parse each entry.
fn parse_entries(body: &str) -> Result<Vec<Entry>, String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        if let Some(q) = in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                in_string = Some(c);
                current.push(c);
            }
            ',' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_string.is_some() {
        return Err("unterminated string literal".into());
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| parse_entry(&s))
        .collect()
}

fn parse_entry(segment: &str) -> Result<Entry, String> {
    if segment.contains("//") && !segment.contains("://") || segment.contains("/*") {
        return Err(format!("comments are not supported: `{segment}`"));
    }
    if segment.starts_with("...") {
        return Err(format!("spread entries are not supported: `{segment}`"));
    }

    let Some((raw_key, value)) = split_key_value(segment) else {
        return if is_identifier(segment) {
            Ok(Entry {
                key: segment.to_string(),
                raw_key: segment.to_string(),
                value: segment.to_string(),
            })
        } else {
            Err(format!("unsupported entry `{segment}`"))
        };
    };

    let raw_key = raw_key.trim();
    let key = if is_identifier(raw_key) {
        raw_key.to_string()
    } else if let Some(inner) = unquote(raw_key) {
        inner.to_string()
    } else {
        return Err(format!("unsupported key `{raw_key}`"));
    };

    let value = value.trim();
    if !is_supported_value(value) {
        return Err(format!("value of '{key}' is outside the supported literal subset: `{value}`"));
    }

    Ok(Entry {
        key,
        raw_key: raw_key.to_string(),
        value: value.to_string(),
    })
}

/// Split at the first `:` outside a quoted key.
fn split_key_value(segment: &str) -> Option<(&str, &str)> {
    let first = segment.chars().next()?;
    if first == '\'' || first == '"' {
        let close = segment[1..].find(first)? + 1;
        let colon = segment[close + 1..].find(':')? + close + 1;
        return Some((&segment[..colon], &segment[colon + 1..]));
    }
    segment.split_once(':')
}

fn is_supported_value(value: &str) -> bool {
    if unquote(value).is_some() {
        return !(value.starts_with('`') && value.contains("${"));
    }
    matches!(value, "true" | "false" | "null" | "undefined")
        || value.parse::<f64>().is_ok()
        || is_identifier_path(value)
}

fn unquote(s: &str) -> Option<&str> {
    let first = s.chars().next()?;
    if !matches!(first, '\'' | '"' | '`') || s.len() < 2 || !s.ends_with(first) {
        return None;
    }
    Some(&s[1..s.len() - 1])
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_identifier_path(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

fn render_body(entries: &[Entry], indent: &str) -> String {
    let mut body = String::from("\n");
    for entry in entries {
        body.push_str(indent);
        body.push_str("  ");
        body.push_str(&entry.render());
        body.push_str(",\n");
    }
    body.push_str(indent);
    body
}

fn synthesize(source: &str, target: &str, entries: &[Entry]) -> String {
    let mut out = source.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    let head = if target == "default" {
        "export default {".to_string()
    } else {
        format!("export const {target} = {{")
    };
    out.push_str(&head);
    out.push_str(&render_body(entries, ""));
    out.push_str("};\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn params(
        target: &str,
        props: &[(&str, ParameterValue)],
        overwrite: bool,
    ) -> ResolvedParameters {
        let props: IndexMap<String, ParameterValue> =
            props.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        [
            ("targetObject".to_string(), ParameterValue::from(target)),
            ("properties".to_string(), ParameterValue::Object(props)),
            ("overwrite".to_string(), ParameterValue::from(overwrite)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn adds_missing_keys_and_keeps_existing() {
        let src = "export const authConfig = {\n  secret: process.env.AUTH_SECRET,\n  debug: false,\n};\n";
        let out = ObjectLiteralMerger
            .apply(
                "auth.ts",
                src,
                &params(
                    "authConfig",
                    &[("debug", true.into()), ("basePath", "/api/auth".into())],
                    false,
                ),
            )
            .unwrap();
        assert_eq!(
            out,
            "export const authConfig = {\n  secret: process.env.AUTH_SECRET,\n  debug: false,\n  basePath: '/api/auth',\n};\n"
        );
    }

    #[test]
    fn overwrite_replaces_values() {
        let src = "const config = { port: 3000 };";
        let out = ObjectLiteralMerger
            .apply("c.ts", src, &params("config", &[("port", 8080i64.into())], true))
            .unwrap();
        assert_eq!(out, "const config = {\n  port: 8080,\n};");
    }

    #[test]
    fn typed_declaration_and_quoted_keys() {
        let src = "const headers: Record<string, string> = { 'x-app': \"demo\" };\n";
        let out = ObjectLiteralMerger
            .apply("h.ts", src, &params("headers", &[("x-app", "other".into())], false))
            .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn export_default_object() {
        let src = "export default {\n  schema: './src/db/schema.ts',\n};\n";
        let out = ObjectLiteralMerger
            .apply(
                "drizzle.config.ts",
                src,
                &params("default", &[("out", "./drizzle".into())], false),
            )
            .unwrap();
        assert_eq!(
            out,
            "export default {\n  schema: './src/db/schema.ts',\n  out: './drizzle',\n};\n"
        );
    }

    #[test]
    fn missing_object_is_synthesized() {
        let out = ObjectLiteralMerger
            .apply(
                "a.ts",
                "import x from 'x';",
                &params("siteConfig", &[("name", "Demo".into())], false),
            )
            .unwrap();
        assert_eq!(
            out,
            "import x from 'x';\n\nexport const siteConfig = {\n  name: 'Demo',\n};\n"
        );
    }

    #[test]
    fn nested_values_are_unsupported() {
        let src = "const config = { db: { url: 'x' } };";
        let err = ObjectLiteralMerger
            .apply("c.ts", src, &params("config", &[("port", 1i64.into())], false))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMergeSyntax { .. }));
    }

    #[test]
    fn call_initializer_is_unsupported() {
        let src = "export default defineConfig({ out: './x' });";
        let err = ObjectLiteralMerger
            .apply("c.ts", src, &params("default", &[("a", 1i64.into())], false))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMergeSyntax { .. }));
    }

    #[test]
    fn mutable_declaration_is_unsupported() {
        for src in ["let config = { port: 3000 };", "export var config = {};"] {
            let err = ObjectLiteralMerger
                .apply("c.ts", src, &params("config", &[("port", 1i64.into())], false))
                .unwrap_err();
            let DomainError::UnsupportedMergeSyntax { reason, .. } = &err else {
                panic!("{src}: expected unsupported syntax, got {err:?}");
            };
            assert!(reason.contains("declared with"), "{src}: {reason}");
        }
    }

    #[test]
    fn unrelated_let_does_not_block_merge() {
        let src = "let configured = true;\nconst config = { a: 1 };\n";
        let out = ObjectLiteralMerger
            .apply("c.ts", src, &params("config", &[("b", 2i64.into())], false))
            .unwrap();
        assert!(out.contains("  a: 1,\n  b: 2,\n"), "{out}");
        assert!(!out.contains("export const config"), "{out}");
    }

    #[test]
    fn similar_names_are_not_confused() {
        let src = "const configBase = { a: 1 };\nconst config = { b: 2 };\n";
        let out = ObjectLiteralMerger
            .apply("c.ts", src, &params("config", &[("c", 3i64.into())], false))
            .unwrap();
        assert!(out.starts_with(
            "const configBase = { a: 1 };\nconst config = {\n  b: 2,\n  c: 3,\n};"
        ));
    }

    #[test]
    fn is_idempotent() {
        let p = params("authConfig", &[("trustHost", true.into()), ("name", "it's".into())], false);
        for src in ["", "const authConfig = { a, b: 'x', };\n"] {
            let once = ObjectLiteralMerger.apply("a.ts", src, &p).unwrap();
            let twice = ObjectLiteralMerger.apply("a.ts", &once, &p).unwrap();
            assert_eq!(once, twice);
        }
    }
}
