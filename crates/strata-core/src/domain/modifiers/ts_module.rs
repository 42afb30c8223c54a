//! `ts-module-enhancer`: add imports and exports to a JS/TS module.
//!
//! Params:
//!
//! ```yaml
//! imports:
//!   - { from: "drizzle-orm/pg-core", names: [pgTable, text], default: null }
//! exports:
//!   - "export * from './auth';"
//! ```
//!
//! Named imports are merged into an existing `import { ... } from '<from>'`
//! statement when there is one (multi-line statements are collapsed onto one
//! line, trailing comments kept after it). Otherwise a new statement goes
//! after the last import. Exports are appended when no identical line exists.

use crate::domain::{
    error::DomainError,
    modifiers::{FileModifier, string_list},
    parameters::{ParameterDef, ParameterSchema, ResolvedParameters},
    value_objects::{ParameterType, ParameterValue},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TsModuleEnhancer;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportSpec {
    from: String,
    default: Option<String>,
    names: Vec<String>,
}

/// One parsed `import` statement spanning `start..=end` lines.
#[derive(Debug, Clone)]
struct ImportStmt {
    start: usize,
    end: usize,
    from: String,
    default: Option<String>,
    names: Vec<String>,
    quote: char,
    semicolon: bool,
    /// Trailing comments of the statement's lines, re-attached on rewrite.
    comment: Option<String>,
    /// `import type`, namespace and side-effect imports cannot take names.
    mergeable: bool,
}

impl FileModifier for TsModuleEnhancer {
    fn name(&self) -> &'static str {
        "ts-module-enhancer"
    }

    fn params_schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with(
                ParameterDef::new("imports", ParameterType::Array)
                    .default_value(ParameterValue::Array(Vec::new())),
            )
            .with(
                ParameterDef::new("exports", ParameterType::Array)
                    .default_value(ParameterValue::Array(Vec::new())),
            )
    }

    fn apply(
        &self,
        _path: &str,
        source: &str,
        params: &ResolvedParameters,
    ) -> Result<String, DomainError> {
        let specs = import_specs(params)?;
        let exports = string_list(params, "exports")?;

        let mut lines: Vec<String> = source.lines().map(str::to_string).collect();
        let mut changed = false;

        for spec in &specs {
            changed |= add_import(&mut lines, spec);
        }

        for export in &exports {
            let wanted = export.trim();
            if wanted.is_empty() {
                continue;
            }
            let bare = wanted.trim_end_matches(';');
            let present = lines
                .iter()
                .any(|l| l.trim().trim_end_matches(';') == bare);
            if !present {
                lines.push(wanted.to_string());
                changed = true;
            }
        }

        if !changed {
            return Ok(source.to_string());
        }

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

fn import_specs(params: &ResolvedParameters) -> Result<Vec<ImportSpec>, DomainError> {
    let invalid = |reason: String| DomainError::InvalidParameter {
        parameter: "imports".into(),
        reason,
    };

    let Some(items) = params.get("imports").and_then(ParameterValue::as_array) else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            let obj = item
                .as_object()
                .ok_or_else(|| invalid(format!("expected an object, got {}", item.kind())))?;
            let from = obj
                .get("from")
                .and_then(ParameterValue::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| invalid("each import needs a 'from' string".into()))?
                .to_string();
            let default = obj
                .get("default")
                .and_then(ParameterValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let names = match obj.get("names") {
                None => Vec::new(),
                Some(ParameterValue::Array(names)) => names
                    .iter()
                    .map(|n| {
                        n.as_str()
                            .map(|s| s.trim().to_string())
                            .ok_or_else(|| invalid("import names must be strings".into()))
                    })
                    .collect::<Result<_, _>>()?,
                Some(other) => {
                    return Err(invalid(format!(
                        "'names' must be an array, got {}",
                        other.kind()
                    )));
                }
            };
            if default.is_none() && names.is_empty() {
                return Err(invalid(format!("import from '{from}' has neither names nor default")));
            }
            Ok(ImportSpec { from, default, names })
        })
        .collect()
}

/// Returns whether `lines` changed.
fn add_import(lines: &mut Vec<String>, spec: &ImportSpec) -> bool {
    let statements = parse_imports(lines);

    if let Some(stmt) = statements.iter().find(|s| s.mergeable && s.from == spec.from) {
        let mut names = stmt.names.clone();
        for name in &spec.names {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        let default = stmt.default.clone().or_else(|| spec.default.clone());

        if names == stmt.names && default == stmt.default {
            return false;
        }

        let indent: String = lines[stmt.start]
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();
        let mut line = format!(
            "{indent}{}",
            render_import(default.as_deref(), &names, &stmt.from, stmt.quote, stmt.semicolon)
        );
        if let Some(comment) = &stmt.comment {
            line.push(' ');
            line.push_str(comment);
        }
        lines.splice(stmt.start..=stmt.end, [line]);
        return true;
    }

    let (quote, semicolon, at) = match statements.last() {
        Some(last) => (last.quote, last.semicolon, last.end + 1),
        None => ('\'', true, directive_end(lines)),
    };
    lines.insert(
        at,
        render_import(spec.default.as_deref(), &spec.names, &spec.from, quote, semicolon),
    );
    true
}

fn render_import(
    default: Option<&str>,
    names: &[String],
    from: &str,
    quote: char,
    semicolon: bool,
) -> String {
    let clause = match (default, names.is_empty()) {
        (Some(d), true) => d.to_string(),
        (Some(d), false) => format!("{d}, {{ {} }}", names.join(", ")),
        (None, _) => format!("{{ {} }}", names.join(", ")),
    };
    format!(
        "import {clause} from {quote}{from}{quote}{}",
        if semicolon { ";" } else { "" }
    )
}

/// Index just past a leading `"use client"`/`"use server"` directive.
fn directive_end(lines: &[String]) -> usize {
    for (i, line) in lines.iter().enumerate() {
        let t = line.trim().trim_end_matches(';');
        if t.is_empty() {
            continue;
        }
        let unquoted = t.trim_matches(|c| c == '\'' || c == '"');
        if unquoted != t && unquoted.starts_with("use ") {
            return i + 1;
        }
        return 0;
    }
    0
}

fn parse_imports(lines: &[String]) -> Vec<ImportStmt> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !starts_import(&lines[i]) {
            i += 1;
            continue;
        }

        // Accumulate until a line's code ends with the module specifier's quote.
        let mut text = String::new();
        let mut comments = Vec::new();
        let mut end = None;
        for (j, line) in lines.iter().enumerate().skip(i).take(64) {
            if j > i && starts_import(line) {
                break;
            }
            let (code, comment) = split_comment(line);
            if let Some(comment) = comment {
                comments.push(comment.to_string());
            }
            text.push_str(code.trim());
            text.push(' ');
            let tail = code.trim_end().trim_end_matches(';');
            if tail.ends_with('\'') || tail.ends_with('"') {
                end = Some(j);
                break;
            }
        }

        let Some(end) = end else {
            i += 1;
            continue;
        };

        if let Some(mut stmt) = parse_statement(text.trim(), i, end) {
            stmt.comment = (!comments.is_empty()).then(|| comments.join(" "));
            out.push(stmt);
        }
        i = end + 1;
    }

    out
}

fn starts_import(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ") || t.starts_with("import{")
}

/// Split `line` into code and a trailing `// ...` or `/* ... */` comment.
///
/// Comment markers inside string literals are ignored. A block comment only
/// counts when nothing but whitespace follows its end.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    return (&line[..i], Some(line[i..].trim_end()));
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    if let Some(close) = line[i + 2..].find("*/") {
                        let after = i + 2 + close + 2;
                        if line[after..].trim().is_empty() {
                            return (&line[..i], Some(line[i..after].trim_end()));
                        }
                        i = after;
                        continue;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    (line, None)
}

fn parse_statement(text: &str, start: usize, end: usize) -> Option<ImportStmt> {
    let semicolon = text.ends_with(';');
    let body = text.trim_end_matches(';').trim();
    if !body.starts_with("import") {
        return None;
    }

    let quote = body.chars().last()?;
    let open = body[..body.len() - 1].rfind(quote)?;
    let from = body[open + 1..body.len() - 1].to_string();

    let before_spec = body[..open].trim_end();
    let Some(clause_end) = before_spec.strip_suffix("from") else {
        // Side-effect import: `import './styles.css'`.
        return Some(ImportStmt {
            start,
            end,
            from,
            default: None,
            names: Vec::new(),
            quote,
            semicolon,
            comment: None,
            mergeable: false,
        });
    };
    let clause = clause_end
        .strip_prefix("import")
        .unwrap_or(clause_end)
        .trim();

    let type_only = clause.starts_with("type ") || clause.starts_with("type{");
    let (default_part, names) = match (clause.find('{'), clause.rfind('}')) {
        (Some(o), Some(c)) if o < c => {
            let names = clause[o + 1..c]
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            (clause[..o].trim().trim_end_matches(',').trim(), names)
        }
        _ => (clause, Vec::new()),
    };

    let namespace = default_part.starts_with('*');
    let default = (!default_part.is_empty() && !namespace).then(|| default_part.to_string());

    Some(ImportStmt {
        start,
        end,
        from,
        default,
        names,
        quote,
        semicolon,
        comment: None,
        mergeable: !type_only && !namespace,
    })
}
