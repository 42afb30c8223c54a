use crate::domain::{
    error::DomainError,
    modifiers::{FileModifier, string_list},
    parameters::{ParameterDef, ParameterSchema, ResolvedParameters},
    value_objects::ParameterType,
};

/// Appends lines that are not already in the file, e.g. `.gitignore` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAppender;

impl FileModifier for LineAppender {
    fn name(&self) -> &'static str {
        "line-appender"
    }

    fn params_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with(
            ParameterDef::new("lines", ParameterType::Array)
                .required()
                .description("Lines to append when missing"),
        )
    }

    fn apply(
        &self,
        _path: &str,
        source: &str,
        params: &ResolvedParameters,
    ) -> Result<String, DomainError> {
        let mut out = source.to_string();
        let mut present: Vec<String> = source.lines().map(|l| l.trim().to_string()).collect();

        for line in string_list(params, "lines")? {
            let trimmed = line.trim();
            if trimmed.is_empty() || present.iter().any(|p| p == trimmed) {
                continue;
            }
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(trimmed);
            out.push('\n');
            present.push(trimmed.to_string());
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ParameterValue;

    fn params(lines: &[&str]) -> ResolvedParameters {
        [(
            "lines".to_string(),
            ParameterValue::Array(lines.iter().map(|l| ParameterValue::from(*l)).collect()),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn appends_only_missing_lines() {
        let out = LineAppender
            .apply(".gitignore", "node_modules\n.env", &params(&[".env", ".drizzle", ".drizzle"]))
            .unwrap();
        assert_eq!(out, "node_modules\n.env\n.drizzle\n");
    }

    #[test]
    fn is_idempotent() {
        let p = params(&["dist", "coverage"]);
        let once = LineAppender.apply(".gitignore", "", &p).unwrap();
        let twice = LineAppender.apply(".gitignore", &once, &p).unwrap();
        assert_eq!(once, twice);
    }
}
