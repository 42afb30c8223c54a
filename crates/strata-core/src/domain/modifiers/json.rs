use crate::domain::{
    error::DomainError,
    merge::{deep_merge, parse_object, to_pretty_json},
    modifiers::FileModifier,
    parameters::{ParameterDef, ParameterSchema, ResolvedParameters},
    value_objects::ParameterType,
};

/// Deep-merges the `content` object into a JSON file (tsconfig, components.json, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMerger;

impl FileModifier for JsonMerger {
    fn name(&self) -> &'static str {
        "json-merger"
    }

    fn params_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with(ParameterDef::new("content", ParameterType::Object).required())
    }

    fn apply(
        &self,
        path: &str,
        source: &str,
        params: &ResolvedParameters,
    ) -> Result<String, DomainError> {
        let overlay = params
            .get("content")
            .map(|v| v.to_json())
            .unwrap_or_default();

        let mut base = if source.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            parse_object(path, source)?
        };
        let before = base.clone();
        deep_merge(&mut base, overlay);

        if base == before {
            return Ok(source.to_string());
        }
        to_pretty_json(path, &base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ParameterValue;

    fn params(json: serde_json::Value) -> ResolvedParameters {
        [(
            "content".to_string(),
            ParameterValue::from_json(&json).unwrap(),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn merges_compiler_options() {
        let src = r#"{"compilerOptions":{"strict":true}}"#;
        let out = JsonMerger
            .apply(
                "tsconfig.json",
                src,
                &params(serde_json::json!({"compilerOptions": {"paths": {"@/*": ["./src/*"]}}})),
            )
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["compilerOptions"]["strict"], true);
        assert_eq!(value["compilerOptions"]["paths"]["@/*"][0], "./src/*");
    }

    #[test]
    fn unchanged_file_is_left_byte_for_byte() {
        let src = "{ \"a\": 1 }";
        let out = JsonMerger
            .apply("x.json", src, &params(serde_json::json!({"a": 1})))
            .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn is_idempotent() {
        let p = params(serde_json::json!({"b": [1, 2], "c": {"d": false}}));
        let once = JsonMerger.apply("x.json", "{\"a\":1}", &p).unwrap();
        let twice = JsonMerger.apply("x.json", &once, &p).unwrap();
        assert_eq!(once, twice);
    }
}
