//! Blueprint: a module's ordered list of file and command actions.
//!
//! Actions run strictly in declaration order. An action may name earlier
//! actions it depends on through `requires`; when one of those failed the
//! executor halts the rest of the blueprint instead of running on top of a
//! broken precondition.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{error::DomainError, value_objects::ParameterValue};

/// Ordered list of actions contributed by one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub actions: Vec<BlueprintAction>,
}

/// One step of a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintAction {
    /// Optional handle other actions can list in `requires`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Template evaluated before the action runs; a falsy result skips it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Create a file or merge into it, depending on what the target is.
    #[serde(alias = "add-content")]
    AddContent { target: String, content: String },

    /// Run a named modifier over an existing file.
    #[serde(alias = "enhance-file")]
    EnhanceFile {
        path: String,
        modifier: String,
        #[serde(default)]
        params: BTreeMap<String, ParameterValue>,
    },

    /// Execute an external command in the project directory.
    #[serde(alias = "run-command")]
    RunCommand { command: String },
}

impl ActionKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AddContent { .. } => "ADD_CONTENT",
            Self::EnhanceFile { .. } => "ENHANCE_FILE",
            Self::RunCommand { .. } => "RUN_COMMAND",
        }
    }

    /// The file path or command line the action operates on.
    pub fn target(&self) -> &str {
        match self {
            Self::AddContent { target, .. } => target,
            Self::EnhanceFile { path, .. } => path,
            Self::RunCommand { command } => command,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.target())
    }
}

impl BlueprintAction {
    fn from_kind(kind: ActionKind) -> Self {
        Self {
            id: None,
            requires: Vec::new(),
            condition: None,
            kind,
        }
    }

    pub fn add_content(target: impl Into<String>, content: impl Into<String>) -> Self {
        Self::from_kind(ActionKind::AddContent {
            target: target.into(),
            content: content.into(),
        })
    }

    pub fn enhance_file(path: impl Into<String>, modifier: impl Into<String>) -> Self {
        Self::from_kind(ActionKind::EnhanceFile {
            path: path.into(),
            modifier: modifier.into(),
            params: BTreeMap::new(),
        })
    }

    pub fn run_command(command: impl Into<String>) -> Self {
        Self::from_kind(ActionKind::RunCommand {
            command: command.into(),
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn requires(mut self, id: impl Into<String>) -> Self {
        self.requires.push(id.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Add a modifier parameter. No-op for non-`ENHANCE_FILE` actions.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        if let ActionKind::EnhanceFile { params, .. } = &mut self.kind {
            params.insert(name.into(), value.into());
        }
        self
    }
}

impl Blueprint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: BlueprintAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check that action ids are unique and every `requires` entry names an
    /// action declared earlier in the list.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut declared = HashSet::new();

        for (index, action) in self.actions.iter().enumerate() {
            for required in &action.requires {
                if !declared.contains(required.as_str()) {
                    return Err(DomainError::InvalidBlueprint {
                        blueprint: self.id.clone(),
                        reason: format!(
                            "action #{index} requires '{required}', which is not declared before it"
                        ),
                    });
                }
            }

            if let Some(id) = &action.id {
                if !declared.insert(id.as_str()) {
                    return Err(DomainError::InvalidBlueprint {
                        blueprint: self.id.clone(),
                        reason: format!("duplicate action id '{id}'"),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_requires_are_valid() {
        let bp = Blueprint::new("drizzle", "Drizzle")
            .with_action(BlueprintAction::run_command("npm install drizzle-orm").with_id("install"))
            .with_action(
                BlueprintAction::add_content("drizzle.config.ts", "x").requires("install"),
            );
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn forward_reference_is_rejected() {
        let bp = Blueprint::new("bp", "bp")
            .with_action(BlueprintAction::add_content("a", "").requires("later"))
            .with_action(BlueprintAction::add_content("b", "").with_id("later"));
        assert!(matches!(
            bp.validate(),
            Err(DomainError::InvalidBlueprint { reason, .. }) if reason.contains("later")
        ));
    }

    #[test]
    fn self_reference_is_rejected() {
        let bp = Blueprint::new("bp", "bp")
            .with_action(BlueprintAction::add_content("a", "").with_id("a").requires("a"));
        assert!(bp.validate().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let bp = Blueprint::new("bp", "bp")
            .with_action(BlueprintAction::add_content("a", "").with_id("x"))
            .with_action(BlueprintAction::add_content("b", "").with_id("x"));
        assert!(bp.validate().is_err());
    }

    #[test]
    fn with_param_only_affects_enhance_file() {
        let action = BlueprintAction::enhance_file("src/index.ts", "line-appender")
            .with_param("lines", "x");
        match action.kind {
            ActionKind::EnhanceFile { params, .. } => assert_eq!(params.len(), 1),
            other => panic!("unexpected kind {other:?}"),
        }

        let cmd = BlueprintAction::run_command("ls").with_param("ignored", true);
        assert_eq!(cmd.kind, ActionKind::RunCommand { command: "ls".into() });
    }

    #[test]
    fn deserializes_tagged_actions() {
        let json = r#"{
            "id": "auth",
            "name": "Better Auth",
            "actions": [
                { "type": "ADD_CONTENT", "target": ".env", "content": "A=1" },
                { "type": "enhance-file", "path": "src/index.ts", "modifier": "line-appender",
                  "params": { "lines": ["x"] }, "condition": "{{module.parameters.enabled}}" },
                { "type": "RUN_COMMAND", "command": "npm install", "id": "install", "requires": [] }
            ]
        }"#;
        let bp: Blueprint = serde_json::from_str(json).unwrap();
        assert_eq!(bp.len(), 3);
        assert_eq!(bp.actions[0].kind.label(), "ADD_CONTENT");
        assert!(bp.actions[1].condition.is_some());
        assert_eq!(bp.actions[2].id.as_deref(), Some("install"));
    }
}
