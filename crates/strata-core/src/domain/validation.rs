use crate::domain::{
    entities::{AdapterMetadata, Blueprint, Recipe},
    error::DomainError,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_recipe(recipe: &Recipe) -> Result<(), DomainError> {
        recipe.validate()
    }

    pub fn validate_blueprint(blueprint: &Blueprint) -> Result<(), DomainError> {
        blueprint.validate()
    }

    /// Metadata must describe the module it is registered under.
    pub fn validate_metadata(metadata: &AdapterMetadata) -> Result<(), DomainError> {
        if metadata.id.trim().is_empty() || metadata.id.contains(':') {
            return Err(DomainError::InvalidModuleKey(metadata.id.clone()));
        }
        if metadata.name.trim().is_empty() {
            return Err(DomainError::InvalidBlueprint {
                blueprint: metadata.id.clone(),
                reason: "adapter name must not be empty".into(),
            });
        }
        if let Some(cap) = metadata
            .capabilities
            .iter()
            .find(|c| c.category() != metadata.category)
        {
            return Err(DomainError::InvalidBlueprint {
                blueprint: metadata.id.clone(),
                reason: format!(
                    "{} capability declared on a {} adapter",
                    cap.category(),
                    metadata.category
                ),
            });
        }
        Ok(())
    }
}
