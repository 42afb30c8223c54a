//! Built-in genomes: named module combinations that expand into a recipe.

use std::collections::BTreeMap;

use serde::Serialize;

use strata_core::domain::{GenomeSpec, ModuleCategory, ModuleRef, Recipe};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Genome {
    pub name: &'static str,
    pub description: &'static str,
    pub modules: Vec<ModuleRef>,
    /// Smart path defaults applied with the lowest priority.
    pub paths: BTreeMap<String, String>,
}

impl Genome {
    /// Expand into a recipe for `project_name`.
    pub fn to_recipe(&self, project_name: &str) -> Recipe {
        let mut recipe = Recipe::new(project_name);
        recipe.project.framework = self
            .modules
            .iter()
            .find(|m| m.category == ModuleCategory::Framework)
            .map(|m| m.id.clone());
        recipe.genome = Some(GenomeSpec {
            name: self.name.to_string(),
            paths: self.paths.clone(),
        });
        recipe.modules = self.modules.clone();
        recipe
    }
}

/// Every built-in genome, in display order.
pub fn all() -> Vec<Genome> {
    vec![saas_starter(), blog(), api_service()]
}

pub fn find(name: &str) -> Option<Genome> {
    all().into_iter().find(|g| g.name == name)
}

fn saas_starter() -> Genome {
    Genome {
        name: "saas-starter",
        description: "Next.js with Drizzle, Better Auth, Stripe, Resend and shadcn/ui",
        modules: vec![
            ModuleRef::new(ModuleCategory::Framework, "nextjs"),
            ModuleRef::new(ModuleCategory::Database, "drizzle"),
            ModuleRef::new(ModuleCategory::Auth, "better-auth"),
            ModuleRef::new(ModuleCategory::Payment, "stripe"),
            ModuleRef::new(ModuleCategory::Email, "resend"),
            ModuleRef::new(ModuleCategory::Ui, "shadcn"),
        ],
        paths: BTreeMap::new(),
    }
}

fn blog() -> Genome {
    Genome {
        name: "blog",
        description: "Next.js with Prisma on SQLite and shadcn/ui",
        modules: vec![
            ModuleRef::new(ModuleCategory::Framework, "nextjs"),
            ModuleRef::new(ModuleCategory::Database, "prisma").with_parameter("provider", "sqlite"),
            ModuleRef::new(ModuleCategory::Ui, "shadcn"),
        ],
        paths: BTreeMap::new(),
    }
}

fn api_service() -> Genome {
    Genome {
        name: "api-service",
        description: "Next.js route handlers backed by Drizzle, tested with Vitest",
        modules: vec![
            ModuleRef::new(ModuleCategory::Framework, "nextjs"),
            ModuleRef::new(ModuleCategory::Database, "drizzle"),
            ModuleRef::new(ModuleCategory::Testing, "vitest"),
        ],
        paths: BTreeMap::from([
            ("api_routes".to_string(), "src/app/api/v1".to_string()),
            ("db_schema".to_string(), "src/db/schema".to_string()),
            ("db_client".to_string(), "src/db".to_string()),
        ]),
    }
}
