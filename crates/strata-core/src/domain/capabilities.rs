//! Category-specific capability records.
//!
//! Every adapter shares one base contract (metadata, parameter schema,
//! blueprint). What a database adapter can do that an email adapter cannot is
//! described by an optional capability record, keyed by category, and read
//! with a plain `match` instead of per-category adapter traits.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ModuleCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum Capability {
    Framework(FrameworkCapability),
    Database(DatabaseCapability),
    Auth(AuthCapability),
    Payment(PaymentCapability),
    Email(EmailCapability),
    Testing(TestingCapability),
    Ui(UiCapability),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkCapability {
    pub language: String,
    pub router: Option<String>,
    pub supports_monorepo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseCapability {
    pub providers: Vec<String>,
    pub migrations: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthCapability {
    pub providers: Vec<String>,
    pub session_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCapability {
    pub subscriptions: bool,
    pub webhooks: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailCapability {
    pub transactional: bool,
    pub templates: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingCapability {
    pub unit: bool,
    pub e2e: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiCapability {
    pub component_library: String,
    pub theming: bool,
}

impl Capability {
    pub const fn category(&self) -> ModuleCategory {
        match self {
            Self::Framework(_) => ModuleCategory::Framework,
            Self::Database(_) => ModuleCategory::Database,
            Self::Auth(_) => ModuleCategory::Auth,
            Self::Payment(_) => ModuleCategory::Payment,
            Self::Email(_) => ModuleCategory::Email,
            Self::Testing(_) => ModuleCategory::Testing,
            Self::Ui(_) => ModuleCategory::Ui,
        }
    }

    /// One-line description for listings.
    pub fn summary(&self) -> String {
        fn flags(pairs: &[(&str, bool)]) -> String {
            let on: Vec<&str> = pairs.iter().filter(|(_, v)| *v).map(|(k, _)| *k).collect();
            if on.is_empty() { "-".into() } else { on.join(", ") }
        }

        match self {
            Self::Framework(c) => {
                let mut s = c.language.clone();
                if let Some(router) = &c.router {
                    s.push_str(&format!(", {router} router"));
                }
                if c.supports_monorepo {
                    s.push_str(", monorepo");
                }
                s
            }
            Self::Database(c) => format!(
                "{}{}",
                c.providers.join("/"),
                if c.migrations { ", migrations" } else { "" }
            ),
            Self::Auth(c) => match &c.session_strategy {
                Some(strategy) => format!("{} ({strategy} sessions)", c.providers.join("/")),
                None => c.providers.join("/"),
            },
            Self::Payment(c) => {
                flags(&[("subscriptions", c.subscriptions), ("webhooks", c.webhooks)])
            }
            Self::Email(c) => {
                flags(&[("transactional", c.transactional), ("templates", c.templates)])
            }
            Self::Testing(c) => flags(&[("unit", c.unit), ("e2e", c.e2e)]),
            Self::Ui(c) => format!(
                "{}{}",
                c.component_library,
                if c.theming { ", theming" } else { "" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_variant() {
        let cap = Capability::Database(DatabaseCapability {
            providers: vec!["postgres".into(), "sqlite".into()],
            migrations: true,
        });
        assert_eq!(cap.category(), ModuleCategory::Database);
        assert_eq!(cap.summary(), "postgres/sqlite, migrations");
    }

    #[test]
    fn deserializes_with_category_tag() {
        let cap: Capability =
            serde_json::from_str(r#"{"category":"payment","webhooks":true}"#).unwrap();
        assert_eq!(
            cap,
            Capability::Payment(PaymentCapability {
                subscriptions: false,
                webhooks: true
            })
        );
        assert_eq!(cap.summary(), "webhooks");
    }
}
