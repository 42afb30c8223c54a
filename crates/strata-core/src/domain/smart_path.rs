//! Smart paths: layout-independent names for generated file locations.
//!
//! Blueprints write to `{{paths.auth_config}}/index.ts` instead of a hard-coded
//! directory. [`SmartPathResolver`] turns the key into a relative path for the
//! project's layout, consulting registered [`PathOverride`]s first.
//!
//! # Override priority
//!
//! `user` > `adapter` > `framework` > `genome-default`. Within one source an
//! override scoped to the current module beats an unscoped one. When several
//! overrides tie, the one registered last wins. Every resolution that uses an
//! override yields a [`PathOverrideWarning`] naming the winner.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

// ── SmartPathKey ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartPathKey {
    AuthConfig,
    AuthHooks,
    AuthTypes,
    DbConfig,
    DbSchema,
    DbClient,
    ApiRoutes,
    ApiHandlers,
    ApiMiddleware,
    SharedSchemas,
    SharedTypes,
    SharedUtils,
    StateStores,
    StateProviders,
    PaymentConfig,
    PaymentHooks,
    PaymentTypes,
    TeamsConfig,
    TeamsHooks,
    TeamsTypes,
    EmailConfig,
    EmailHooks,
    EmailTypes,
}

impl SmartPathKey {
    pub const ALL: [SmartPathKey; 23] = [
        Self::AuthConfig,
        Self::AuthHooks,
        Self::AuthTypes,
        Self::DbConfig,
        Self::DbSchema,
        Self::DbClient,
        Self::ApiRoutes,
        Self::ApiHandlers,
        Self::ApiMiddleware,
        Self::SharedSchemas,
        Self::SharedTypes,
        Self::SharedUtils,
        Self::StateStores,
        Self::StateProviders,
        Self::PaymentConfig,
        Self::PaymentHooks,
        Self::PaymentTypes,
        Self::TeamsConfig,
        Self::TeamsHooks,
        Self::TeamsTypes,
        Self::EmailConfig,
        Self::EmailHooks,
        Self::EmailTypes,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthConfig => "auth_config",
            Self::AuthHooks => "auth_hooks",
            Self::AuthTypes => "auth_types",
            Self::DbConfig => "db_config",
            Self::DbSchema => "db_schema",
            Self::DbClient => "db_client",
            Self::ApiRoutes => "api_routes",
            Self::ApiHandlers => "api_handlers",
            Self::ApiMiddleware => "api_middleware",
            Self::SharedSchemas => "shared_schemas",
            Self::SharedTypes => "shared_types",
            Self::SharedUtils => "shared_utils",
            Self::StateStores => "state_stores",
            Self::StateProviders => "state_providers",
            Self::PaymentConfig => "payment_config",
            Self::PaymentHooks => "payment_hooks",
            Self::PaymentTypes => "payment_types",
            Self::TeamsConfig => "teams_config",
            Self::TeamsHooks => "teams_hooks",
            Self::TeamsTypes => "teams_types",
            Self::EmailConfig => "email_config",
            Self::EmailHooks => "email_hooks",
            Self::EmailTypes => "email_types",
        }
    }

    /// Built-in location, branching only on the layout.
    pub const fn default_path(&self, is_monorepo: bool) -> &'static str {
        match (self, is_monorepo) {
            (Self::AuthConfig, false) => "src/lib/auth/config",
            (Self::AuthConfig, true) => "packages/auth/config",
            (Self::AuthHooks, false) => "src/lib/auth/hooks",
            (Self::AuthHooks, true) => "packages/auth/hooks",
            (Self::AuthTypes, false) => "src/lib/auth/types",
            (Self::AuthTypes, true) => "packages/auth/types",
            (Self::DbConfig, false) => "src/lib/db/config",
            (Self::DbConfig, true) => "packages/db/config",
            (Self::DbSchema, false) => "src/lib/db/schema",
            (Self::DbSchema, true) => "packages/db/schema",
            (Self::DbClient, false) => "src/lib/db/client",
            (Self::DbClient, true) => "packages/db/client",
            (Self::ApiRoutes, false) => "src/app/api",
            (Self::ApiRoutes, true) => "apps/api/src/routes",
            (Self::ApiHandlers, false) => "src/lib/api/handlers",
            (Self::ApiHandlers, true) => "packages/api/handlers",
            (Self::ApiMiddleware, false) => "src/lib/api/middleware",
            (Self::ApiMiddleware, true) => "packages/api/middleware",
            (Self::SharedSchemas, false) => "src/lib/schemas",
            (Self::SharedSchemas, true) => "packages/shared/schemas",
            (Self::SharedTypes, false) => "src/types",
            (Self::SharedTypes, true) => "packages/shared/types",
            (Self::SharedUtils, false) => "src/lib/utils",
            (Self::SharedUtils, true) => "packages/shared/utils",
            (Self::StateStores, false) => "src/lib/stores",
            (Self::StateStores, true) => "packages/state/stores",
            (Self::StateProviders, false) => "src/components/providers",
            (Self::StateProviders, true) => "packages/state/providers",
            (Self::PaymentConfig, false) => "src/lib/payment/config",
            (Self::PaymentConfig, true) => "packages/payment/config",
            (Self::PaymentHooks, false) => "src/lib/payment/hooks",
            (Self::PaymentHooks, true) => "packages/payment/hooks",
            (Self::PaymentTypes, false) => "src/lib/payment/types",
            (Self::PaymentTypes, true) => "packages/payment/types",
            (Self::TeamsConfig, false) => "src/lib/teams/config",
            (Self::TeamsConfig, true) => "packages/teams/config",
            (Self::TeamsHooks, false) => "src/lib/teams/hooks",
            (Self::TeamsHooks, true) => "packages/teams/hooks",
            (Self::TeamsTypes, false) => "src/lib/teams/types",
            (Self::TeamsTypes, true) => "packages/teams/types",
            (Self::EmailConfig, false) => "src/lib/email/config",
            (Self::EmailConfig, true) => "packages/email/config",
            (Self::EmailHooks, false) => "src/lib/email/hooks",
            (Self::EmailHooks, true) => "packages/email/hooks",
            (Self::EmailTypes, false) => "src/lib/email/types",
            (Self::EmailTypes, true) => "packages/email/types",
        }
    }
}

impl fmt::Display for SmartPathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmartPathKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::UnknownSmartPath { key: s.to_string() })
    }
}

// ── Overrides ────────────────────────────────────────────────────────────────

/// Where an override came from. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideSource {
    GenomeDefault,
    Framework,
    Adapter,
    User,
}

impl OverrideSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GenomeDefault => "genome-default",
            Self::Framework => "framework",
            Self::Adapter => "adapter",
            Self::User => "user",
        }
    }
}

impl fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOverride {
    pub key: SmartPathKey,
    pub value: String,
    pub source: OverrideSource,
    pub reason: String,
    /// Restricts the override to one module id.
    pub module: Option<String>,
}

impl PathOverride {
    pub fn new(
        key: SmartPathKey,
        value: impl Into<String>,
        source: OverrideSource,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key,
            value: value.into(),
            source,
            reason: reason.into(),
            module: None,
        }
    }

    pub fn for_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    fn applies_to(&self, key: SmartPathKey, module: Option<&str>) -> bool {
        self.key == key
            && match &self.module {
                None => true,
                Some(scope) => module == Some(scope.as_str()),
            }
    }

    fn rank(&self) -> (OverrideSource, bool) {
        (self.source, self.module.is_some())
    }
}

/// Structured record of an override taking effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathOverrideWarning {
    pub key: SmartPathKey,
    pub value: String,
    pub default: String,
    pub source: OverrideSource,
    pub reason: String,
    /// Other overrides for the same key that lost.
    pub shadowed: Vec<OverrideSource>,
}

impl fmt::Display for PathOverrideWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "smart path '{}' resolved to '{}' (default '{}') by {} override: {}",
            self.key, self.value, self.default, self.source, self.reason
        )?;
        if !self.shadowed.is_empty() {
            let names: Vec<&str> = self.shadowed.iter().map(OverrideSource::as_str).collect();
            write!(f, " [shadowed: {}]", names.join(", "))?;
        }
        Ok(())
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathContext {
    pub is_monorepo: bool,
    pub module_id: Option<String>,
    pub project_root: PathBuf,
}

impl PathContext {
    pub fn new(project_root: impl Into<PathBuf>, is_monorepo: bool) -> Self {
        Self {
            is_monorepo,
            module_id: None,
            project_root: project_root.into(),
        }
    }

    pub fn with_module(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path relative to the project root.
    pub relative: String,
    pub source: Option<OverrideSource>,
    pub warning: Option<PathOverrideWarning>,
}

impl ResolvedPath {
    pub fn absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }
}

/// Pure resolver over a fixed override set.
#[derive(Debug, Clone, Default)]
pub struct SmartPathResolver {
    overrides: Vec<PathOverride>,
}

impl SmartPathResolver {
    pub fn new(overrides: Vec<PathOverride>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &[PathOverride] {
        &self.overrides
    }

    pub fn resolve(&self, key: SmartPathKey, ctx: &PathContext) -> ResolvedPath {
        let default = key.default_path(ctx.is_monorepo);
        let module = ctx.module_id.as_deref();

        let candidates: Vec<&PathOverride> = self
            .overrides
            .iter()
            .filter(|o| o.applies_to(key, module))
            .collect();

        // max_by_key keeps the last of equal maxima, so later registrations win ties.
        let Some(winner) = candidates.iter().copied().max_by_key(|o| o.rank()) else {
            return ResolvedPath {
                relative: default.to_string(),
                source: None,
                warning: None,
            };
        };

        let shadowed = candidates
            .iter()
            .filter(|o| !std::ptr::eq(**o, winner))
            .map(|o| o.source)
            .collect();

        ResolvedPath {
            relative: normalize(&winner.value),
            source: Some(winner.source),
            warning: Some(PathOverrideWarning {
                key,
                value: normalize(&winner.value),
                default: default.to_string(),
                source: winner.source,
                reason: winner.reason.clone(),
                shadowed,
            }),
        }
    }

    /// Resolve every key, for use as `paths.<key>` template variables.
    pub fn resolve_all(
        &self,
        ctx: &PathContext,
    ) -> (BTreeMap<String, String>, Vec<PathOverrideWarning>) {
        let mut paths = BTreeMap::new();
        let mut warnings = Vec::new();

        for key in SmartPathKey::ALL {
            let resolved = self.resolve(key, ctx);
            paths.insert(key.as_str().to_string(), resolved.relative);
            warnings.extend(resolved.warning);
        }

        (paths, warnings)
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> PathContext {
        PathContext::new("/tmp/app", false)
    }

    #[test]
    fn default_table_branches_on_layout() {
        let resolver = SmartPathResolver::default();
        assert_eq!(
            resolver.resolve(SmartPathKey::AuthConfig, &single()).relative,
            "src/lib/auth/config"
        );
        assert_eq!(
            resolver
                .resolve(SmartPathKey::AuthConfig, &PathContext::new("/tmp/app", true))
                .relative,
            "packages/auth/config"
        );
    }

    #[test]
    fn user_beats_adapter_beats_framework() {
        let resolver = SmartPathResolver::new(vec![
            PathOverride::new(SmartPathKey::DbSchema, "db/fw", OverrideSource::Framework, "fw"),
            PathOverride::new(SmartPathKey::DbSchema, "db/user", OverrideSource::User, "user"),
            PathOverride::new(SmartPathKey::DbSchema, "db/adapter", OverrideSource::Adapter, "ad"),
        ]);

        let resolved = resolver.resolve(SmartPathKey::DbSchema, &single());
        assert_eq!(resolved.relative, "db/user");
        assert_eq!(resolved.source, Some(OverrideSource::User));

        let warning = resolved.warning.unwrap();
        assert_eq!(warning.default, "src/lib/db/schema");
        assert_eq!(
            warning.shadowed,
            vec![OverrideSource::Framework, OverrideSource::Adapter]
        );
    }

    #[test]
    fn module_scoped_override_is_more_specific() {
        let resolver = SmartPathResolver::new(vec![
            PathOverride::new(SmartPathKey::AuthConfig, "scoped", OverrideSource::Adapter, "s")
                .for_module("better-auth"),
            PathOverride::new(SmartPathKey::AuthConfig, "global", OverrideSource::Adapter, "g"),
        ]);

        let scoped = resolver.resolve(
            SmartPathKey::AuthConfig,
            &single().with_module("better-auth"),
        );
        assert_eq!(scoped.relative, "scoped");

        let other = resolver.resolve(SmartPathKey::AuthConfig, &single().with_module("clerk"));
        assert_eq!(other.relative, "global");
    }

    #[test]
    fn resolution_is_pure() {
        let resolver = SmartPathResolver::new(vec![PathOverride::new(
            SmartPathKey::ApiRoutes,
            "./server/routes/",
            OverrideSource::GenomeDefault,
            "genome",
        )]);
        let a = resolver.resolve(SmartPathKey::ApiRoutes, &single());
        let b = resolver.resolve(SmartPathKey::ApiRoutes, &single());
        assert_eq!(a, b);
        assert_eq!(a.relative, "server/routes");
    }

    #[test]
    fn no_override_means_no_warning() {
        let (paths, warnings) = SmartPathResolver::default().resolve_all(&single());
        assert_eq!(paths.len(), SmartPathKey::ALL.len());
        assert_eq!(paths["shared_types"], "src/types");
        assert!(warnings.is_empty());
    }

    #[test]
    fn key_parsing_is_exact() {
        assert_eq!("db_schema".parse::<SmartPathKey>().unwrap(), SmartPathKey::DbSchema);
        assert!(matches!(
            "DB_SCHEMA".parse::<SmartPathKey>(),
            Err(DomainError::UnknownSmartPath { .. })
        ));
    }
}
