//! Implementation of the `strata list` command.

use strata_core::{
    application::{AdapterDetails, AdapterInfo, AdapterService},
    domain::{ModuleCategory, ModuleKey},
    error::StrataError,
};

use crate::{
    cli::{ListArgs, ListFormat, OutputFormat},
    commands::build_registry,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = AdapterService::new(build_registry(&config)?);
    let format = effective_format(args.format, &output);

    match args.filter.as_deref() {
        Some(filter) if filter.contains(':') => {
            let key = ModuleKey::parse(filter).map_err(StrataError::from)?;
            let details = service.describe(&key).map_err(|e| match e {
                StrataError::Application(_) => CliError::UnknownModule { module: filter.into() },
                other => CliError::Core(other),
            })?;
            describe(&details, format, &output)
        }
        Some(filter) => {
            let category = filter.parse::<ModuleCategory>().map_err(StrataError::from)?;
            render(&service.list(Some(category)), format, &output)
        }
        None => render(&service.list(None), format, &output),
    }
}

/// `--output-format json` applies to listings as well.
fn effective_format(requested: ListFormat, output: &OutputManager) -> ListFormat {
    if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        requested
    }
}

fn render(adapters: &[AdapterInfo], format: ListFormat, output: &OutputManager) -> CliResult<()> {
    match format {
        ListFormat::Table => {
            output.header("Available adapters:")?;
            for line in table_rows(adapters) {
                output.print(&line)?;
            }
        }
        ListFormat::Json => output.json(adapters)?,
        ListFormat::List => {
            for adapter in adapters {
                output.print(&adapter.key)?;
            }
        }
        ListFormat::Csv => {
            output.print("key,name,version,requires,conflicts")?;
            for adapter in adapters {
                output.print(&format!(
                    "{},{},{},{},{}",
                    adapter.key,
                    csv_field(&adapter.name),
                    adapter.version,
                    adapter.requires.join(";"),
                    adapter.conflicts.join(";"),
                ))?;
            }
        }
    }
    Ok(())
}

fn table_rows(adapters: &[AdapterInfo]) -> Vec<String> {
    let width = adapters.iter().map(|a| a.key.len()).max().unwrap_or(0);
    adapters
        .iter()
        .map(|a| {
            let mut row = format!("  {:<width$}  {:<7}  {}", a.key, a.version, a.description);
            if !a.requires.is_empty() {
                row.push_str(&format!(" [requires {}]", a.requires.join(", ")));
            }
            row
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn describe(details: &AdapterDetails, format: ListFormat, output: &OutputManager) -> CliResult<()> {
    if format == ListFormat::Json {
        output.json(details)?;
        return Ok(());
    }

    let info = &details.info;
    output.header(&format!("{} ({}) v{}", info.name, info.key, info.version))?;
    if !info.description.is_empty() {
        output.print(&format!("  {}", info.description))?;
    }
    for (label, values) in [
        ("Requires", &info.requires),
        ("Conflicts", &info.conflicts),
        ("Capabilities", &info.capabilities),
    ] {
        if !values.is_empty() {
            output.print(&format!("  {label}: {}", values.join(", ")))?;
        }
    }

    if !details.parameters.is_empty() {
        output.print("")?;
        output.print("  Parameters:")?;
        for param in &details.parameters {
            let mut line = format!("    {} ({})", param.name, param.param_type);
            if param.required {
                line.push_str(" required");
            }
            if let Some(default) = &param.default {
                line.push_str(&format!(" default={default}"));
            }
            if !param.choices.is_empty() {
                line.push_str(&format!(" [{}]", param.choices.join("|")));
            }
            if !param.description.is_empty() {
                line.push_str(&format!(": {}", param.description));
            }
            output.print(&line)?;
        }
    }

    output.print("")?;
    output.print(&format!("  Actions: {}", details.actions.join(", ")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(key: &str, requires: &[&str]) -> AdapterInfo {
        AdapterInfo {
            key: key.into(),
            name: key.into(),
            description: "desc".into(),
            version: "1.0.0".into(),
            requires: requires.iter().map(|s| s.to_string()).collect(),
            conflicts: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    #[test]
    fn table_rows_align_keys_and_show_requirements() {
        let rows = table_rows(&[info("ui:shadcn", &[]), info("auth:better-auth", &["drizzle"])]);
        assert_eq!(rows[0], "  ui:shadcn         1.0.0    desc");
        assert_eq!(rows[1], "  auth:better-auth  1.0.0    desc [requires drizzle]");
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("Stripe"), "Stripe");
        assert_eq!(csv_field("Auth, the \"good\" one"), "\"Auth, the \"\"good\"\" one\"");
    }
}
