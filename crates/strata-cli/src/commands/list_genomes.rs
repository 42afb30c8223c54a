//! Implementation of the `strata list-genomes` command.

use serde::Serialize;

use strata_adapters::genomes::{self, Genome};

use crate::{
    cli::{ListFormat, ListGenomesArgs, OutputFormat},
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct GenomeRow {
    name: &'static str,
    description: &'static str,
    modules: Vec<String>,
}

impl From<&Genome> for GenomeRow {
    fn from(genome: &Genome) -> Self {
        Self {
            name: genome.name,
            description: genome.description,
            modules: genome.modules.iter().map(|m| m.key().to_string()).collect(),
        }
    }
}

pub fn execute(args: ListGenomesArgs, output: OutputManager) -> CliResult<()> {
    let rows: Vec<GenomeRow> = genomes::all().iter().map(GenomeRow::from).collect();

    let format = if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            output.header("Available genomes:")?;
            for row in &rows {
                output.print(&format!("  {:<14} {}", row.name, row.description))?;
                output.print(&format!("  {:<14} {}", "", row.modules.join(", ")))?;
            }
        }
        ListFormat::Json => output.json(&rows)?,
        ListFormat::List => {
            for row in &rows {
                output.print(row.name)?;
            }
        }
        ListFormat::Csv => {
            output.print("name,modules")?;
            for row in &rows {
                output.print(&format!("{},{}", row.name, row.modules.join(";")))?;
            }
        }
    }
    Ok(())
}
