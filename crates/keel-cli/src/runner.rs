use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keel_catalog::TableInfo;
use keel_common::config::AppConfig;
use keel_iceberg::{to_partition_fields, PartitionFieldParser, Schema};
use keel_telemetry::init_logger;
use log::debug;

#[derive(Parser)]
#[command(version, name = "keel")]
#[command(about = "Validate and normalize partition field declarations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse declarations into a partition spec and print their canonical form
    Parse {
        /// Path to the Iceberg schema JSON file
        #[arg(long)]
        schema: PathBuf,
        /// Print the bound partition spec as JSON
        #[arg(long, default_value = "false")]
        json: bool,
        /// Match column names case-sensitively
        #[arg(long, default_value = "false")]
        case_sensitive: bool,
        #[arg(required = true)]
        declarations: Vec<String>,
    },
    /// Validate declarations and report every error
    Check {
        /// Path to the Iceberg schema JSON file
        #[arg(long)]
        schema: PathBuf,
        /// Match column names case-sensitively
        #[arg(long, default_value = "false")]
        case_sensitive: bool,
        #[arg(required = true)]
        declarations: Vec<String>,
    },
    /// Print the partitioning of a table description
    Table {
        /// Path to the table description JSON file
        path: PathBuf,
    },
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logger(&config.logging)?;

    let cli = Cli::parse_from(args);
    let parser = PartitionFieldParser::new(&config.partition)?;

    match cli.command {
        Command::Parse {
            schema,
            json,
            case_sensitive,
            declarations,
        } => {
            let schema = read_schema(&schema)?;
            let parser =
                parser.with_case_sensitive(config.partition.case_sensitive || case_sensitive);
            println!("{}", parse(&parser, &schema, &declarations, json)?);
        }
        Command::Check {
            schema,
            case_sensitive,
            declarations,
        } => {
            let schema = read_schema(&schema)?;
            let parser =
                parser.with_case_sensitive(config.partition.case_sensitive || case_sensitive);
            let errors = check(&parser, &schema, &declarations);
            report_errors(&mut std::io::stderr().lock(), &errors)?;
            if !errors.is_empty() {
                let message = format!("{} invalid partition field declaration(s)", errors.len());
                return Err(message.into());
            }
        }
        Command::Table { path } => {
            let table: TableInfo = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let spec = table.partition_spec(&parser)?;
            let schema = table.schema()?;
            println!("{}", table.schema_table_name());
            for declaration in to_partition_fields(&schema, &spec)? {
                println!("  {declaration}");
            }
        }
    }
    Ok(())
}

fn read_schema(path: &Path) -> Result<Schema, Box<dyn std::error::Error>> {
    debug!("reading schema from {}", path.display());
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn parse(
    parser: &PartitionFieldParser,
    schema: &Schema,
    declarations: &[String],
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let spec = parser.parse_all(schema, declarations)?;
    if json {
        Ok(serde_json::to_string_pretty(&spec)?)
    } else {
        Ok(to_partition_fields(schema, &spec)?.join("\n"))
    }
}

fn check(parser: &PartitionFieldParser, schema: &Schema, declarations: &[String]) -> Vec<String> {
    declarations
        .iter()
        .filter_map(|d| parser.parse(schema, d).err().map(|e| format!("{d}: {e}")))
        .collect()
}

fn report_errors(out: &mut impl Write, errors: &[String]) -> std::io::Result<()> {
    for message in errors {
        writeln!(out, "{message}")?;
    }
    Ok(())
}
