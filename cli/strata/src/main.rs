//! Strata CLI — pack, unpack and inspect binary layouts.

mod commands;
mod hex;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use strata_schema::Schema;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "strata", version, about = "Typed binary layouts")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Schema file (default: nearest strata.toml)
    #[arg(long, global = true)]
    schema: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON value as bytes
    Pack {
        /// Layout name (declared type or built-in scalar)
        type_name: String,
        /// Value as JSON (e.g. '[[0, 1], [256, 257]]')
        #[arg(long)]
        value: String,
        /// Write raw bytes to this file instead of printing hex
        #[arg(long)]
        output: Option<String>,
        /// Also print the dump of the encoded bytes
        #[arg(long)]
        dump: bool,
    },
    /// Decode bytes into a JSON value
    Unpack {
        /// Layout name (declared type or built-in scalar)
        type_name: String,
        /// Input bytes as hex (whitespace allowed)
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        hex: Option<String>,
        /// Read raw bytes from this file
        #[arg(long)]
        input: Option<String>,
        /// Print the per-field dump
        #[arg(long)]
        dump: bool,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the static size of a layout
    Size {
        /// Layout name (declared type or built-in scalar)
        type_name: String,
    },
    /// List declared and built-in types
    Types,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let schema = load_schema(&cwd, cli.schema.as_deref())?;

    match cli.command {
        Commands::Pack {
            type_name,
            value,
            output,
            dump,
        } => commands::pack::run(&schema, &type_name, &value, output.as_deref(), dump),

        Commands::Unpack {
            type_name,
            hex,
            input,
            dump,
            format,
        } => {
            let format = format.parse()?;
            commands::unpack::run(
                &schema,
                &type_name,
                hex.as_deref(),
                input.as_deref(),
                dump,
                format,
            )
        }

        Commands::Size { type_name } => commands::size::run(&schema, &type_name),

        Commands::Types => commands::types::run(&schema),
    }
}

/// Load the schema named on the command line, or the nearest `strata.toml`.
///
/// Without either, only the built-in scalars are available.
fn load_schema(cwd: &Path, explicit: Option<&str>) -> anyhow::Result<Schema> {
    if let Some(path) = explicit {
        let path = Path::new(path);
        return Schema::load(path).with_context(|| format!("loading {}", path.display()));
    }
    match Schema::find_and_load(cwd).context("loading strata.toml")? {
        Some((schema, dir)) => {
            debug!(dir = %dir.display(), "using project schema");
            Ok(schema)
        }
        None => Ok(Schema::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_schema_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_schema(dir.path(), missing.to_str()).unwrap_err();
        assert!(format!("{err:#}").contains("loading"));
    }

    #[test]
    fn falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let schema = load_schema(dir.path(), None).unwrap();
        assert_eq!(schema.type_names().count(), 0);
        assert!(schema.layout("UInt16").is_ok());
    }

    #[test]
    fn cli_parses_unpack() {
        let cli = Cli::try_parse_from(["strata", "-vv", "unpack", "Matrix", "--hex", "00 01"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Unpack { ref hex, .. } if hex.as_deref() == Some("00 01")));
        assert!(Cli::try_parse_from(["strata", "unpack", "Matrix"]).is_err());
    }
}
