#![allow(clippy::doc_markdown)]
//! `VelesDB` Stats CLI - build, inspect and query column statistics files
//!
//! Usage:
//!   `velesdb-stats build --column price --type Float64 --kinds tdigest,uniq --input prices.txt --output ./part`
//!   `velesdb-stats inspect ./part/statistics_price.stats`
//!   `velesdb-stats estimate ./part/statistics_price.stats --column price --type Float64 --kinds tdigest,uniq --op less --value 10`

mod commands;
mod literal;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{ColumnArgs, Operation, OutputFormat};
use std::path::PathBuf;
use velesdb_stats::{initialize_registry, StatsConfig};

#[derive(Parser)]
#[command(name = "velesdb-stats")]
#[command(
    author,
    version,
    about = "VelesDB Stats CLI - Column statistics for the query optimizer"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./velesdb-stats.toml when present)
    #[arg(long, global = true, env = "VELESDB_STATS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a statistics file from one value per line
    Build {
        /// Column name
        #[arg(long)]
        column: String,

        /// Column data type, e.g. Int64 or Nullable(String)
        #[arg(long = "type")]
        data_type: String,

        /// Statistics kinds (tdigest, uniq, count_min)
        #[arg(long, value_delimiter = ',', required = true)]
        kinds: Vec<String>,

        /// Input file, one value per line
        #[arg(long)]
        input: PathBuf,

        /// Output directory (the table part)
        #[arg(long)]
        output: PathBuf,

        /// Values per update batch
        #[arg(long, default_value = "8192")]
        batch_size: usize,
    },

    /// Show the header of a statistics file
    Inspect {
        /// Statistics file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Estimate the rows matching a comparison
    Estimate {
        /// Statistics file
        file: PathBuf,

        /// Column name
        #[arg(long)]
        column: String,

        /// Column data type
        #[arg(long = "type")]
        data_type: String,

        /// Statistics kinds currently declared on the column
        #[arg(long, value_delimiter = ',', required = true)]
        kinds: Vec<String>,

        /// Comparison operator
        #[arg(long, value_enum)]
        op: Operation,

        /// Literal to compare against
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<StatsConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            StatsConfig::load_from_path(path)?
        }
        None => StatsConfig::load()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    logging::init(&config.logging);
    initialize_registry(&config)?;

    match cli.command {
        Commands::Build {
            column,
            data_type,
            kinds,
            input,
            output,
            batch_size,
        } => {
            let args = ColumnArgs {
                column: &column,
                data_type: &data_type,
                kinds: &kinds,
            };
            commands::build(&args, &input, &output, batch_size)?;
        }
        Commands::Inspect { file, format } => {
            commands::inspect(&file, format)?;
        }
        Commands::Estimate {
            file,
            column,
            data_type,
            kinds,
            op,
            value,
        } => {
            let args = ColumnArgs {
                column: &column,
                data_type: &data_type,
                kinds: &kinds,
            };
            commands::estimate(&args, &file, op, &value)?;
        }
    }

    Ok(())
}
