//! Subcommand implementations.

use crate::literal::parse_literal;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use velesdb_stats::{
    registry, ColumnStatistics, ColumnSummaryDescription, DataType, PayloadHeader, Value,
    STATS_FILE_SUFFIX,
};

/// Comparison evaluated by `estimate`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Operation {
    /// `column < value`
    Less,
    /// `column > value`
    Greater,
    /// `column = value`
    Equal,
}

/// Output format of `inspect`.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// JSON object.
    Json,
}

/// Column declaration shared by `build` and `estimate`.
pub struct ColumnArgs<'a> {
    pub column: &'a str,
    pub data_type: &'a str,
    pub kinds: &'a [String],
}

impl ColumnArgs<'_> {
    fn container(&self) -> Result<ColumnStatistics> {
        let data_type: DataType = self.data_type.parse()?;
        let description =
            ColumnSummaryDescription::from_kind_names(self.column, data_type, self.kinds)?;
        let registry = registry()?;
        registry.validate(&description, description.data_type())?;
        Ok(registry.get(&description)?)
    }
}

/// Builds statistics from a file holding one value per line.
pub fn build(
    column: &ColumnArgs<'_>,
    input: &Path,
    output: &Path,
    batch_size: usize,
) -> Result<PathBuf> {
    if batch_size == 0 {
        bail!("--batch-size must be positive");
    }
    let mut stats = column.container()?;
    let data_type = stats.description().data_type().clone();

    let file = fs::File::open(input)
        .with_context(|| format!("Failed to open input {}", input.display()))?;
    let mut batch: Vec<Value> = Vec::with_capacity(batch_size);
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let value = parse_literal(&line, &data_type)
            .with_context(|| format!("{}:{}", input.display(), line_no + 1))?;
        batch.push(value);
        if batch.len() == batch_size {
            stats.update(&batch);
            batch.clear();
        }
    }
    if !batch.is_empty() {
        stats.update(&batch);
    }

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join(format!("{}{STATS_FILE_SUFFIX}", stats.file_name()));
    fs::write(&path, stats.to_bytes()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = stats.row_count(), "statistics written");
    println!(
        "{} {} rows of column '{}' into {}",
        "Wrote".green().bold(),
        stats.row_count(),
        stats.column_name(),
        path.display()
    );
    Ok(path)
}

#[derive(Serialize)]
struct InspectReport {
    file: String,
    version: u16,
    kinds: Vec<&'static str>,
    rows: u64,
    size_bytes: usize,
}

/// Prints the header of a statistics file.
pub fn inspect(file: &Path, format: OutputFormat) -> Result<()> {
    let bytes =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let header = PayloadHeader::read(&mut bytes.as_slice())?;

    let report = InspectReport {
        file: file.display().to_string(),
        version: header.version as u16,
        kinds: header.kinds().map(|kind| kind.name()).collect(),
        rows: header.row_count,
        size_bytes: bytes.len(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Property").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);
            table.add_row(vec![Cell::new("File"), Cell::new(&report.file)]);
            table.add_row(vec![Cell::new("Version"), Cell::new(report.version)]);
            table.add_row(vec![
                Cell::new("Kinds"),
                Cell::new(if report.kinds.is_empty() {
                    "-".to_string()
                } else {
                    report.kinds.join(", ")
                }),
            ]);
            table.add_row(vec![Cell::new("Rows"), Cell::new(report.rows)]);
            table.add_row(vec![Cell::new("Size (bytes)"), Cell::new(report.size_bytes)]);
            println!("{table}");
        }
    }
    Ok(())
}

/// Restores a statistics file and prints one estimate.
pub fn estimate(
    column: &ColumnArgs<'_>,
    file: &Path,
    op: Operation,
    value: &str,
) -> Result<f64> {
    let mut stats = column.container()?;
    let bytes =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    stats.deserialize_from_slice(&bytes)?;

    let literal = parse_literal(value, stats.description().data_type())?;
    let estimate = match op {
        Operation::Less => stats.estimate_less(&literal)?,
        Operation::Greater => stats.estimate_greater(&literal)?,
        Operation::Equal => stats.estimate_equal(&literal)?,
    };

    println!("{estimate}");
    Ok(estimate)
}
