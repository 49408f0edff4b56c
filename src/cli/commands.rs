//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flatten nested document-store records into spreadsheet tables
#[derive(Parser, Debug)]
#[command(name = "docsheet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "xlsx")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export definition
    Export {
        /// Definition file (YAML) or built-in name
        #[arg(short, long)]
        definition: String,

        /// Configuration file (JSON)
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,

        /// Export every batch instead of one
        #[arg(long)]
        fetch_all: bool,

        /// Include soft-deleted records
        #[arg(long)]
        fetch_deleted: bool,

        /// Batch to export (overrides the definition's default)
        #[arg(long)]
        batch_id: Option<String>,

        /// Query groups to run (comma-separated, empty = all)
        #[arg(long)]
        groups: Option<String>,

        /// Output file (overrides the definition's output.file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Expand array columns once instead of to a fixed point
        #[arg(long)]
        single_pass: bool,

        /// Bound on fixed-point expansion passes
        #[arg(long)]
        max_depth: Option<usize>,

        /// Skip the augmentation fetch
        #[arg(long)]
        no_augment: bool,
    },

    /// Tabularize a local JSON or JSONL file
    Flatten {
        /// Input file; `.jsonl`/`.ndjson` are read line by line
        #[arg(short, long)]
        input: PathBuf,

        /// Record path inside a JSON document (e.g. `data.items`)
        #[arg(long)]
        records_path: Option<String>,

        /// Sheet name (defaults to the file stem)
        #[arg(long)]
        sheet: Option<String>,

        /// Output file (xlsx format only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path separator
        #[arg(long, default_value = ".")]
        separator: String,

        /// Expand array columns once instead of to a fixed point
        #[arg(long)]
        single_pass: bool,

        /// Bound on fixed-point expansion passes
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Validate an export definition
    Validate {
        /// Definition file (YAML) or built-in name
        #[arg(short, long)]
        definition: String,
    },

    /// List built-in definitions
    List,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// xlsx workbook, one sheet per table
    Xlsx,
    /// JSON lines on stdout, one object per row
    Json,
}
