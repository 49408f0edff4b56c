//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{BatchScope, RunOptions};
use crate::decode::{decoder_for, DecoderFormat};
use crate::definitions::list_builtin_info;
use crate::engine::{ExportConfig, ExportEngine, ExportReport};
use crate::error::{Error, Result};
use crate::loader::{load_definition, ExportDefinition};
use crate::output::{JsonLinesSink, NamedTable, SinkFailure, SinkSummary, TableSink, WorkbookSink};
use crate::source::{DocumentSource, MongoSource, MongoSourceConfig};
use crate::tabular::{TabularConfig, Tabularizer};
use crate::template::{self, TemplateContext};
use chrono::Local;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Export {
                definition,
                config,
                config_json,
                fetch_all,
                fetch_deleted,
                batch_id,
                groups,
                output,
                single_pass,
                max_depth,
                no_augment,
            } => {
                let def = load_definition(definition)?;
                let user_config = load_config(config.as_deref(), config_json.as_deref())?;
                let options =
                    RunOptions::resolve(*fetch_all, *fetch_deleted, batch_id.as_deref(), &def)?;
                let tabular = tabular_config(
                    def.tabular.to_config(),
                    *single_pass,
                    *max_depth,
                );
                let export = ExportConfig::new()
                    .with_groups(split_groups(groups.as_deref()))
                    .with_augmentation(!*no_augment);

                self.export(def, user_config, options, tabular, export, output.as_deref())
                    .await
            }
            Commands::Flatten {
                input,
                records_path,
                sheet,
                output,
                separator,
                single_pass,
                max_depth,
            } => {
                let tabular = tabular_config(
                    TabularConfig::new().with_separator(separator.clone()),
                    *single_pass,
                    *max_depth,
                );
                self.flatten(
                    input,
                    records_path.as_deref(),
                    sheet.as_deref(),
                    output.as_deref(),
                    tabular,
                )
            }
            Commands::Validate { definition } => self.validate(definition),
            Commands::List => self.list_definitions(),
        }
    }

    /// Run an export against MongoDB and write its tables
    async fn export(
        &self,
        def: ExportDefinition,
        user_config: Value,
        options: RunOptions,
        tabular: TabularConfig,
        export: ExportConfig,
        output: Option<&Path>,
    ) -> Result<()> {
        let batch_id = match &options.scope {
            BatchScope::Single(id) => Some(id.as_str()),
            BatchScope::All => None,
        };
        let ctx = TemplateContext::for_run(user_config, Local::now(), batch_id);

        let source_config = MongoSourceConfig {
            connection_string: template::render(&def.source.connection_string, &ctx)?,
            database: template::render(&def.source.database, &ctx)?,
            app_name: def
                .source
                .app_name
                .as_deref()
                .map(|name| template::render(name, &ctx))
                .transpose()?,
        };
        let source = MongoSource::connect(&source_config).await?;
        source.ping().await?;

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(template::render(&def.output.file, &ctx)?),
        };

        let engine = ExportEngine::new(source, def, options)
            .with_tabular(tabular)
            .with_context(ctx)
            .with_config(export);
        let run = engine.run().await?;

        let summary = write_tables(&run.tables, self.cli.format, &output_path)?;
        self.report(&run.report, &summary);

        if run.report.all_failed() {
            return Err(Error::Other("every query group failed".to_string()));
        }
        if summary.nothing_written() {
            return Err(Error::output("no table could be written"));
        }
        Ok(())
    }

    /// Tabularize a local file
    fn flatten(
        &self,
        input: &Path,
        records_path: Option<&str>,
        sheet: Option<&str>,
        output: Option<&Path>,
        tabular: TabularConfig,
    ) -> Result<()> {
        if !input.exists() {
            return Err(Error::file_not_found(input.display().to_string()));
        }
        let body = fs::read_to_string(input)?;
        let records = decoder_for(DecoderFormat::from_path(input), records_path).decode(&body)?;
        info!(input = %input.display(), records = records.len(), "records loaded");

        let table = Tabularizer::new(tabular).tabularize(&records)?;
        let name = sheet
            .map(String::from)
            .or_else(|| {
                input
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .unwrap_or_default();

        let output_path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("xlsx"));
        let tables = if table.is_empty() {
            Vec::new()
        } else {
            vec![NamedTable::new(name, table)]
        };

        let summary = write_tables(&tables, self.cli.format, &output_path)?;
        if let Some(failure) = summary.failed.first() {
            return Err(Error::output(failure.error.clone()));
        }
        if self.cli.format == OutputFormat::Xlsx {
            self.output_message(&json!({
                "type": "FLATTEN",
                "sheets": summary.sheets,
                "rows": summary.rows,
                "path": summary.path.as_ref().map(|p| p.display().to_string()),
            }));
        }
        Ok(())
    }

    /// Validate a definition
    fn validate(&self, definition: &str) -> Result<()> {
        let def = load_definition(definition)?;

        self.output_message(&json!({
            "type": "VALIDATE",
            "message": format!(
                "Definition '{}' is valid with {} query groups{}",
                def.name,
                def.queries.len(),
                if def.augmentation.is_some() { " and augmentation" } else { "" }
            ),
            "groups": def.queries.iter().map(|q| q.name.as_str()).collect::<Vec<_>>(),
            "config_keys": def.config_keys(),
        }));

        Ok(())
    }

    /// List built-in definitions
    fn list_definitions(&self) -> Result<()> {
        let definitions: Vec<Value> = list_builtin_info()
            .into_iter()
            .map(|info| {
                json!({
                    "name": info.name,
                    "description": info.description,
                    "aliases": info.aliases,
                    "config_keys": info.config_keys,
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "DEFINITIONS",
            "definitions": definitions
        }));

        Ok(())
    }

    /// Print the run report
    ///
    /// Rows own stdout in JSON format, so the report goes to the log there.
    fn report(&self, report: &ExportReport, summary: &SinkSummary) {
        match self.cli.format {
            OutputFormat::Xlsx => {
                for line in report.summary() {
                    println!("{line}");
                }
                match &summary.path {
                    Some(path) => println!("written: {}", path.display()),
                    None => println!("no tables produced, nothing written"),
                }
                for failure in &summary.failed {
                    println!("not written: {}: {}", failure.name, failure.error);
                }
            }
            OutputFormat::Json => {
                for line in report.summary() {
                    info!("{line}");
                }
            }
        }
        if !report.coercion.is_empty() {
            warn!(
                values = report.coercion.coerced,
                paths = ?report.coercion.paths,
                "values coerced to strings"
            );
        }
    }

    fn output_message(&self, msg: &Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(msg).unwrap_or_default()
        );
    }
}

/// Write tables to the sink for `format`
///
/// `path` is only used by the workbook sink; JSON lines go to stdout.
/// A table the sink rejects is logged and listed in `SinkSummary::failed`;
/// the remaining tables are still written.
pub fn write_tables(tables: &[NamedTable], format: OutputFormat, path: &Path) -> Result<SinkSummary> {
    let mut sink: Box<dyn TableSink> = match format {
        OutputFormat::Xlsx => Box::new(WorkbookSink::new(path)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(std::io::stdout().lock())),
    };

    let mut failed = Vec::new();
    for table in tables {
        if let Err(e) = sink.write_table(table) {
            warn!(table = %table.name, error = %e, "table not written");
            failed.push(SinkFailure {
                name: table.name.clone(),
                error: e.to_string(),
            });
        }
    }

    let mut summary = sink.finish()?;
    summary.failed = failed;
    Ok(summary)
}

/// Load user configuration; inline JSON takes precedence over a file
fn load_config(path: Option<&Path>, inline: Option<&str>) -> Result<Value> {
    if let Some(json_str) = inline {
        return serde_json::from_str(json_str)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
    }

    if let Some(path) = path {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        return serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
    }

    Ok(json!({}))
}

fn tabular_config(base: TabularConfig, single_pass: bool, max_depth: Option<usize>) -> TabularConfig {
    if single_pass {
        base.single_pass()
    } else if let Some(depth) = max_depth {
        base.fixed_point(depth.max(1))
    } else {
        base
    }
}

fn split_groups(groups: Option<&str>) -> Vec<String> {
    groups
        .map(|g| {
            g.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
