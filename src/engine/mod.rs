//! Export engine module
//!
//! Runs every query group of a definition against a document source.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExportEngine` - resolves filters, fetches, tabularizes, augments
//! - `ExportConfig` - group selection and augmentation switch
//! - `ExportReport` - per-group outcomes and run totals
//!
//! A failing group is reported and skipped; the other groups and the
//! augmentation step still run.

mod types;

pub use types::{
    AugmentationOutcome, ExportConfig, ExportReport, ExportRun, ExportStats, GroupOutcome,
    GroupReport,
};

use crate::augment::{AugmentationClient, CorrelationKeys};
use crate::config::{resolve_filter, RunOptions};
use crate::error::{Error, Result};
use crate::loader::{ExportDefinition, QueryDefinition};
use crate::output::NamedTable;
use crate::source::{DocumentSource, SourceQuery};
use crate::tabular::{CoercionReport, Table, TabularConfig, Tabularizer};
use crate::template::TemplateContext;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrates one export run
pub struct ExportEngine<S: DocumentSource> {
    source: S,
    definition: ExportDefinition,
    options: RunOptions,
    tabularizer: Tabularizer,
    context: TemplateContext,
    config: ExportConfig,
}

impl<S: DocumentSource> ExportEngine<S> {
    /// Create an engine using the definition's tabular settings
    pub fn new(source: S, definition: ExportDefinition, options: RunOptions) -> Self {
        let tabularizer = Tabularizer::new(definition.tabular.to_config());
        Self {
            source,
            definition,
            options,
            tabularizer,
            context: TemplateContext::new(),
            config: ExportConfig::default(),
        }
    }

    /// Override tabular settings
    #[must_use]
    pub fn with_tabular(mut self, config: TabularConfig) -> Self {
        self.tabularizer = Tabularizer::new(config);
        self
    }

    /// Set the template context used to render the augmentation request
    #[must_use]
    pub fn with_context(mut self, context: TemplateContext) -> Self {
        self.context = context;
        self
    }

    /// Set export configuration
    #[must_use]
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// The document source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The definition being run
    pub fn definition(&self) -> &ExportDefinition {
        &self.definition
    }

    /// Run every selected group, then the augmentation step
    ///
    /// Fails only for problems with the run itself, such as an unknown
    /// group name. Per-group and augmentation failures land in the report.
    pub async fn run(&self) -> Result<ExportRun> {
        let start = Instant::now();
        self.check_group_selection()?;

        info!(
            definition = %self.definition.name,
            source = %self.source.describe(),
            scope = %self.options.scope,
            include_deleted = self.options.include_deleted,
            "starting export"
        );

        let correlation = self.definition.augmentation.as_ref().map(|a| &a.correlation);
        let mut keys: Option<CorrelationKeys> = None;
        let mut tables = Vec::new();
        let mut groups = Vec::new();
        let mut coercion = CoercionReport::new();
        let mut stats = ExportStats::new();

        for query in &self.definition.queries {
            if !self.config.selects(&query.name) {
                debug!(group = %query.name, "group not selected");
                continue;
            }
            stats.add_group();

            let (documents, outcome) = match self.run_group(query).await {
                Ok((documents, table, report)) => {
                    coercion.merge(report);

                    if let Some(c) = correlation.filter(|c| c.query == query.name) {
                        let collected = table
                            .as_ref()
                            .map(|t| CorrelationKeys::collect(t, &c.column))
                            .unwrap_or_default();
                        debug!(group = %query.name, keys = collected.len(), "correlation keys collected");
                        keys = Some(collected);
                    }

                    match table {
                        Some(table) => {
                            let outcome = GroupOutcome::Exported {
                                rows: table.num_rows(),
                                columns: table.num_columns(),
                            };
                            stats.add_rows(table.num_rows());
                            tables.push(NamedTable::new(query.name.clone(), table));
                            (documents, outcome)
                        }
                        None => (documents, GroupOutcome::Empty),
                    }
                }
                Err(e) => {
                    warn!(group = %query.name, error = %e, "group failed");
                    stats.add_error();
                    (
                        0,
                        GroupOutcome::Failed {
                            reason: e.to_string(),
                        },
                    )
                }
            };

            info!(group = %query.name, documents, outcome = %outcome, "group finished");
            groups.push(GroupReport {
                name: query.name.clone(),
                documents,
                outcome,
            });
        }

        let augmentation = self.run_augmentation(keys, &mut tables, &mut stats).await;

        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            groups = stats.groups,
            tables = tables.len(),
            rows = stats.rows,
            errors = stats.errors,
            duration_ms = stats.duration_ms,
            "export finished"
        );

        Ok(ExportRun {
            tables,
            report: ExportReport {
                groups,
                augmentation,
                coercion,
                stats,
            },
        })
    }

    fn check_group_selection(&self) -> Result<()> {
        let unknown: Vec<&str> = self
            .config
            .groups
            .iter()
            .filter(|g| self.definition.query(g).is_none())
            .map(String::as_str)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "Unknown query group(s): {}",
                unknown.join(", ")
            )))
        }
    }

    /// Fetch and tabularize one group; `None` when nothing matched
    async fn run_group(
        &self,
        query: &QueryDefinition,
    ) -> Result<(usize, Option<Table>, CoercionReport)> {
        let filter = resolve_filter(query, &self.options);
        let source_query = SourceQuery::from_definition(query, &filter)
            .map_err(|e| Error::query(&query.name, e.to_string()))?;

        debug!(group = %query.name, collection = %query.collection, filter = ?source_query.filter, "querying");
        let documents = self
            .source
            .find(&source_query)
            .await
            .map_err(|e| Error::query(&query.name, e.to_string()))?;

        if documents.is_empty() {
            return Ok((0, None, CoercionReport::new()));
        }

        let (table, report) = self
            .tabularizer
            .tabularize_documents(&documents)
            .map_err(|e| Error::query(&query.name, e.to_string()))?;
        Ok((documents.len(), Some(table), report))
    }

    async fn run_augmentation(
        &self,
        keys: Option<CorrelationKeys>,
        tables: &mut Vec<NamedTable>,
        stats: &mut ExportStats,
    ) -> AugmentationOutcome {
        let Some(def) = &self.definition.augmentation else {
            return AugmentationOutcome::skipped("not configured");
        };
        if !self.config.augment {
            return AugmentationOutcome::skipped("disabled");
        }
        let Some(keys) = keys else {
            return AugmentationOutcome::skipped(format!(
                "correlation group '{}' did not run",
                def.correlation.query
            ));
        };
        if keys.is_empty() {
            return AugmentationOutcome::skipped("no correlation keys");
        }

        info!(sheet = %def.sheet, keys = keys.len(), "running augmentation fetch");
        let result = match AugmentationClient::from_definition(def, &self.context) {
            Ok(client) => client.fetch(&keys).await,
            Err(e) => Err(e),
        };

        let outcome = match result.and_then(|records| {
            if records.is_empty() {
                return Ok(None);
            }
            self.tabularizer
                .tabularize(&records)
                .map(Some)
                .map_err(|e| Error::augmentation(e.to_string()))
        }) {
            Ok(None) => AugmentationOutcome::Empty,
            Ok(Some(table)) => {
                let outcome = AugmentationOutcome::Exported {
                    rows: table.num_rows(),
                    columns: table.num_columns(),
                };
                stats.add_rows(table.num_rows());
                tables.push(NamedTable::new(def.sheet.clone(), table));
                outcome
            }
            Err(e) => {
                warn!(sheet = %def.sheet, error = %e, "augmentation failed, sheet omitted");
                stats.add_error();
                AugmentationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(sheet = %def.sheet, outcome = %outcome, "augmentation finished");
        outcome
    }
}
