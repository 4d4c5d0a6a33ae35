//! Middleware aggregation: one `middleware.ts` table for a middleware folder.

use std::path::{Path, PathBuf};

use super::templates::{self, ImportLine, MiddlewareModule, MiddlewareTableEntry};
use super::{imports::relative_import, render_artifact, write_artifact, Generation};
use crate::diagnostics::SharedReporter;
use crate::manifest::{self, ExportName};

/// Narrows requested middleware names to the ones that actually exist
pub trait MiddlewareResolver: Send + Sync {
    /// Subsequence of `requested` naming discovered middleware, in caller order
    fn available_middleware(&self, requested: &[String]) -> Vec<String>;

    /// Location of the generated middleware table
    fn module_path(&self) -> &Path;
}

/// One discovered middleware function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareMapping {
    /// Key in the table, the source file's stem
    pub name: String,
    /// Identifier the function is imported under
    pub identifier: String,
    pub source_path: PathBuf,
    pub is_default_export: bool,
}

/// Scans a middleware folder and writes the name → function table
pub struct MiddlewareAggregator {
    source_dir: PathBuf,
    output_path: PathBuf,
    reporter: SharedReporter,
    mappings: Vec<MiddlewareMapping>,
}

impl MiddlewareAggregator {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            reporter,
            mappings: Vec::new(),
        }
    }

    /// Mappings from the last successful aggregation
    pub fn mappings(&self) -> &[MiddlewareMapping] {
        &self.mappings
    }

    /// Scan the source folder and write the middleware table.
    ///
    /// An empty folder clears any earlier mappings, so later lookups resolve
    /// nothing.
    pub async fn aggregate(&mut self) -> Generation {
        let manifest = manifest::scan(
            &self.source_dir,
            ExportName::Middleware,
            self.reporter.clone(),
        )
        .await;

        if manifest.is_empty() {
            self.mappings.clear();
            self.reporter.error(&format!(
                "No middleware found in folder: {}",
                self.source_dir.display()
            ));
            return Generation::Failed;
        }

        let mut mappings: Vec<MiddlewareMapping> = Vec::with_capacity(manifest.len());
        for entry in &manifest {
            let name = entry.stem().to_string();
            if mappings.iter().any(|m| m.name == name) {
                self.reporter.warn(&format!(
                    "duplicate middleware name '{name}' in {}, keeping the first definition",
                    entry.source_path.display()
                ));
                continue;
            }
            mappings.push(MiddlewareMapping {
                name,
                identifier: entry.config.handler_name.clone(),
                source_path: entry.source_path.clone(),
                is_default_export: entry.config.is_handler_default_export,
            });
        }

        let module = self.module(&mappings);
        self.mappings = mappings;

        let reporter = self.reporter.as_ref();
        let Some(text) = render_artifact(&self.output_path, reporter, || {
            templates::render_middleware(&module)
        }) else {
            return Generation::Failed;
        };
        let outcome = write_artifact(&self.output_path, &text, reporter).await;
        if outcome.is_success() {
            reporter.info(&format!(
                "middleware aggregation created at {}",
                self.output_path.display()
            ));
        }
        outcome
    }

    fn module(&self, mappings: &[MiddlewareMapping]) -> MiddlewareModule {
        let module_dir = self.output_path.parent().unwrap_or_else(|| Path::new(""));
        MiddlewareModule {
            imports: mappings
                .iter()
                .map(|m| ImportLine {
                    ident: m.identifier.clone(),
                    path: relative_import(module_dir, &m.source_path),
                    default_export: m.is_default_export,
                })
                .collect(),
            entries: mappings
                .iter()
                .map(|m| MiddlewareTableEntry {
                    name: m.name.clone(),
                    ident: m.identifier.clone(),
                })
                .collect(),
        }
    }

    /// `requested` narrowed to discovered names; unknown names are dropped
    pub fn get_available_middleware(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|name| self.mappings.iter().any(|m| &m.name == *name))
            .cloned()
            .collect()
    }
}

impl MiddlewareResolver for MiddlewareAggregator {
    fn available_middleware(&self, requested: &[String]) -> Vec<String> {
        self.get_available_middleware(requested)
    }

    fn module_path(&self) -> &Path {
        &self.output_path
    }
}
