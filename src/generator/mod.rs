//! # Generator Module
//!
//! The generator turns scanned handler folders into the TypeScript modules an
//! express server is started from.
//!
//! ## Overview
//!
//! Three artifacts are produced under the output directory:
//! - **Routers** - one module per configured API folder registering every handler
//! - **Middleware table** - `middleware.ts`, mapping middleware names to functions
//! - **Entrypoint** - `index.ts`, mounting every router and listening on the configured port
//!
//! ## Architecture
//!
//! ```text
//! AutoApiConfig → ServerGenerator ─┬→ MiddlewareAggregator → scan("middleware") → middleware.ts
//!                                  ├→ RouterGenerator (per folder) → scan("handler") → <folder>.ts
//!                                  └→ entrypoint template → index.ts
//! ```
//!
//! 1. **Scan** - [`crate::manifest::scan`] produces an ordered manifest per directory
//! 2. **Resolve** - requested middleware names are narrowed to what was discovered
//! 3. **Render** - minijinja templates in `templates/` produce the module text
//! 4. **Write** - artifacts are written atomically; a failed write leaves nothing behind
//!
//! ## Failure model
//!
//! Generators never return errors. Every problem is reported once through the
//! [`Reporter`] and the call returns a [`Generation`] outcome. A folder that
//! fails is skipped; only when no folder succeeds does the whole run fail.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use autoapi::config::load_config;
//! use autoapi::diagnostics::TracingReporter;
//! use autoapi::generator::{GeneratorOptions, ServerGenerator};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let options = GeneratorOptions::new(".");
//! if let Some(config) = load_config(&options.project_root)? {
//!     let outcome = ServerGenerator::new(options, Arc::new(TracingReporter))
//!         .generate_server(&config)
//!         .await;
//!     assert!(outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```

pub mod imports;
mod middleware;
mod router;
mod server;
pub mod templates;
#[cfg(test)]
mod tests;

pub use middleware::{MiddlewareAggregator, MiddlewareMapping, MiddlewareResolver};
pub use router::RouterGenerator;
pub use server::{RouterMapping, ServerGenerator};

use std::path::{Path, PathBuf};

use crate::diagnostics::Reporter;
use crate::files;

/// Default output directory, relative to the project root
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Outcome of a generation step
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Succeeded,
    Failed,
}

impl Generation {
    pub fn is_success(self) -> bool {
        matches!(self, Generation::Succeeded)
    }
}

/// Where a generation run reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Root that configured folders are resolved against. Paths are never
    /// resolved against the working directory; pass an absolute root when the
    /// output directory or any configured folder is absolute.
    pub project_root: PathBuf,
    /// Output directory; relative values are resolved against `project_root`
    pub output_dir: PathBuf,
}

impl GeneratorOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.project_root.join(path)
    }

    /// Absolute-or-root-relative output directory
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }
}

/// Create the parent of `path` and write `contents` to it.
///
/// Reports `Error creating the directory` / `Error writing the file` with the
/// underlying error text on failure.
pub(crate) async fn write_artifact(path: &Path, contents: &str, reporter: &dyn Reporter) -> Generation {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    if let Err(e) = files::ensure_directory(parent).await {
        reporter.error(&format!(
            "Error creating the directory: {}: {e}",
            parent.display()
        ));
        return Generation::Failed;
    }
    if let Err(e) = files::write_file(path, contents).await {
        reporter.error(&format!("Error writing the file: {}: {e}", path.display()));
        return Generation::Failed;
    }
    Generation::Succeeded
}

/// Render through `render` and report a template failure against `path`
pub(crate) fn render_artifact(
    path: &Path,
    reporter: &dyn Reporter,
    render: impl FnOnce() -> anyhow::Result<String>,
) -> Option<String> {
    match render() {
        Ok(text) => Some(text),
        Err(e) => {
            reporter.error(&format!("Failed to render {}: {e:#}", path.display()));
            None
        }
    }
}
