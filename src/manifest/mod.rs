//! # Manifest Module
//!
//! The source analyzer: walks a directory of handler (or middleware) source
//! files and produces an ordered [`Manifest`] describing every file that
//! exports a function under the expected name.
//!
//! ## Pipeline
//!
//! ```text
//! directory listing (sorted) → per-entry task → parse → export detection → route/identifier
//! ```
//!
//! 1. **Listing** - entries of each directory are sorted lexically
//! 2. **Fan-out** - every entry is analyzed in its own tokio task; subdirectories recurse
//! 3. **Fan-in** - task results are awaited in listing order, never completion order
//! 4. **Identifiers** - handler names are de-duplicated over the merged result
//!
//! ## Qualifying files
//!
//! A file contributes an entry only if it parses cleanly and exports a function
//! named after the [`ExportName`]. Files that parse but export nothing relevant
//! are skipped silently; files that fail to parse are reported and skipped. A
//! sibling `export const config = { … }` object literal supplies the HTTP verb
//! and middleware list, evaluated without executing any code.

pub mod exports;
pub mod literal;
pub mod naming;
pub mod syntax;

pub use exports::ExportStyle;
pub use naming::{identifier_for, route_for, sanitize_identifier};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::diagnostics::{Reporter, SharedReporter};
use crate::files;
use syntax::{parse_source, SourceLanguage};

/// HTTP verb a handler is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    /// Upper-case verb, e.g. `GET`
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Name of the express router method, e.g. `get`
    pub fn router_method(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = anyhow::Error;

    /// Case-insensitive verb lookup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown HTTP method '{s}'"))
    }
}

/// Export a scan looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportName {
    Handler,
    Middleware,
}

impl ExportName {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportName::Handler => "handler",
            ExportName::Middleware => "middleware",
        }
    }

    /// Names the generated module declares itself, unavailable to imports
    pub fn reserved_locals(self) -> &'static [&'static str] {
        match self {
            ExportName::Handler => &["express", "router", "middleware"],
            ExportName::Middleware => &["middleware"],
        }
    }
}

/// Per-entry configuration derived from the file's exports and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryConfig {
    /// Verb from `config.httpMethod`, `GET` when absent
    pub http_method: HttpMethod,
    /// Middleware names requested by `config.middleware`, in order
    pub middleware: Vec<String>,
    /// Identifier the generated code imports this file under
    pub handler_name: String,
    /// Default export (`import x from`) vs named export (`import { handler as x } from`)
    pub is_handler_default_export: bool,
}

/// One qualifying source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// File name including extension
    pub name: String,
    /// Express route, always starting with `/`
    pub route: String,
    /// Path of the source file (scan directory joined with the relative path)
    pub source_path: PathBuf,
    pub config: EntryConfig,
}

impl ManifestEntry {
    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Ordered entries discovered under one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Shape of a handler's `config` export
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntryConfig {
    http_method: Option<String>,
    middleware: Option<Vec<String>>,
}

/// Scan `directory` for files exporting `export_name`.
///
/// A directory that does not exist yields an empty manifest without any
/// diagnostic. Parse and read failures are reported through `reporter` and
/// only exclude the offending file. Handler names never collide with each
/// other or with [`ExportName::reserved_locals`].
pub async fn scan(directory: &Path, export_name: ExportName, reporter: SharedReporter) -> Manifest {
    if !files::exists(directory).await {
        tracing::debug!("scan root {} does not exist", directory.display());
        return Manifest::default();
    }
    let root: Arc<Path> = Arc::from(directory);
    let mut entries = scan_directory(root, PathBuf::new(), export_name, reporter).await;

    let mut seen: HashSet<String> = export_name
        .reserved_locals()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for entry in &mut entries {
        entry.config.handler_name = naming::unique_identifier(&mut seen, &entry.config.handler_name);
    }
    tracing::debug!(
        "scanned {} for '{}': {} entries",
        directory.display(),
        export_name.as_str(),
        entries.len()
    );
    Manifest { entries }
}

type ScanFuture = Pin<Box<dyn Future<Output = Vec<ManifestEntry>> + Send>>;

async fn scan_directory(
    root: Arc<Path>,
    relative: PathBuf,
    export_name: ExportName,
    reporter: SharedReporter,
) -> Vec<ManifestEntry> {
    let directory = root.join(&relative);
    let names = match files::read_directory_entries(&directory).await {
        Ok(names) => names,
        Err(e) => {
            reporter.error(&format!("Failed to read {}: {e}", directory.display()));
            return Vec::new();
        }
    };

    let handles = names
        .into_iter()
        .map(|name| {
            tokio::spawn(scan_path(
                Arc::clone(&root),
                relative.join(name),
                export_name,
                Arc::clone(&reporter),
            ))
        })
        .collect();

    join_in_order(handles, reporter.as_ref()).await
}

fn scan_path(
    root: Arc<Path>,
    relative: PathBuf,
    export_name: ExportName,
    reporter: SharedReporter,
) -> ScanFuture {
    Box::pin(async move {
        let path = root.join(&relative);
        match files::is_directory(&path).await {
            Ok(true) => scan_directory(root, relative, export_name, reporter).await,
            Ok(false) => analyze_file(&root, &relative, export_name, reporter.as_ref())
                .await
                .into_iter()
                .collect(),
            Err(e) => {
                reporter.error(&format!("Failed to read {}: {e}", path.display()));
                Vec::new()
            }
        }
    })
}

/// Await `handles` in the order given and concatenate their results.
///
/// Completion order of the tasks has no influence on the output. A task that
/// panicked is reported and contributes nothing.
async fn join_in_order<T>(handles: Vec<JoinHandle<Vec<T>>>, reporter: &dyn Reporter) -> Vec<T> {
    let mut merged = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(items) => merged.extend(items),
            Err(e) => reporter.error(&format!("scan task failed: {e}")),
        }
    }
    merged
}

async fn analyze_file(
    root: &Path,
    relative: &Path,
    export_name: ExportName,
    reporter: &dyn Reporter,
) -> Option<ManifestEntry> {
    let path = root.join(relative);
    let Some(language) = SourceLanguage::from_path(&path) else {
        tracing::debug!("skipping non-source file {}", path.display());
        return None;
    };
    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(e) => {
            reporter.error(&format!("Failed to read {}: {e}", path.display()));
            return None;
        }
    };
    analyze_source(&path, relative, language, &source, export_name, reporter)
}

/// Analyze one already-read source file
fn analyze_source(
    path: &Path,
    relative: &Path,
    language: SourceLanguage,
    source: &str,
    export_name: ExportName,
    reporter: &dyn Reporter,
) -> Option<ManifestEntry> {
    let tree = match parse_source(language, source) {
        Ok(tree) => tree,
        Err(e) => {
            reporter.error(&format!("Failed to parse {}: {e:#}", path.display()));
            return None;
        }
    };
    let found = exports::find_exports(&tree, source.as_bytes(), export_name.as_str());
    let style = found.function?;

    let (http_method, middleware) = match found.config {
        None => (HttpMethod::default(), Vec::new()),
        Some(evaluated) => match evaluated.and_then(entry_config_from_value) {
            Ok(config) => config,
            Err(e) => {
                reporter.warn(&format!(
                    "failed to evaluate config in {}, using endpoint defaults: {e:#}",
                    path.display()
                ));
                (HttpMethod::default(), Vec::new())
            }
        },
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Some(ManifestEntry {
        name,
        route: route_for(relative),
        source_path: path.to_path_buf(),
        config: EntryConfig {
            http_method,
            middleware,
            handler_name: identifier_for(relative),
            is_handler_default_export: style == ExportStyle::Default,
        },
    })
}

fn entry_config_from_value(value: serde_json::Value) -> anyhow::Result<(HttpMethod, Vec<String>)> {
    let raw: RawEntryConfig = serde_json::from_value(value)?;
    let method = match raw.http_method {
        Some(verb) => verb.parse()?,
        None => HttpMethod::default(),
    };
    Ok((method, raw.middleware.unwrap_or_default()))
}
