//! Server orchestration: middleware table, one router per API folder, entrypoint.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use super::middleware::{MiddlewareAggregator, MiddlewareResolver};
use super::router::RouterGenerator;
use super::templates::{self, EntrypointModule, MountedRouter};
use super::{imports::relative_import, render_artifact, write_artifact, Generation, GeneratorOptions};
use crate::config::{ApiFolder, AutoApiConfig};
use crate::diagnostics::SharedReporter;
use crate::files;
use crate::manifest::naming::{sanitize_identifier, unique_identifier};

/// File name of the generated middleware table inside the output directory
pub const MIDDLEWARE_MODULE: &str = "middleware.ts";
/// File name of the generated entrypoint inside the output directory
pub const ENTRYPOINT_MODULE: &str = "index.ts";

/// Bindings the entrypoint declares itself
const ENTRYPOINT_LOCALS: [&str; 3] = ["app", "express", "middleware"];

/// A generated router and where the entrypoint mounts it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterMapping {
    pub api_slug: String,
    pub identifier: String,
    /// Import specifier relative to the output directory
    pub import_path: String,
    pub output_path: PathBuf,
}

/// Generates every artifact for one config
pub struct ServerGenerator {
    options: GeneratorOptions,
    reporter: SharedReporter,
}

impl ServerGenerator {
    pub fn new(options: GeneratorOptions, reporter: SharedReporter) -> Self {
        Self { options, reporter }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run the whole pipeline for `config`.
    ///
    /// Import paths are computed lexically between the output directory and the
    /// sources, so an absolute output directory needs an absolute project root.
    ///
    /// Fails when the output directory cannot be created, when no API folder
    /// produced a router, or when the entrypoint cannot be written. Anything
    /// else degrades: a failed middleware scan means no middleware, a failed
    /// folder is left out.
    pub async fn generate_server(&self, config: &AutoApiConfig) -> Generation {
        let output_dir = self.options.output_path();
        if output_dir.is_absolute() && !self.options.project_root.is_absolute() {
            self.reporter.error(&format!(
                "Output directory {} is absolute but the project root {} is relative",
                output_dir.display(),
                self.options.project_root.display()
            ));
            return Generation::Failed;
        }
        if let Err(e) = files::ensure_directory(&output_dir).await {
            self.reporter.error(&format!(
                "Error creating the directory: {}: {e}",
                output_dir.display()
            ));
            return Generation::Failed;
        }

        let aggregator = self.aggregate_middleware(config, &output_dir).await;
        let resolver = aggregator.as_ref().map(|a| a as &dyn MiddlewareResolver);

        let routers = self.generate_routers(config, &output_dir, resolver).await;
        if routers.is_empty() {
            self.reporter.error(
                "No valid api files able to be created from the config and file system, exiting creation",
            );
            return Generation::Failed;
        }

        let app_middleware = resolver
            .map(|r| r.available_middleware(config.app_middleware.as_deref().unwrap_or_default()))
            .unwrap_or_default();
        let middleware_import = resolver
            .filter(|_| !app_middleware.is_empty())
            .map(|r| relative_import(&output_dir, r.module_path()));

        let module = EntrypointModule {
            pre_run_scripts: self.pre_run_script_imports(config, &output_dir).await,
            routers: routers
                .into_iter()
                .map(|r| MountedRouter {
                    ident: r.identifier,
                    path: r.import_path,
                    slug: r.api_slug,
                })
                .collect(),
            middleware_import,
            app_middleware,
            port: config.port,
        };

        let entrypoint = output_dir.join(ENTRYPOINT_MODULE);
        let reporter = self.reporter.as_ref();
        let Some(text) = render_artifact(&entrypoint, reporter, || {
            templates::render_entrypoint(&module)
        }) else {
            return Generation::Failed;
        };
        let outcome = write_artifact(&entrypoint, &text, reporter).await;
        if outcome.is_success() {
            reporter.info(&format!(
                "generated server entrypoint: {}",
                entrypoint.display()
            ));
        }
        outcome
    }

    async fn aggregate_middleware(
        &self,
        config: &AutoApiConfig,
        output_dir: &Path,
    ) -> Option<MiddlewareAggregator> {
        let folder = config.middleware_folder.as_deref()?;
        let mut aggregator = MiddlewareAggregator::new(
            self.options.resolve(folder),
            output_dir.join(MIDDLEWARE_MODULE),
            self.reporter.clone(),
        );
        match aggregator.aggregate().await {
            Generation::Succeeded => Some(aggregator),
            Generation::Failed => {
                tracing::debug!("continuing without middleware from {folder}");
                None
            }
        }
    }

    /// Generate every folder's router, in config order
    async fn generate_routers(
        &self,
        config: &AutoApiConfig,
        output_dir: &Path,
        resolver: Option<&dyn MiddlewareResolver>,
    ) -> Vec<RouterMapping> {
        let generator = RouterGenerator::new(self.reporter.clone());
        let mut identifiers: HashSet<String> =
            ENTRYPOINT_LOCALS.iter().map(|name| name.to_string()).collect();
        let mut module_paths: HashSet<PathBuf> = [MIDDLEWARE_MODULE, ENTRYPOINT_MODULE]
            .iter()
            .map(PathBuf::from)
            .collect();
        let mut mappings: Vec<RouterMapping> = Vec::new();

        for folder in &config.api_folders {
            let output_path =
                output_dir.join(router_module_path(&folder.directory, &mut module_paths));
            let route_middleware = folder.middleware.as_deref().unwrap_or_default();
            let outcome = generator
                .generate(
                    &self.options.resolve(&folder.directory),
                    &output_path,
                    route_middleware,
                    resolver,
                )
                .await;
            if !outcome.is_success() {
                continue;
            }

            let mapping = RouterMapping {
                api_slug: folder.api_slug.clone(),
                identifier: unique_identifier(&mut identifiers, &router_identifier(folder)),
                import_path: relative_import(output_dir, &output_path),
                output_path,
            };
            match mappings.iter_mut().find(|m| m.api_slug == mapping.api_slug) {
                Some(existing) => {
                    self.reporter.warn(&format!(
                        "duplicate api_slug '{}' for {}, replacing the earlier router",
                        mapping.api_slug, folder.directory
                    ));
                    *existing = mapping;
                }
                None => mappings.push(mapping),
            }
        }
        mappings
    }

    /// Side-effect imports for every file in the pre-run script directory
    async fn pre_run_script_imports(&self, config: &AutoApiConfig, output_dir: &Path) -> Vec<String> {
        let Some(configured) = config.pre_run_scripts.as_deref() else {
            return Vec::new();
        };
        let directory = self.options.resolve(configured);
        if !files::exists(&directory).await {
            self.reporter.info(&format!(
                "The directory for prescripts does not exist: {}",
                directory.display()
            ));
            return Vec::new();
        }

        let names = match files::read_directory_entries(&directory).await {
            Ok(names) => names,
            Err(e) => {
                self.reporter
                    .warn(&format!("Failed to read {}: {e}", directory.display()));
                Vec::new()
            }
        };
        let mut scripts = Vec::with_capacity(names.len());
        for name in names {
            let path = directory.join(name);
            if matches!(files::is_directory(&path).await, Ok(false)) {
                scripts.push(relative_import(output_dir, &path));
            }
        }
        if scripts.is_empty() {
            self.reporter.info(&format!(
                "No pre-run scripts found in: {}",
                directory.display()
            ));
        }
        scripts
    }
}

/// `<directory>.ts` with `.`/`..`/root components dropped.
///
/// A path already in `taken` (the middleware table, the entrypoint or an
/// earlier router) gets a `_router` suffix, then a counter.
fn router_module_path(directory: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let segments: Vec<String> = Path::new(directory)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let stem = if segments.is_empty() {
        "api".to_string()
    } else {
        segments.join("/")
    };

    let mut candidate = PathBuf::from(format!("{stem}.ts"));
    let mut counter = 0;
    while !taken.insert(candidate.clone()) {
        candidate = match counter {
            0 => PathBuf::from(format!("{stem}_router.ts")),
            n => PathBuf::from(format!("{stem}_router_{n}.ts")),
        };
        counter += 1;
    }
    candidate
}

/// Identifier seed for a folder's router: its last path segment
fn router_identifier(folder: &ApiFolder) -> String {
    let base = Path::new(&folder.directory)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .next_back()
        .unwrap_or_else(|| "api".to_string());
    sanitize_identifier(&base)
}
