//! Per-folder express router generation.

use std::path::Path;

use super::middleware::MiddlewareResolver;
use super::templates::{self, ImportLine, RouteLine, RouterModule};
use super::{imports::relative_import, render_artifact, write_artifact, Generation};
use crate::diagnostics::SharedReporter;
use crate::manifest::{self, ExportName, Manifest};

/// Writes one router module for a folder of handlers
#[derive(Clone)]
pub struct RouterGenerator {
    reporter: SharedReporter,
}

impl RouterGenerator {
    pub fn new(reporter: SharedReporter) -> Self {
        Self { reporter }
    }

    /// Scan `source_dir` for handlers and write the router to `output_path`.
    ///
    /// `route_middleware` is applied to every route of the folder with
    /// `router.use`; per-handler middleware comes from each handler's config.
    /// Both lists are narrowed through `resolver`, and without a resolver no
    /// middleware is referenced at all.
    pub async fn generate(
        &self,
        source_dir: &Path,
        output_path: &Path,
        route_middleware: &[String],
        resolver: Option<&dyn MiddlewareResolver>,
    ) -> Generation {
        let manifest = manifest::scan(source_dir, ExportName::Handler, self.reporter.clone()).await;
        if manifest.is_empty() {
            self.reporter.error(&format!(
                "No endpoints found to map for {}",
                source_dir.display()
            ));
            return Generation::Failed;
        }

        let module = build_module(&manifest, output_path, route_middleware, resolver);
        let reporter = self.reporter.as_ref();
        let Some(text) = render_artifact(output_path, reporter, || templates::render_router(&module))
        else {
            return Generation::Failed;
        };
        let outcome = write_artifact(output_path, &text, reporter).await;
        if outcome.is_success() {
            reporter.info(&format!("generated endpoints: {}", output_path.display()));
        }
        outcome
    }
}

fn build_module(
    manifest: &Manifest,
    output_path: &Path,
    route_middleware: &[String],
    resolver: Option<&dyn MiddlewareResolver>,
) -> RouterModule {
    let router_dir = output_path.parent().unwrap_or_else(|| Path::new(""));
    let resolve = |requested: &[String]| -> Vec<String> {
        resolver
            .map(|r| r.available_middleware(requested))
            .unwrap_or_default()
    };

    let folder_middleware = resolve(route_middleware);
    let routes: Vec<RouteLine> = manifest
        .iter()
        .map(|entry| RouteLine {
            method: entry.config.http_method.router_method(),
            route: entry.route.clone(),
            middleware: resolve(&entry.config.middleware),
            ident: entry.config.handler_name.clone(),
        })
        .collect();

    let needs_table = !folder_middleware.is_empty() || routes.iter().any(|r| !r.middleware.is_empty());
    let middleware_import = resolver
        .filter(|_| needs_table)
        .map(|r| relative_import(router_dir, r.module_path()));

    RouterModule {
        handlers: manifest
            .iter()
            .map(|entry| ImportLine {
                ident: entry.config.handler_name.clone(),
                path: relative_import(router_dir, &entry.source_path),
                default_export: entry.config.is_handler_default_export,
            })
            .collect(),
        middleware_import,
        folder_middleware,
        routes,
    }
}
