//! Template rendering for the emitted TypeScript modules.
//!
//! All three artifacts are rendered from `templates/*.j2` through one shared
//! minijinja [`Environment`]. Block tags are trimmed so every template line that
//! only holds a tag disappears from the output, and the trailing newline of a
//! template is kept.

use anyhow::Context;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use once_cell::sync::OnceCell;
use serde::Serialize;

pub const ROUTER_TEMPLATE: &str = "router.ts";
pub const MIDDLEWARE_TEMPLATE: &str = "middleware.ts";
pub const ENTRYPOINT_TEMPLATE: &str = "index.ts";

static ENVIRONMENT: OnceCell<Environment<'static>> = OnceCell::new();

fn environment() -> anyhow::Result<&'static Environment<'static>> {
    ENVIRONMENT.get_or_try_init(|| -> anyhow::Result<Environment<'static>> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("js_str", js_str);
        env.add_template(ROUTER_TEMPLATE, include_str!("../../templates/router.ts.j2"))?;
        env.add_template(
            MIDDLEWARE_TEMPLATE,
            include_str!("../../templates/middleware.ts.j2"),
        )?;
        env.add_template(ENTRYPOINT_TEMPLATE, include_str!("../../templates/index.ts.j2"))?;
        Ok(env)
    })
}

/// Render `value` as a single-quoted JavaScript string literal
pub fn js_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// One `import` line of a generated module
#[derive(Debug, Clone, Serialize)]
pub struct ImportLine {
    pub ident: String,
    pub path: String,
    pub default_export: bool,
}

/// One `router.<method>(…)` registration
#[derive(Debug, Clone, Serialize)]
pub struct RouteLine {
    pub method: &'static str,
    pub route: String,
    pub middleware: Vec<String>,
    pub ident: String,
}

/// Context for `router.ts.j2`
#[derive(Debug, Clone, Serialize)]
pub struct RouterModule {
    pub handlers: Vec<ImportLine>,
    pub middleware_import: Option<String>,
    pub folder_middleware: Vec<String>,
    pub routes: Vec<RouteLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiddlewareTableEntry {
    pub name: String,
    pub ident: String,
}

/// Context for `middleware.ts.j2`
#[derive(Debug, Clone, Serialize)]
pub struct MiddlewareModule {
    pub imports: Vec<ImportLine>,
    pub entries: Vec<MiddlewareTableEntry>,
}

/// A router import plus its `app.use` mount point
#[derive(Debug, Clone, Serialize)]
pub struct MountedRouter {
    pub ident: String,
    pub path: String,
    pub slug: String,
}

/// Context for `index.ts.j2`
#[derive(Debug, Clone, Serialize)]
pub struct EntrypointModule {
    pub pre_run_scripts: Vec<String>,
    pub routers: Vec<MountedRouter>,
    pub middleware_import: Option<String>,
    pub app_middleware: Vec<String>,
    pub port: u16,
}

/// Render the template registered as `name` with `context`
pub fn render<S: Serialize>(name: &str, context: &S) -> anyhow::Result<String> {
    let template = environment()?.get_template(name)?;
    template
        .render(context)
        .with_context(|| format!("failed to render template {name}"))
}

pub fn render_router(module: &RouterModule) -> anyhow::Result<String> {
    render(ROUTER_TEMPLATE, module)
}

pub fn render_middleware(module: &MiddlewareModule) -> anyhow::Result<String> {
    render(MIDDLEWARE_TEMPLATE, module)
}

pub fn render_entrypoint(module: &EntrypointModule) -> anyhow::Result<String> {
    render(ENTRYPOINT_TEMPLATE, module)
}
