//! # Config Module
//!
//! Loads `autoapi.config.*` from a project root.
//!
//! ## Lookup
//!
//! Candidates are probed in this order and the first one found wins:
//!
//! | File | Format |
//! |---|---|
//! | `autoapi.config.ts` | TypeScript module |
//! | `autoapi.config.js` | JavaScript module |
//! | `autoapi.config.json` | JSON |
//! | `autoapi.config.cjs` | CommonJS module |
//! | `autoapi.config.mjs` | ES module |
//! | `autoapi.config.toml` | TOML |
//!
//! Script configs are never executed. The module is parsed and the value of
//! `export const config = …` (falling back to `export default …`, then to
//! `module.exports = …`) is read with the same literal interpreter used for
//! handler configs, so only plain literal values are accepted.
//!
//! ## Example
//!
//! ```typescript
//! export const config: AutoApiConfig = {
//!   api_folders: [{ directory: './bff_functions', api_slug: '/_api' }],
//!   port: 3000,
//!   middleware_folder: './middleware',
//!   app_middleware: ['logger'],
//! };
//! ```

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::exports::{commonjs_export, default_export, exported_binding};
use crate::manifest::literal;
use crate::manifest::syntax::{parse_source, SourceLanguage};

/// Base name of every config candidate
pub const CONFIG_BASENAME: &str = "autoapi.config";

/// Extensions probed, in priority order
pub const CONFIG_EXTENSIONS: [&str; 6] = ["ts", "js", "json", "cjs", "mjs", "toml"];

/// One API folder and the slug its router is mounted at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFolder {
    /// Handler directory, relative to the project root
    pub directory: String,
    /// Mount path passed to `app.use`
    pub api_slug: String,
    /// Middleware applied to every route of this folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware: Option<Vec<String>>,
}

/// Contents of `autoapi.config.*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoApiConfig {
    pub api_folders: Vec<ApiFolder>,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_middleware: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_run_scripts: Option<String>,
    /// Modules a bundler should leave external; carried but unused here
    #[serde(
        default,
        rename = "rollupExternals",
        skip_serializing_if = "Option::is_none"
    )]
    pub rollup_externals: Option<Vec<String>>,
}

/// First existing config candidate under `project_root`
pub fn find_config_file(project_root: &Path) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| project_root.join(format!("{CONFIG_BASENAME}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Load the project's config, `Ok(None)` when no candidate exists
pub fn load_config(project_root: &Path) -> anyhow::Result<Option<AutoApiConfig>> {
    let Some(path) = find_config_file(project_root) else {
        tracing::debug!("no {CONFIG_BASENAME}.* under {}", project_root.display());
        return Ok(None);
    };
    tracing::debug!("loading config from {}", path.display());
    load_config_file(&path).map(Some)
}

/// Load one config file, picking the format from its extension
pub fn load_config_file(path: &Path) -> anyhow::Result<AutoApiConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let config: anyhow::Result<AutoApiConfig> = match ext.as_str() {
        "json" => serde_json::from_str(&text).map_err(anyhow::Error::from),
        "toml" => toml::from_str(&text).map_err(anyhow::Error::from),
        _ => {
            let language = SourceLanguage::from_path(path)
                .with_context(|| format!("unsupported config format: {}", path.display()))?;
            script_config_value(language, &text)
                .and_then(|value| serde_json::from_value(value).map_err(anyhow::Error::from))
        }
    };
    config.with_context(|| format!("invalid config {}", path.display()))
}

/// Literal value a script config exports
fn script_config_value(language: SourceLanguage, text: &str) -> anyhow::Result<Value> {
    let tree = parse_source(language, text)?;
    let source = text.as_bytes();
    let node = exported_binding(&tree, source, "config")
        .or_else(|| default_export(&tree))
        .or_else(|| commonjs_export(&tree, source));
    let Some(node) = node else {
        bail!("no `export const config`, `export default` or `module.exports` found");
    };
    let value = literal::evaluate(node, source)?;
    Ok(unwrap_config_key(value))
}

/// `module.exports = { config: { … } }` exposes the config under a key
fn unwrap_config_key(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("api_folders") && map.contains_key("config") => {
            map.remove("config").unwrap_or(Value::Null)
        }
        other => other,
    }
}
