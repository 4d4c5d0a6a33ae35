use crate::{
    config::{find_config_file, load_config_file, AutoApiConfig},
    diagnostics::{Reporter, SharedReporter, TracingReporter},
    generator::{Generation, GeneratorOptions, ServerGenerator},
    logging::{LogConfig, LogFormat},
    watch::watch,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Reported when the project root has no `autoapi.config.*`
pub const MISSING_CONFIG_MESSAGE: &str =
    "No config found, please create an autoapi.config, check the documentation for details";

/// Command-line interface for autoapi
///
/// Compiles a tree of handler modules into express routers, a middleware
/// table and a server entrypoint.
#[derive(Parser)]
#[command(name = "autoapi")]
#[command(about = "Filesystem-driven route compiler", long_about = None)]
pub struct Cli {
    /// Log level: trace/debug/info/warn/error
    #[arg(long, global = true, env = "AUTOAPI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: compact/pretty/json
    #[arg(long, global = true, env = "AUTOAPI_LOG_FORMAT", default_value = "compact")]
    pub log_format: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging settings selected by the global flags
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.log_level.clone(),
            format: LogFormat::parse(&self.log_format),
            ..LogConfig::from_env()
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate routers, the middleware table and the server entrypoint
    Generate {
        /// Project root containing autoapi.config.*
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output directory, relative to the project root (default: generated)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate, then regenerate on every change until interrupted
    Watch {
        /// Project root containing autoapi.config.*
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output directory, relative to the project root (default: generated)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Quiet period before a burst of changes triggers regeneration
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,
    },
}

/// Run the parsed command.
///
/// Returns `Generation::Failed` when the config is missing or generation
/// failed; `Err` only for a config that exists but cannot be loaded, or a
/// watcher that cannot be started.
pub async fn run_cli(cli: Cli) -> anyhow::Result<Generation> {
    let reporter: SharedReporter = Arc::new(TracingReporter);
    match cli.command {
        Commands::Generate { root, out } => {
            let options = generator_options(&root, out)?;
            let Some((config, _)) = load_project(&options.project_root, reporter.as_ref())? else {
                return Ok(Generation::Failed);
            };
            let generator = ServerGenerator::new(options, reporter);
            Ok(generator.generate_server(&config).await)
        }
        Commands::Watch {
            root,
            out,
            debounce_ms,
        } => {
            let options = generator_options(&root, out)?;
            let Some((config, config_path)) = load_project(&options.project_root, reporter.as_ref())?
            else {
                return Ok(Generation::Failed);
            };
            let generator = ServerGenerator::new(options, reporter);
            watch(
                &generator,
                config,
                Some(config_path),
                Duration::from_millis(debounce_ms),
            )
            .await?;
            Ok(Generation::Succeeded)
        }
    }
}

/// Options for `--root`/`--out`, with the root made absolute once here
pub(crate) fn generator_options(
    root: &Path,
    out: Option<PathBuf>,
) -> anyhow::Result<GeneratorOptions> {
    let root = std::path::absolute(root)
        .with_context(|| format!("failed to resolve project root {}", root.display()))?;
    let options = GeneratorOptions::new(root);
    Ok(match out {
        Some(out) => options.with_output_dir(out),
        None => options,
    })
}

/// The project's config and the file it came from
fn load_project(
    root: &Path,
    reporter: &dyn Reporter,
) -> anyhow::Result<Option<(AutoApiConfig, PathBuf)>> {
    let Some(path) = find_config_file(root) else {
        reporter.error(MISSING_CONFIG_MESSAGE);
        return Ok(None);
    };
    let config = load_config_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(Some((config, path)))
}
