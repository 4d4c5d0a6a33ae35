//! # Watch Module
//!
//! Regenerates the server whenever a watched source changes.
//!
//! ## Overview
//!
//! `autoapi watch` generates once, then watches:
//! - every configured API folder
//! - the middleware folder, if any
//! - the pre-run script folder, if any
//! - the config file itself
//!
//! ## Reload Process
//!
//! 1. **Detection** - a `notify` watcher forwards create/modify/remove events
//! 2. **Debounce** - events are collected until the tree has been quiet for the debounce period
//! 3. **Config** - if the config file changed it is reloaded; a broken config keeps the previous one
//! 4. **Generate** - the full pipeline runs again
//!
//! Events under the output directory are ignored, so writing the generated
//! files never triggers another run. A failed regeneration is reported and the
//! loop keeps watching.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

use crate::config::{load_config_file, AutoApiConfig};
use crate::generator::{GeneratorOptions, ServerGenerator};

/// Debounce period used when none is given
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Whether an event can change generated output
pub fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Directories whose contents feed generation, resolved against the project root
pub fn watch_targets(config: &AutoApiConfig, options: &GeneratorOptions) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = config
        .api_folders
        .iter()
        .map(|folder| options.resolve(&folder.directory))
        .collect();
    targets.extend(config.middleware_folder.iter().map(|f| options.resolve(f)));
    targets.extend(config.pre_run_scripts.iter().map(|d| options.resolve(d)));
    targets
}

/// Canonical form of `path` when it exists
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Wait for the next burst of changes outside `ignored`.
///
/// Returns once no new event has arrived for `debounce`, or `None` when the
/// event channel is closed.
pub async fn next_batch(
    events: &mut UnboundedReceiver<PathBuf>,
    debounce: Duration,
    ignored: &Path,
) -> Option<Vec<PathBuf>> {
    let mut batch = Vec::new();
    while batch.is_empty() {
        let path = events.recv().await?;
        if !path.starts_with(ignored) {
            batch.push(path);
        }
    }
    loop {
        match tokio::time::timeout(debounce, events.recv()).await {
            Ok(Some(path)) => {
                if !path.starts_with(ignored) {
                    batch.push(path);
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    Some(batch)
}

fn register(watcher: &mut RecommendedWatcher, targets: &[PathBuf], watched: &mut HashSet<PathBuf>) {
    for target in targets {
        let target = canonical(target);
        if watched.contains(&target) {
            continue;
        }
        if !target.exists() {
            warn!("not watching missing path {}", target.display());
            continue;
        }
        match watcher.watch(&target, RecursiveMode::Recursive) {
            Ok(()) => {
                debug!("watching {}", target.display());
                watched.insert(target);
            }
            Err(e) => warn!("failed to watch {}: {e}", target.display()),
        }
    }
}

/// Generate once, then regenerate on every debounced change until Ctrl-C.
pub async fn watch(
    generator: &ServerGenerator,
    mut config: AutoApiConfig,
    config_path: Option<PathBuf>,
    debounce: Duration,
) -> anyhow::Result<()> {
    if !generator.generate_server(&config).await.is_success() {
        warn!("initial generation failed, watching for changes");
    }

    let (tx, mut rx) = unbounded_channel::<PathBuf>();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) if is_relevant(&event.kind) => {
                for path in event.paths {
                    if tx.send(path).is_err() {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("watch error: {e}"),
        },
        Config::default(),
    )?;

    let mut watched = HashSet::new();
    register(&mut watcher, &watch_targets(&config, generator.options()), &mut watched);
    let config_path = config_path.map(|p| canonical(&p));
    if let Some(path) = &config_path {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
    }
    let ignored = canonical(&generator.options().output_path());
    info!("watching for changes, press Ctrl-C to stop");

    loop {
        let batch = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            batch = next_batch(&mut rx, debounce, &ignored) => batch,
        };
        let Some(batch) = batch else { break };
        debug!("{} change(s) detected", batch.len());

        if let Some(path) = &config_path {
            if batch.iter().any(|changed| changed == path) {
                match load_config_file(path) {
                    Ok(reloaded) => {
                        info!("reloaded config {}", path.display());
                        config = reloaded;
                        register(&mut watcher, &watch_targets(&config, generator.options()), &mut watched);
                    }
                    Err(e) => warn!("keeping previous config, reload failed: {e:#}"),
                }
            }
        }

        if !generator.generate_server(&config).await.is_success() {
            warn!("regeneration failed, watching for further changes");
        }
    }
    info!("stopped watching");
    Ok(())
}
