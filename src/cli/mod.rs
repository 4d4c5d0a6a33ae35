//! # CLI Module
//!
//! Command-line interface for the `autoapi` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate the routers, middleware table and server entrypoint once:
//!
//! ```bash
//! autoapi generate --root my-app
//! ```
//!
//! Options:
//! - `--root <DIR>` - Project root holding `autoapi.config.*` (default: `.`)
//! - `--out <DIR>` - Output directory, relative to the root (default: `generated`)
//!
//! ### `watch`
//!
//! Generate, then regenerate whenever a handler, middleware, pre-run script
//! or the config file changes:
//!
//! ```bash
//! autoapi watch --root my-app --debounce-ms 500
//! ```
//!
//! ## Global Options
//!
//! - `--log-level <LEVEL>` - trace/debug/info/warn/error (env `AUTOAPI_LOG_LEVEL`)
//! - `--log-format <FORMAT>` - compact/pretty/json (env `AUTOAPI_LOG_FORMAT`)
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use autoapi::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let outcome = run_cli(cli).await?;
//! ```
//!
//! A missing config or a failed generation makes `generate` exit with status 1.

mod commands;


pub use commands::{run_cli, Cli, Commands, MISSING_CONFIG_MESSAGE};
