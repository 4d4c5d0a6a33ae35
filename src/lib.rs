//! # autoapi
//!
//! **autoapi** compiles a directory tree of HTTP handler modules into an
//! express server. Every file under an API folder becomes a route whose path
//! mirrors the file's location; the generated TypeScript wires the handlers
//! into routers, attaches middleware and mounts each router on the app.
//!
//! ## Overview
//!
//! Handler and middleware sources are parsed with tree-sitter, never executed.
//! A handler declares itself with an exported `handler` function and may
//! attach an `export const config = { httpMethod, middleware }` literal:
//!
//! ```typescript
//! export const config = { httpMethod: 'PUT', middleware: ['auth'] };
//! export async function handler(req, res) { res.json({ ok: true }); }
//! ```
//!
//! ## Architecture
//!
//! - **[`manifest`]** - scans a folder into an ordered manifest of routes and configs
//! - **[`generator`]** - renders routers, the middleware table and the entrypoint
//! - **[`config`]** - loads `autoapi.config.*` from the project root
//! - **[`diagnostics`]** - the reporter every component writes messages to
//! - **[`files`]** - filesystem helpers with atomic writes
//! - **[`logging`]** - tracing subscriber setup
//! - **[`watch`]** - regenerate on change
//! - **[`cli`]** - the `autoapi` command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(autoapi)
//!     participant Config as config::load_config
//!     participant Server as ServerGenerator
//!     participant Scan as manifest::scan
//!     participant FS as File System
//!
//!     CLI->>Config: load_config(root)
//!     Config-->>CLI: AutoApiConfig
//!     CLI->>Server: generate_server(&config)
//!     Server->>Scan: scan(middleware_folder)
//!     Server->>FS: write middleware.ts
//!     loop every api folder
//!         Server->>Scan: scan(directory)
//!         Server->>FS: write <folder>.ts
//!     end
//!     Server->>FS: write index.ts
//!     Server-->>CLI: Generation
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! autoapi generate --root my-app
//! npx tsx my-app/generated/index.ts
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod files;
pub mod generator;
pub mod logging;
pub mod manifest;
pub mod watch;
