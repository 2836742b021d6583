//! # CLI Module
//!
//! Command-line tooling for inspecting route definitions without a server.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Compile a route manifest and print the table in precedence order:
//!
//! ```bash
//! transwarp check --manifest routes.toml
//! ```
//!
//! ### `resolve`
//!
//! Resolve one request against a manifest. `--execute` also runs it
//! through the in-process engine:
//!
//! ```bash
//! transwarp resolve --manifest routes.toml GET /api/echo/hello --execute
//! ```
//!
//! ## Manifest format
//!
//! See [`Manifest`] for the TOML layout.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use transwarp::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;
mod manifest;

pub use commands::{check_manifest, resolve_manifest, run_cli, Cli, Commands};
pub use manifest::{CompiledManifest, GroupEntry, Manifest, RouteEntry, ANY_METHOD};
