use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::manifest::Manifest;
use crate::dispatcher::{Dispatcher, Request};
use crate::registry::MockEngine;
use crate::router::Resolution;

/// Command-line interface for transwarp
///
/// Compiles route manifests into a sealed route table and resolves
/// requests against it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level filter (`trace`, `debug`, `info`, `warn`, `error`)
    #[arg(long, global = true, env = "TRANSWARP_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a route manifest and print its table
    ///
    /// Routes are listed in precedence order: static segments before
    /// parameters before catch-alls.
    Check {
        /// Path to the route manifest (TOML)
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Resolve one request against a route manifest
    Resolve {
        /// Path to the route manifest (TOML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// HTTP method of the request
        method: String,

        /// Request path, optionally with a query string
        path: String,

        /// Also dispatch the request through the in-process engine and
        /// print the response
        #[arg(long, default_value_t = false)]
        execute: bool,
    },
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or compiled, or the
/// request method is not a valid HTTP token.
pub fn run_cli(cli: Cli) -> Result<()> {
    let report = match &cli.command {
        Commands::Check { manifest } => check_manifest(manifest)?,
        Commands::Resolve {
            manifest,
            method,
            path,
            execute,
        } => resolve_manifest(manifest, method, path, *execute)?,
    };
    print!("{report}");
    Ok(())
}

/// Compile `manifest` and render its route table.
///
/// # Errors
///
/// See [`Manifest::build`].
pub fn check_manifest(manifest: &Path) -> Result<String> {
    let compiled = Manifest::load(manifest)?.build()?;
    compiled.table.dump_routes();
    let routes = compiled.table.routes_by_precedence();

    let mut out = String::new();
    writeln!(
        out,
        "{} route(s), engine '{}'",
        routes.len(),
        compiled.config.engine
    )?;
    for route in routes {
        writeln!(
            out,
            "  {:<7} {:<40} -> {}",
            route.method().as_str(),
            route.pattern().as_str(),
            compiled.handler_name(route.seq())
        )?;
    }
    Ok(out)
}

/// Compile `manifest`, resolve `method path`, and render the resolution.
///
/// With `execute`, the request is also dispatched through a [`MockEngine`]
/// and the response is appended.
///
/// # Errors
///
/// See [`Manifest::build`]; also fails for an invalid method token.
pub fn resolve_manifest(
    manifest: &Path,
    method: &str,
    path: &str,
    execute: bool,
) -> Result<String> {
    let compiled = Manifest::load(manifest)?.build()?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{method}'"))?;

    let mut out = String::new();
    match compiled.table.resolve(&method, path) {
        Resolution::Matched(matched) => {
            writeln!(
                out,
                "matched {} -> {}",
                matched.route,
                compiled.handler_name(matched.route.seq())
            )?;
            for (name, value) in matched.context.iter() {
                writeln!(out, "  {name} = {value}")?;
            }
        }
        Resolution::MethodNotAllowed { allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            writeln!(out, "405 Method Not Allowed (allow: {})", allowed.join(", "))?;
        }
        Resolution::NotFound => {
            writeln!(out, "404 Not Found")?;
        }
    }

    if execute {
        let engine = MockEngine::serving(Arc::new(Dispatcher::new(Arc::clone(&compiled.table))));
        let result = engine.execute(Request::new(method, path))?;
        writeln!(
            out,
            "response {} {}",
            result.response.status,
            result.response.body
        )?;
    }
    Ok(out)
}
