//! Route manifests: a TOML description of routes and groups that the CLI
//! compiles into a [`RouteTable`].
//!
//! ```toml
//! [config]
//! engine = "mock"
//!
//! [[route]]
//! method = "GET"
//! path = "/health"
//! handler = "health"
//!
//! [[group]]
//! prefix = "/api"
//!
//! [[group.route]]
//! method = "GET"
//! path = "/echo/{data}"
//! handler = "echo"
//! ```
//!
//! `method = "ANY"` registers the handler for every supported method. Paths
//! may use `:name` / `*name` or the `{name}` / `{name*}` brace form.

use anyhow::{Context, Result};
use http::Method;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::RouterConfig;
use crate::dispatcher::{Request, Response};
use crate::group::{Group, Router};
use crate::registry::EngineRegistry;
use crate::router::{rewrite_braces, RouteTable};

/// Wildcard method accepted in manifests
pub const ANY_METHOD: &str = "ANY";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: RouterConfig,
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    /// Name reported when the route matches
    pub handler: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub prefix: String,
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupEntry>,
}

impl Manifest {
    /// # Errors
    ///
    /// Malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid route manifest")
    }

    /// # Errors
    ///
    /// Unreadable file, or see [`from_toml_str`](Manifest::from_toml_str).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in '{}'", path.display()))
    }

    /// Register every route, seal the table, and remember which handler
    /// name each route was registered with.
    ///
    /// The configured engine name is checked against the built-in
    /// [`EngineRegistry`] first.
    ///
    /// # Errors
    ///
    /// Unknown engine, bad environment overrides, unknown method, or any
    /// route registration failure (the offending entry is named).
    pub fn build(&self) -> Result<CompiledManifest> {
        let config = self.config.clone().with_env_overrides()?;
        EngineRegistry::with_defaults()
            .ensure_registered(&config.engine)
            .context("engine selection failed")?;

        let router = Router::with_config(&config);
        let mut handler_names = HashMap::new();
        register_routes(&router, &self.routes, &mut handler_names)?;
        for group in &self.groups {
            register_group(&router, group, &mut handler_names)?;
        }

        Ok(CompiledManifest {
            table: router.seal(),
            handler_names,
            config,
        })
    }
}

/// Sealed table plus route-seq → handler-name lookup
#[derive(Debug)]
pub struct CompiledManifest {
    pub table: Arc<RouteTable>,
    pub config: RouterConfig,
    handler_names: HashMap<usize, String>,
}

impl CompiledManifest {
    /// Handler name of the route with registration number `seq`
    #[must_use]
    pub fn handler_name(&self, seq: usize) -> &str {
        self.handler_names.get(&seq).map_or("?", String::as_str)
    }
}

fn register_group(
    parent: &Group,
    entry: &GroupEntry,
    names: &mut HashMap<usize, String>,
) -> Result<()> {
    let group = parent.group(&entry.prefix);
    register_routes(&group, &entry.routes, names)?;
    for child in &entry.groups {
        register_group(&group, child, names)?;
    }
    Ok(())
}

fn register_routes(
    group: &Group,
    routes: &[RouteEntry],
    names: &mut HashMap<usize, String>,
) -> Result<()> {
    for entry in routes {
        let path = rewrite_braces(&entry.path);
        let handler = named_handler(&entry.handler);
        let registered = if entry.method.eq_ignore_ascii_case(ANY_METHOD) {
            group.any(&path, handler)
        } else {
            let method = Method::from_bytes(entry.method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{}'", entry.method))?;
            group.handle(method, &path, handler).map(|route| vec![route])
        };
        let registered = registered.with_context(|| {
            format!(
                "cannot register {} {} (handler '{}')",
                entry.method, entry.path, entry.handler
            )
        })?;
        for route in registered {
            names.insert(route.seq(), entry.handler.clone());
        }
    }
    Ok(())
}

/// Handler that answers with its own name and the captured parameters.
fn named_handler(name: &str) -> impl Fn(Request) -> Response + Send + Sync + 'static {
    let name = name.to_string();
    move |req: Request| {
        Response::json(
            200,
            json!({ "handler": name, "params": req.params.to_map() }),
        )
    }
}
