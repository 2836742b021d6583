//! Engine registry - explicit startup selection of the HTTP engine.
//!
//! Engines are the adapters between a concrete HTTP server and the
//! engine-neutral [`Dispatcher`]. They are registered by name; the name in
//! [`RouterConfig::engine`] picks one at startup. An unknown name is a
//! [`ConfigError::UnknownEngine`], never a silent fallback.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::config::{ConfigError, RouterConfig};
use crate::dispatcher::{DispatchResult, Dispatcher, Request};
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Adapter seam between a host HTTP engine and the dispatcher.
///
/// Implementations translate native requests into [`Request`], call
/// [`Dispatcher::dispatch`], and write the [`Response`](crate::Response)
/// back. No engine type ever crosses into the core.
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    /// Start serving `dispatcher` on `addr`.
    ///
    /// # Errors
    ///
    /// Engine-specific startup failures (bind errors, double start).
    fn serve(&self, addr: &str, dispatcher: Arc<Dispatcher>) -> Result<()>;
}

type EngineConstructor = Box<dyn Fn(&RouterConfig) -> Box<dyn Engine> + Send + Sync>;

/// Name → engine constructor map
pub struct EngineRegistry {
    constructors: BTreeMap<String, EngineConstructor>,
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EngineRegistry {
    /// Registry with no engines at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in engines (`mock`)
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(MockEngine::NAME, |_config| -> Box<dyn Engine> {
            Box::new(MockEngine::new())
        });
        registry
    }

    /// Register (or replace) an engine constructor
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&RouterConfig) -> Box<dyn Engine> + Send + Sync + 'static,
    {
        if self
            .constructors
            .insert(name.to_string(), Box::new(constructor))
            .is_some()
        {
            info!(engine = %name, "Engine constructor replaced");
        } else {
            debug!(engine = %name, "Engine registered");
        }
    }

    /// Registered engine names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Check that `name` is registered without constructing the engine.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownEngine`] if no constructor has that name.
    pub fn ensure_registered(&self, name: &str) -> Result<(), ConfigError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(self.unknown(name))
        }
    }

    /// Build the engine named by `config.engine`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownEngine`] if no constructor has that name.
    pub fn create(&self, config: &RouterConfig) -> Result<Box<dyn Engine>, ConfigError> {
        let constructor = self
            .constructors
            .get(&config.engine)
            .ok_or_else(|| self.unknown(&config.engine))?;
        info!(engine = %config.engine, "Engine selected");
        Ok(constructor(config))
    }

    fn unknown(&self, name: &str) -> ConfigError {
        ConfigError::UnknownEngine {
            requested: name.to_string(),
            available: self.names(),
        }
    }
}

/// In-process engine: never binds a socket.
///
/// After [`serve`](Engine::serve) the engine holds the dispatcher and
/// [`execute`](MockEngine::execute) runs requests through it directly. Used
/// by tests and by the CLI.
#[derive(Default)]
pub struct MockEngine {
    dispatcher: OnceLock<Arc<Dispatcher>>,
    addr: OnceLock<String>,
}

impl MockEngine {
    pub const NAME: &'static str = "mock";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine already serving `dispatcher`
    #[must_use]
    pub fn serving(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher: OnceLock::from(dispatcher),
            addr: OnceLock::new(),
        }
    }

    /// Address passed to `serve`, if any
    #[must_use]
    pub fn addr(&self) -> Option<&str> {
        self.addr.get().map(String::as_str)
    }

    /// Run one request through the dispatcher.
    ///
    /// A valid ULID in `x-request-id` is adopted as the request id.
    ///
    /// # Errors
    ///
    /// Fails if the engine has not been given a dispatcher yet.
    pub fn execute(&self, mut req: Request) -> Result<DispatchResult> {
        let dispatcher = self
            .dispatcher
            .get()
            .ok_or_else(|| anyhow!("mock engine is not serving"))?;
        req.request_id = RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER));
        Ok(dispatcher.dispatch(req))
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn serve(&self, addr: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
        self.dispatcher
            .set(dispatcher)
            .map_err(|_| anyhow!("mock engine is already serving"))?;
        self.addr.get_or_init(|| addr.to_string());
        info!(engine = Self::NAME, addr = %addr, "Engine serving (in-process)");
        Ok(())
    }
}
