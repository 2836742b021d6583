//! Hierarchical route groups with inherited middleware.
//!
//! A [`Router`] owns the root [`Group`]. Subgroups extend the prefix and take
//! a snapshot of the parent's middleware at the moment they are created:
//!
//! ```rust
//! use transwarp::{Request, Response, Router};
//! use transwarp::middleware::from_fn;
//!
//! let router = Router::new();
//! let mut api = router.group("/api");
//! api.use_middleware(from_fn(|req, next| next.run(req)));
//!
//! let admin = api.group("admin");
//! admin.get("/settings", |_req: Request| Response::text(200, "settings")).unwrap();
//!
//! let table = router.seal();
//! assert_eq!(table.routes()[0].pattern().as_str(), "/api/admin/settings");
//! ```
//!
//! Groups are setup-time builders. They share the router's table through
//! `Rc<RefCell<_>>`, which keeps them on the setup thread; only the sealed
//! table crosses into serving.

use http::Method;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::config::RouterConfig;
use crate::middleware::{Handler, Middleware, MiddlewareChain};
use crate::router::{Route, RouteError, RouteTable, SUPPORTED_METHODS};

/// A route namespace: resolved prefix plus middleware snapshot.
pub struct Group {
    table: Rc<RefCell<RouteTable>>,
    prefix: String,
    middlewares: MiddlewareChain,
}

impl Group {
    /// Create a subgroup under `prefix`.
    ///
    /// The subgroup copies this group's current middleware. Middleware added
    /// to either side afterwards is not seen by the other.
    #[must_use]
    pub fn group(&self, prefix: &str) -> Group {
        let prefix = join_paths(&self.prefix, prefix);
        debug!(
            prefix = %prefix,
            inherited_middlewares = self.middlewares.len(),
            "Route group created"
        );
        Group {
            table: Rc::clone(&self.table),
            prefix,
            middlewares: self.middlewares.clone(),
        }
    }

    /// Add a middleware to this group; applies to routes registered after
    /// this call and to subgroups created after it.
    pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        self.use_arc(Arc::new(middleware))
    }

    /// Shared-ownership variant of [`use_middleware`](Group::use_middleware)
    pub fn use_arc(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        debug!(
            prefix = %self.display_prefix(),
            middleware = middleware.name(),
            "Middleware added to group"
        );
        self.middlewares.push(middleware);
        self
    }

    /// Register `handler` for `method` at this group's prefix + `pattern`.
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from the table: malformed pattern, unsupported
    /// method, or a table that has already been sealed.
    pub fn handle<H>(
        &self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError>
    where
        H: Handler + 'static,
    {
        self.handle_arc(method, pattern, Arc::new(handler))
    }

    /// Shared-ownership variant of [`handle`](Group::handle)
    ///
    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn handle_arc(
        &self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<Arc<Route>, RouteError> {
        self.register(method, pattern, &self.middlewares, handler)
    }

    /// Register `handler` with extra middleware for this route only.
    ///
    /// Route middleware run inside the group's, first one outermost, and are
    /// part of the same chain: an abort in any of them is reported as
    /// [`Outcome::Aborted`](crate::Outcome::Aborted).
    ///
    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn handle_with<H>(
        &self,
        method: Method,
        pattern: &str,
        handler: H,
        middlewares: &[Arc<dyn Middleware>],
    ) -> Result<Arc<Route>, RouteError>
    where
        H: Handler + 'static,
    {
        let mut chain = self.middlewares.clone();
        for middleware in middlewares {
            chain.push(Arc::clone(middleware));
        }
        self.register(method, pattern, &chain, Arc::new(handler))
    }

    fn register(
        &self,
        method: Method,
        pattern: &str,
        chain: &MiddlewareChain,
        handler: Arc<dyn Handler>,
    ) -> Result<Arc<Route>, RouteError> {
        let full = join_paths(&self.prefix, pattern);
        let composed = chain.compose_arc(handler);
        self.table.borrow_mut().register(method, &full, composed)
    }

    /// Register the same handler for every supported method.
    ///
    /// Stops at the first failure; routes registered before it stay.
    ///
    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn any<H>(&self, pattern: &str, handler: H) -> Result<Vec<Arc<Route>>, RouteError>
    where
        H: Handler + 'static,
    {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        SUPPORTED_METHODS
            .iter()
            .map(|method| self.handle_arc(method.clone(), pattern, Arc::clone(&handler)))
            .collect()
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn get<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::GET, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn post<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::POST, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn put<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::PUT, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn patch<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::PATCH, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn delete<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn head<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::HEAD, pattern, handler)
    }

    /// # Errors
    ///
    /// See [`handle`](Group::handle).
    pub fn options<H: Handler + 'static>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Arc<Route>, RouteError> {
        self.handle(Method::OPTIONS, pattern, handler)
    }

    /// Resolved prefix; `""` for the root group
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    fn display_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }
}

/// Route builder: the root group plus ownership of the table.
pub struct Router {
    root: Group,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::from_table(RouteTable::new())
    }

    #[must_use]
    pub fn with_config(config: &RouterConfig) -> Self {
        Self::from_table(RouteTable::with_config(config))
    }

    fn from_table(table: RouteTable) -> Self {
        Self {
            root: Group {
                table: Rc::new(RefCell::new(table)),
                prefix: String::new(),
                middlewares: MiddlewareChain::new(),
            },
        }
    }

    /// Finish setup and hand out the read-only table.
    ///
    /// Groups that outlive the router keep a sealed, empty table, so any
    /// registration through them fails with [`RouteError::Sealed`].
    #[must_use]
    pub fn seal(self) -> Arc<RouteTable> {
        let mut slot = self.root.table.borrow_mut();
        let placeholder = RouteTable::sealed_placeholder(slot.slow_match_threshold());
        let table = std::mem::replace(&mut *slot, placeholder);
        drop(slot);
        table.seal()
    }
}

impl Deref for Router {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.root
    }
}

impl DerefMut for Router {
    fn deref_mut(&mut self) -> &mut Group {
        &mut self.root
    }
}

/// Join path parts with exactly one `/` between non-empty parts.
///
/// Returns `""` when every part is empty, so the root group has no prefix.
fn join_paths(prefix: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + suffix.len() + 1);
    for part in [prefix, suffix] {
        let trimmed = part.trim_matches('/');
        if !trimmed.is_empty() {
            out.push('/');
            out.push_str(trimmed);
        }
    }
    out
}
