//! Router core module - hot path for route resolution.
//!
//! `resolve` runs once per request on every serving thread. It never
//! mutates the table, never takes a lock and keeps parameter storage on the
//! stack for routes with up to [`MAX_INLINE_PARAMS`] parameters.

// Hot path: keep accidental allocations out of resolve
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{split_segments, PathPattern, PatternError};
use super::radix::RadixIndex;
use crate::config::RouterConfig;
use crate::context::DispatchContext;
use crate::middleware::ComposedHandler;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/:id/posts/:post_id).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the compiled pattern
/// and are shared by every request that matches it. Values are per-request
/// data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Inline capacity for split request paths.
const MAX_INLINE_SEGMENTS: usize = 16;

/// Methods a route may be registered for, in `Allow` header order.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Default threshold above which a route match is logged as slow.
pub const DEFAULT_SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// A registered route: method, compiled pattern and composed handler.
///
/// Routes are immutable once registered and shared by `Arc` between the
/// table, the index and every in-flight request that matched them.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: ComposedHandler,
    seq: usize,
}

impl Route {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &ComposedHandler {
        &self.handler
    }

    /// Registration sequence number (0-based, table-wide)
    #[must_use]
    pub fn seq(&self) -> usize {
        self.seq
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("middlewares", &self.handler.middleware_names())
            .field("seq", &self.seq)
            .finish()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route (Arc to avoid expensive clones)
    pub route: Arc<Route>,
    /// Path parameters extracted from the URL, named by the route's pattern
    pub context: DispatchContext,
}

impl RouteMatch {
    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.context.get(name)
    }
}

/// Outcome of [`RouteTable::resolve`].
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A route matched both method and path
    Matched(RouteMatch),
    /// The path matched, but only for other methods (sorted, deduplicated)
    MethodNotAllowed { allowed: Vec<Method> },
    /// No route matched the path for any method
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }

    /// Consume the resolution, keeping only a successful match
    #[must_use]
    pub fn into_match(self) -> Option<RouteMatch> {
        match self {
            Resolution::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The template failed to compile; nothing was inserted
    Pattern(PatternError),
    /// The table was sealed before this registration
    Sealed { method: Method, pattern: String },
    /// The method is outside [`SUPPORTED_METHODS`]
    UnsupportedMethod { method: Method },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Pattern(err) => write!(f, "{err}"),
            RouteError::Sealed { method, pattern } => write!(
                f,
                "cannot register {method} {pattern}: route table is sealed"
            ),
            RouteError::UnsupportedMethod { method } => {
                write!(f, "unsupported HTTP method '{method}'")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(err: PatternError) -> Self {
        RouteError::Pattern(err)
    }
}

/// The route table: every registered route, indexed by a segment tree.
///
/// Built single-threaded during setup, then [sealed](RouteTable::seal) into
/// an `Arc<RouteTable>` that any number of threads may resolve against.
pub struct RouteTable {
    index: RadixIndex,
    /// Registration order
    routes: Vec<Arc<Route>>,
    sealed: bool,
    slow_match_threshold: Duration,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .field("sealed", &self.sealed)
            .field("slow_match_threshold", &self.slow_match_threshold)
            .finish()
    }
}

impl RouteTable {
    /// Create an empty, unsealed table
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: RadixIndex::default(),
            routes: Vec::new(),
            sealed: false,
            slow_match_threshold: DEFAULT_SLOW_MATCH_THRESHOLD,
        }
    }

    /// Create an empty table using the tunables from `config`
    #[must_use]
    pub fn with_config(config: &RouterConfig) -> Self {
        Self {
            slow_match_threshold: config.slow_match_threshold(),
            ..Self::new()
        }
    }

    /// Empty, sealed table left behind in a builder after sealing, so that
    /// late registrations through surviving groups fail with `Sealed`.
    pub(crate) fn sealed_placeholder(slow_match_threshold: Duration) -> Self {
        Self {
            sealed: true,
            slow_match_threshold,
            ..Self::new()
        }
    }

    /// Register a route.
    ///
    /// The template is compiled here; a malformed template is reported
    /// immediately and leaves the table untouched. Registering a pattern that
    /// is structurally identical to an existing one for the same method is
    /// allowed, but the earlier route keeps winning and a warning is logged.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Sealed`] once the table has been sealed
    /// - [`RouteError::UnsupportedMethod`] for methods outside [`SUPPORTED_METHODS`]
    /// - [`RouteError::Pattern`] for a malformed template
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: ComposedHandler,
    ) -> Result<Arc<Route>, RouteError> {
        if self.sealed {
            return Err(RouteError::Sealed {
                method,
                pattern: template.to_string(),
            });
        }
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RouteError::UnsupportedMethod { method });
        }
        let pattern = PathPattern::compile(template)?;

        let route = Arc::new(Route {
            method,
            pattern,
            handler,
            seq: self.routes.len(),
        });

        if let Some(existing) = self.index.insert(Arc::clone(&route)) {
            warn!(
                route = %route,
                shadowed_by_seq = existing.seq(),
                "Route is shadowed by an identical earlier registration"
            );
        }
        self.routes.push(Arc::clone(&route));

        info!(
            method = %route.method(),
            pattern = %route.pattern(),
            seq = route.seq(),
            middleware_count = route.handler().middleware_count(),
            "Route registered"
        );

        Ok(route)
    }

    /// Seal the table for serving.
    ///
    /// After this point the table is shared read-only; no further routes can
    /// be added.
    #[must_use]
    pub fn seal(mut self) -> Arc<Self> {
        self.sealed = true;

        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|route| route.to_string())
            .collect();
        info!(
            routes_count = self.routes.len(),
            routes_summary = ?routes_summary,
            slow_match_threshold_us = self.slow_match_threshold.as_micros() as u64,
            "Routing table sealed"
        );

        Arc::new(self)
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Resolve a request to a route.
    ///
    /// Any query string on `path` is ignored. Among the routes matching both
    /// method and path, the most specific pattern wins, and the earliest
    /// registration wins between structurally identical patterns.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let path = path.split_once('?').map_or(path, |(before, _)| before);

        let match_start = Instant::now();
        let segments: SmallVec<[&str; MAX_INLINE_SEGMENTS]> = split_segments(path).collect();

        let resolution = match self.index.find(&segments, method) {
            Some(route) => Resolution::Matched(RouteMatch {
                route: Arc::clone(route),
                context: route.pattern().capture(&segments),
            }),
            None => {
                let allowed = self.allowed_methods(&segments);
                if allowed.is_empty() {
                    Resolution::NotFound
                } else {
                    Resolution::MethodNotAllowed { allowed }
                }
            }
        };
        let match_duration = match_start.elapsed();

        match &resolution {
            Resolution::Matched(m) => {
                if match_duration > self.slow_match_threshold {
                    warn!(
                        method = %method,
                        path = %path,
                        route_pattern = %m.route.pattern(),
                        path_params = ?m.context,
                        duration_us = match_duration.as_micros() as u64,
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        route_pattern = %m.route.pattern(),
                        path_params = ?m.context,
                        duration_us = match_duration.as_micros() as u64,
                        "Route matched"
                    );
                }
            }
            Resolution::MethodNotAllowed { allowed } => {
                debug!(
                    method = %method,
                    path = %path,
                    allowed = ?allowed,
                    "Path matched for other methods only"
                );
            }
            Resolution::NotFound => {
                debug!(method = %method, path = %path, "No route matched");
            }
        }

        resolution
    }

    fn allowed_methods(&self, segments: &[&str]) -> Vec<Method> {
        let candidates = self.index.matching_routes(segments);
        SUPPORTED_METHODS
            .iter()
            .filter(|method| candidates.iter().any(|route| route.method() == *method))
            .cloned()
            .collect()
    }

    /// All routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// All routes ordered from most to least specific, ties by registration
    #[must_use]
    pub fn routes_by_precedence(&self) -> Vec<Arc<Route>> {
        let mut ordered = self.routes.clone();
        ordered.sort_by(|a, b| {
            a.pattern()
                .specificity()
                .cmp(b.pattern().specificity())
                .then(a.seq().cmp(&b.seq()))
        });
        ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Log every registered route at `info`, in precedence order
    pub fn dump_routes(&self) {
        info!(
            routes_count = self.routes.len(),
            sealed = self.sealed,
            "Route table dump"
        );
        for route in self.routes_by_precedence() {
            info!(
                method = %route.method(),
                pattern = %route.pattern(),
                seq = route.seq(),
                middlewares = ?route.handler().middleware_names(),
                "Route"
            );
        }
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        self.slow_match_threshold
    }
}
