//! # transwarp
//!
//! **transwarp** is a framework-agnostic HTTP routing and middleware-composition
//! core. Routes are registered once, at setup time, into a segment tree; every
//! request then resolves to exactly one route by a deterministic precedence
//! rule that does not depend on registration order.
//!
//! ## Overview
//!
//! transwarp separates *routing* from *serving*. The core never owns a socket:
//! a host HTTP engine translates its native request into a [`Request`], calls
//! [`Dispatcher::dispatch`], and writes the [`Response`] back. Engines are
//! picked by name at startup through the [`EngineRegistry`].
//!
//! ## Architecture
//!
//! - **[`router`]** - Path patterns, the segment tree, and the sealed [`RouteTable`]
//! - **[`group`]** - [`Router`] and nested [`Group`]s with inherited middleware
//! - **[`middleware`]** - Onion-model middleware chains, composed once per route
//! - **[`dispatcher`]** - Serving-phase entry point: resolve, run the chain, report
//! - **[`context`]** - Per-request path parameters ([`DispatchContext`])
//! - **[`observer`]** - Outcome hooks for logging and metrics
//! - **[`registry`]** - Engine adapters and the in-process [`MockEngine`]
//! - **[`config`]** / **[`logging`]** - Startup configuration and tracing setup
//! - **[`cli`]** - The `transwarp` binary: check and resolve route manifests
//!
//! ## Precedence
//!
//! Patterns are compared segment by segment. At the first position where two
//! candidates differ, a static segment beats a `:param`, and a `:param` beats
//! a `*catch_all`. The routes below never conflict, whatever order they are
//! registered in:
//!
//! ```text
//! GET /files/config      -> exact match only
//! GET /files/:name       -> any single segment
//! GET /files/*path       -> everything else under /files
//! ```
//!
//! ## Request Lifecycle
//!
//! 1. **Setup** - routes are registered through a [`Router`] and its groups;
//!    each route's middleware chain is composed immediately
//! 2. **Seal** - [`Router::seal`] hands out an immutable `Arc<RouteTable>`
//! 3. **Resolve** - the dispatcher matches method + path: a route, 404, or 405
//! 4. **Execute** - middleware run outermost first; any of them may answer
//!    early without calling the next layer
//! 5. **Report** - the outcome goes to the configured [`Observer`](observer::Observer)
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use transwarp::middleware::from_fn;
//! use transwarp::{Dispatcher, Request, Response, Router};
//!
//! let mut router = Router::new();
//! router.use_middleware(from_fn(|req, next| {
//!     let mut res = next.run(req);
//!     res.set_header("x-powered-by", "transwarp");
//!     res
//! }));
//!
//! let api = router.group("/api");
//! api.get("/users/:id", |req: Request| Response::text(200, req.param("id")))
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(router.seal());
//! let result = dispatcher.dispatch(Request::new(Method::GET, "/api/users/42"));
//! assert_eq!(result.response.status, 200);
//! assert_eq!(result.response.body_text(), Some("42"));
//! assert_eq!(result.response.get_header("x-powered-by"), Some("transwarp"));
//! ```
//!
//! ## Concurrency
//!
//! Setup is single-threaded ([`Group`] is `!Send`). After sealing,
//! the table and dispatcher are shared read-only across any number of threads;
//! [`Dispatcher::swap_table`] replaces the whole table atomically.

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod group;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod observer;
pub mod registry;
pub mod router;

pub use config::{ConfigError, RouterConfig};
pub use context::DispatchContext;
pub use dispatcher::{DispatchResult, Dispatcher, Outcome, Request, Response};
pub use group::{Group, Router};
pub use ids::RequestId;
pub use registry::{Engine, EngineRegistry, MockEngine};
pub use router::{Resolution, RouteError, RouteTable};
