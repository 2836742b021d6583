//! # Dispatcher Module
//!
//! The serving-phase entry point for transwarp. A host engine translates
//! its native request into a [`Request`] and calls
//! [`Dispatcher::dispatch`]; everything after that is engine-neutral.
//!
//! ## Request Flow
//!
//! 1. The current [`RouteTable`](crate::router::RouteTable) is loaded (lock-free)
//! 2. The (method, path) pair is resolved to a route, 404 or 405
//! 3. Captured parameters are placed in the request's `DispatchContext`
//! 4. The route's composed middleware chain runs, up to the handler
//! 5. The outcome is reported to the [`Observer`](crate::observer::Observer)
//!
//! ## Error Handling
//!
//! - No route for the path: 404 `{"error": "Not Found"}`
//! - Path registered for other methods only: 405 with an `Allow` header
//! - Middleware or handler panic: 500 `{"error": "Internal Server Error"}`;
//!   the panic message goes to logs and the observer, never to the client
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use transwarp::{Dispatcher, Outcome, Request, Response, Router};
//!
//! let router = Router::new();
//! router
//!     .get("/api/echo/:data", |req: Request| Response::text(200, req.param("data")))
//!     .unwrap();
//! let dispatcher = Dispatcher::new(router.seal());
//!
//! let result = dispatcher.dispatch(Request::new(Method::GET, "/api/echo/hello"));
//! assert_eq!(result.outcome, Outcome::Completed);
//! assert_eq!(result.response.body_text(), Some("hello"));
//! ```

mod core;
mod request;

pub use core::{DispatchResult, Dispatcher, Outcome};
pub use request::{HeaderVec, Request, Response, MAX_INLINE_HEADERS};
