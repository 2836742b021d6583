//! # Middleware Module
//!
//! Onion-style interceptors around route handlers.
//!
//! A [`Middleware`] gets the request and a [`Next`] continuation. The first
//! middleware added to a group is the outermost layer. Returning a response
//! without calling `next.run` aborts the chain; the composed handler reports
//! this explicitly through [`ChainOutcome::reached_terminal`].
//!
//! Built-in middlewares:
//! - [`AuthMiddleware`] - static bearer token check (401 short-circuit)
//! - [`MetricsMiddleware`] - atomic request counters, also an observer
//! - [`TracingMiddleware`] - per-request `tracing` span
//!
//! Ad-hoc middlewares are written as closures with [`from_fn`].

mod auth;
mod chain;
mod core;
mod metrics;
mod tracing;

pub use auth::AuthMiddleware;
pub use chain::{ChainOutcome, ComposedHandler, HandlerFault, MiddlewareChain};
pub(crate) use chain::panic_message;
pub use core::{from_fn, FnMiddleware, Handler, Middleware, Next};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
