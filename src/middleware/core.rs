use std::cell::Cell;
use std::sync::Arc;

use crate::dispatcher::{Request, Response};

/// Terminal request handler.
///
/// Any `Fn(Request) -> Response + Send + Sync` closure is a handler.
pub trait Handler: Send + Sync {
    fn call(&self, req: Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Response + Send + Sync,
{
    fn call(&self, req: Request) -> Response {
        self(req)
    }
}

/// An interceptor in the onion around a handler.
///
/// `handle` receives the request and a [`Next`] continuation. Calling
/// `next.run(req)` passes control inward and returns the inner response,
/// which the middleware may inspect or modify before returning it.
/// Returning without calling `next.run` aborts the chain: no inner
/// middleware and no handler run, and the returned response is used.
pub trait Middleware: Send + Sync {
    fn handle(&self, req: Request, next: Next<'_>) -> Response;

    /// Name used in logs and route dumps
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Continuation to the rest of a middleware chain.
///
/// Consumed by [`run`](Next::run), so it can be invoked at most once.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Handler,
    reached: &'a Cell<bool>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middlewares: &'a [Arc<dyn Middleware>],
        terminal: &'a dyn Handler,
        reached: &'a Cell<bool>,
    ) -> Self {
        Self {
            middlewares,
            terminal,
            reached,
        }
    }

    /// Run the remaining middlewares and the handler
    #[must_use]
    pub fn run(self, req: Request) -> Response {
        match self.middlewares.split_first() {
            Some((head, rest)) => head.handle(req, Next::new(rest, self.terminal, self.reached)),
            None => {
                self.reached.set(true);
                self.terminal.call(req)
            }
        }
    }

    /// Number of middlewares still ahead of the handler
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.middlewares.len()
    }
}

/// Middleware built from a closure; see [`from_fn`].
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F> {
    /// Give the middleware a name for logs and route dumps
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next<'_>) -> Response + Send + Sync,
{
    fn handle(&self, req: Request, next: Next<'_>) -> Response {
        (self.f)(req, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Turn a closure into a [`Middleware`].
///
/// ```rust
/// use transwarp::middleware::from_fn;
///
/// let powered_by = from_fn(|req, next| {
///     let mut resp = next.run(req);
///     resp.set_header("X-Powered-By", "transwarp");
///     resp
/// });
/// ```
#[must_use]
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next<'_>) -> Response + Send + Sync,
{
    FnMiddleware {
        name: "fn".to_string(),
        f,
    }
}
