//! Onion composition of middlewares around a terminal handler.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use super::core::{Handler, Middleware, Next};
use crate::dispatcher::{Request, Response};

/// Ordered middleware stack; the first entry is the outermost layer.
///
/// Cloning copies the list of layers (the layers themselves are shared), so
/// a clone can grow independently of the original. Groups rely on this to
/// give each subgroup its own snapshot.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|mw| mw.name()))
            .finish()
    }
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer (innermost so far)
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.layers.push(middleware);
    }

    /// Copy of this chain with one more layer
    #[must_use]
    pub fn with(&self, middleware: Arc<dyn Middleware>) -> Self {
        let mut next = self.clone();
        next.push(middleware);
        next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|mw| mw.name())
    }

    /// Freeze the current layers around `handler`
    #[must_use]
    pub fn compose<H>(&self, handler: H) -> ComposedHandler
    where
        H: Handler + 'static,
    {
        self.compose_arc(Arc::new(handler))
    }

    #[must_use]
    pub fn compose_arc(&self, handler: Arc<dyn Handler>) -> ComposedHandler {
        ComposedHandler {
            layers: Arc::from(self.layers.as_slice()),
            terminal: handler,
        }
    }
}

/// A panic raised by a middleware or handler, caught at the chain boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    pub message: String,
}

impl fmt::Display for HandlerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler panicked: {}", self.message)
    }
}

impl std::error::Error for HandlerFault {}

/// Result of running a composed handler.
#[derive(Debug)]
pub struct ChainOutcome {
    pub response: Response,
    /// Whether control reached the terminal handler. `false` means a
    /// middleware answered without calling `next.run`.
    pub reached_terminal: bool,
    /// Set when the chain panicked; `response` is then a generic 500
    pub fault: Option<HandlerFault>,
}

/// Immutable middleware snapshot plus terminal handler.
///
/// Stored on each route and shared by every request that resolves to it.
#[derive(Clone)]
pub struct ComposedHandler {
    layers: Arc<[Arc<dyn Middleware>]>,
    terminal: Arc<dyn Handler>,
}

impl ComposedHandler {
    /// Run the chain for one request.
    ///
    /// Panics from any layer are caught and reported in
    /// [`ChainOutcome::fault`]; they never propagate to the caller.
    #[allow(clippy::must_use_candidate)]
    pub fn call(&self, req: Request) -> ChainOutcome {
        let reached = Cell::new(false);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            Next::new(&self.layers, &*self.terminal, &reached).run(req)
        }));

        match result {
            Ok(response) => ChainOutcome {
                response,
                reached_terminal: reached.get(),
                fault: None,
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                debug!(
                    panic_message = %message,
                    reached_terminal = reached.get(),
                    "Handler panicked - recovered at chain boundary"
                );
                ChainOutcome {
                    response: Response::error(500, "Internal Server Error"),
                    reached_terminal: reached.get(),
                    fault: Some(HandlerFault { message }),
                }
            }
        }
    }

    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn middleware_names(&self) -> Vec<&str> {
        self.layers.iter().map(|mw| mw.name()).collect()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use http::Method;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |req, next| {
            log.lock().unwrap().push(format!("{tag}:before"));
            let resp = next.run(req);
            log.lock().unwrap().push(format!("{tag}:after"));
            resp
        }))
    }

    #[test]
    fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recorder(&log, "outer"));
        chain.push(recorder(&log, "inner"));

        let handler_log = Arc::clone(&log);
        let composed = chain.compose(move |_req: Request| {
            handler_log.lock().unwrap().push("handler".to_string());
            Response::text(200, "ok")
        });

        let outcome = composed.call(Request::new(Method::GET, "/"));
        assert!(outcome.reached_terminal);
        assert!(outcome.fault.is_none());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer:before", "inner:before", "handler", "inner:after", "outer:after"]
        );
    }

    #[test]
    fn test_abort_skips_inner_layers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(from_fn(|_req, _next| Response::text(403, "denied"))));
        chain.push(recorder(&log, "inner"));

        let composed = chain.compose(|_req: Request| Response::text(200, "ok"));
        let outcome = composed.call(Request::new(Method::GET, "/"));

        assert!(!outcome.reached_terminal);
        assert_eq!(outcome.response.status, 403);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_panic_becomes_generic_500() {
        let composed = MiddlewareChain::new().compose(|_req: Request| -> Response {
            panic!("secret detail");
        });
        let outcome = composed.call(Request::new(Method::GET, "/"));

        assert_eq!(outcome.response.status, 500);
        assert!(!outcome.response.body.to_string().contains("secret"));
        assert!(outcome.reached_terminal);
        assert_eq!(outcome.fault.unwrap().message, "secret detail");
    }

    #[test]
    fn test_with_does_not_touch_original() {
        let base = MiddlewareChain::new().with(Arc::new(from_fn(|req, next| next.run(req))));
        let extended = base.with(Arc::new(from_fn(|req, next| next.run(req)).named("extra")));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.names().last(), Some("extra"));
    }

    #[test]
    fn test_snapshot_is_frozen_at_compose() {
        let mut chain = MiddlewareChain::new();
        let composed = chain.compose(|_req: Request| Response::empty(204));
        chain.push(Arc::new(from_fn(|_req, _next| Response::empty(403))));

        let outcome = composed.call(Request::new(Method::GET, "/"));
        assert_eq!(outcome.response.status, 204);
        assert_eq!(composed.middleware_count(), 0);
    }
}
