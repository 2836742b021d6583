//! Dispatcher core module - hot path for request dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use arc_swap::ArcSwap;
use http::Method;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::request::{Request, Response};
use crate::middleware::panic_message;
use crate::observer::{Observer, RequestInfo, TracingObserver};
use crate::router::{Resolution, RouteTable};

/// How a dispatched request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler ran
    Completed,
    /// A middleware answered before the handler
    Aborted,
    /// 404: no route for the path
    NotFound,
    /// 405: the path exists for other methods
    MethodNotAllowed { allowed: Vec<Method> },
    /// 500: a middleware or handler panicked
    Fault { message: String },
}

/// Response plus the outcome that produced it
#[derive(Debug)]
pub struct DispatchResult {
    pub response: Response,
    pub outcome: Outcome,
    reached_terminal: bool,
}

impl DispatchResult {
    fn new(response: Response, outcome: Outcome, reached_terminal: bool) -> Self {
        Self {
            response,
            outcome,
            reached_terminal,
        }
    }

    /// Whether the terminal handler ran. `false` for aborted chains and for
    /// 404/405, where no chain was entered.
    #[must_use]
    pub fn reached_terminal(&self) -> bool {
        self.reached_terminal
    }
}

/// Serving-phase entry point: resolve, run the chain, map the outcome.
///
/// The table is held in an [`ArcSwap`], so a rebuilt table can be installed
/// with [`swap_table`](Dispatcher::swap_table) while requests are in flight;
/// each request keeps the table it loaded at the start.
pub struct Dispatcher {
    table: ArcSwap<RouteTable>,
    observer: Arc<dyn Observer>,
}

impl Dispatcher {
    /// Dispatcher over a sealed table, reporting to [`TracingObserver`]
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self::with_observer(table, Arc::new(TracingObserver))
    }

    #[must_use]
    pub fn with_observer(table: Arc<RouteTable>, observer: Arc<dyn Observer>) -> Self {
        info!(
            routes_count = table.len(),
            sealed = table.is_sealed(),
            "Dispatcher created"
        );
        Self {
            table: ArcSwap::new(table),
            observer,
        }
    }

    /// Current route table
    #[must_use]
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Atomically replace the route table
    pub fn swap_table(&self, table: Arc<RouteTable>) {
        let previous = self.table.swap(Arc::clone(&table));
        info!(
            previous_routes = previous.len(),
            routes_count = table.len(),
            "Route table swapped"
        );
    }

    /// Dispatch one request.
    ///
    /// Never panics: handler and middleware panics become a 500 with a
    /// generic body, and a panicking observer is logged and ignored.
    #[allow(clippy::must_use_candidate)]
    pub fn dispatch(&self, mut req: Request) -> DispatchResult {
        let table = self.table.load();
        let request_id = req.request_id;
        let method = req.method.clone();
        let path = req.path.clone();

        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Dispatch start"
        );

        let resolution = table.resolve(&method, &path);
        let info = RequestInfo {
            request_id,
            method: &method,
            path: &path,
        };

        match resolution {
            Resolution::Matched(route_match) => {
                let route = route_match.route;
                req.params = route_match.context;

                let start = Instant::now();
                let outcome = route.handler().call(req);
                let latency = start.elapsed();

                match outcome.fault {
                    Some(fault) => {
                        self.notify(|o| o.on_fault(&info, &route, &fault));
                        DispatchResult::new(
                            outcome.response,
                            Outcome::Fault {
                                message: fault.message,
                            },
                            outcome.reached_terminal,
                        )
                    }
                    None if outcome.reached_terminal => {
                        let status = outcome.response.status;
                        self.notify(|o| o.on_completed(&info, &route, status, latency));
                        DispatchResult::new(outcome.response, Outcome::Completed, true)
                    }
                    None => {
                        let status = outcome.response.status;
                        self.notify(|o| o.on_aborted(&info, &route, status));
                        DispatchResult::new(outcome.response, Outcome::Aborted, false)
                    }
                }
            }
            Resolution::MethodNotAllowed { allowed } => {
                self.notify(|o| o.on_method_not_allowed(&info, &allowed));
                let mut response = Response::error(405, "Method Not Allowed");
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                response.set_header("allow", allow);
                DispatchResult::new(response, Outcome::MethodNotAllowed { allowed }, false)
            }
            Resolution::NotFound => {
                self.notify(|o| o.on_not_found(&info));
                DispatchResult::new(Response::error(404, "Not Found"), Outcome::NotFound, false)
            }
        }
    }

    fn notify<F>(&self, f: F)
    where
        F: FnOnce(&dyn Observer),
    {
        let observer = &*self.observer;
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| f(observer))) {
            error!(
                panic_message = %panic_message(panic.as_ref()),
                "Observer panicked - ignored"
            );
        }
    }
}
