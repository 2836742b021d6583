use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use http::Method;

use super::{HandlerFault, Middleware, Next};
use crate::dispatcher::{Request, Response};
use crate::observer::{Observer, RequestInfo};
use crate::router::Route;

/// Request counters, usable both as a middleware and as an observer.
///
/// As a middleware it counts requests passing through its layer and their
/// latency. As an [`Observer`] registered on the dispatcher it counts
/// outcomes, including 404/405 that never reach any chain.
///
/// All counters use atomic operations for thread-safe updates without locks.
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    completed: AtomicUsize,
    aborted: AtomicUsize,
    not_found: AtomicUsize,
    method_not_allowed: AtomicUsize,
    faults: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            completed: AtomicUsize::new(0),
            aborted: AtomicUsize::new(0),
            not_found: AtomicUsize::new(0),
            method_not_allowed: AtomicUsize::new(0),
            faults: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that passed through this layer
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean time spent inside this layer; zero before the first request
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn not_found(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn method_not_allowed(&self) -> usize {
        self.method_not_allowed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn faults(&self) -> usize {
        self.faults.load(Ordering::Relaxed)
    }

    /// Render the counters in Prometheus text exposition format
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let mut output = String::new();
        output.push_str("# HELP transwarp_requests_total Requests seen by the metrics layer\n");
        output.push_str("# TYPE transwarp_requests_total counter\n");
        output.push_str(&format!("transwarp_requests_total {}\n", self.request_count()));

        output.push_str("# HELP transwarp_request_latency_seconds_avg Mean latency inside the metrics layer\n");
        output.push_str("# TYPE transwarp_request_latency_seconds_avg gauge\n");
        output.push_str(&format!(
            "transwarp_request_latency_seconds_avg {:.6}\n",
            self.average_latency().as_secs_f64()
        ));

        output.push_str("# HELP transwarp_dispatch_outcomes_total Dispatch outcomes by kind\n");
        output.push_str("# TYPE transwarp_dispatch_outcomes_total counter\n");
        for (outcome, value) in [
            ("completed", self.completed()),
            ("aborted", self.aborted()),
            ("not_found", self.not_found()),
            ("method_not_allowed", self.method_not_allowed()),
            ("fault", self.faults()),
        ] {
            output.push_str(&format!(
                "transwarp_dispatch_outcomes_total{{outcome=\"{outcome}\"}} {value}\n"
            ));
        }
        output
    }
}

impl Middleware for MetricsMiddleware {
    fn handle(&self, req: Request, next: Next<'_>) -> Response {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let resp = next.run(req);
        self.total_latency_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        resp
    }

    fn name(&self) -> &str {
        "metrics"
    }
}

impl Observer for MetricsMiddleware {
    fn on_completed(
        &self,
        _info: &RequestInfo<'_>,
        _route: &Route,
        _status: u16,
        _latency: Duration,
    ) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_aborted(&self, _info: &RequestInfo<'_>, _route: &Route, _status: u16) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    fn on_not_found(&self, _info: &RequestInfo<'_>) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    fn on_method_not_allowed(&self, _info: &RequestInfo<'_>, _allowed: &[Method]) {
        self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_fault(&self, _info: &RequestInfo<'_>, _route: &Route, _fault: &HandlerFault) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }
}
