use std::time::Instant;

use tracing::{field, info_span};

use super::{Middleware, Next};
use crate::dispatcher::{Request, Response};

/// Opens a `request` span around the inner layers and records the outcome
/// on it.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, req: Request, next: Next<'_>) -> Response {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = field::Empty,
            latency_us = field::Empty,
        );
        let start = Instant::now();
        let resp = span.in_scope(|| next.run(req));
        span.record("status", resp.status);
        span.record("latency_us", start.elapsed().as_micros() as u64);
        resp
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
