//! Dispatch outcome reporting.
//!
//! The dispatcher reports every request's outcome to one [`Observer`]. The
//! default is [`TracingObserver`], which logs through `tracing`;
//! [`MetricsMiddleware`](crate::middleware::MetricsMiddleware) is a counting
//! observer, and [`Observers`] fans out to several.

use http::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::ids::RequestId;
use crate::middleware::HandlerFault;
use crate::router::Route;

/// Identity of the request being reported
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub request_id: RequestId,
    pub method: &'a Method,
    pub path: &'a str,
}

/// Receives the outcome of every dispatched request.
///
/// All methods default to no-ops. Implementations run on the serving thread
/// and must be cheap; a panic inside an observer is caught and logged by the
/// dispatcher.
pub trait Observer: Send + Sync {
    /// The handler ran and returned a response
    fn on_completed(
        &self,
        _info: &RequestInfo<'_>,
        _route: &Route,
        _status: u16,
        _latency: Duration,
    ) {
    }

    /// A middleware answered without calling the handler
    fn on_aborted(&self, _info: &RequestInfo<'_>, _route: &Route, _status: u16) {}

    fn on_not_found(&self, _info: &RequestInfo<'_>) {}

    fn on_method_not_allowed(&self, _info: &RequestInfo<'_>, _allowed: &[Method]) {}

    /// A middleware or handler panicked
    fn on_fault(&self, _info: &RequestInfo<'_>, _route: &Route, _fault: &HandlerFault) {}
}

/// Logs outcomes with structured fields
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_completed(&self, info: &RequestInfo<'_>, route: &Route, status: u16, latency: Duration) {
        info!(
            request_id = %info.request_id,
            method = %info.method,
            path = %info.path,
            route = %route.pattern(),
            status = status,
            latency_us = latency.as_micros() as u64,
            "Request completed"
        );
    }

    fn on_aborted(&self, info: &RequestInfo<'_>, route: &Route, status: u16) {
        debug!(
            request_id = %info.request_id,
            method = %info.method,
            path = %info.path,
            route = %route.pattern(),
            status = status,
            "Middleware chain aborted before handler"
        );
    }

    fn on_not_found(&self, info: &RequestInfo<'_>) {
        warn!(
            request_id = %info.request_id,
            method = %info.method,
            path = %info.path,
            "No route matched"
        );
    }

    fn on_method_not_allowed(&self, info: &RequestInfo<'_>, allowed: &[Method]) {
        warn!(
            request_id = %info.request_id,
            method = %info.method,
            path = %info.path,
            allowed = ?allowed,
            "Method not allowed"
        );
    }

    fn on_fault(&self, info: &RequestInfo<'_>, route: &Route, fault: &HandlerFault) {
        error!(
            request_id = %info.request_id,
            method = %info.method,
            path = %info.path,
            route = %route.pattern(),
            panic_message = %fault.message,
            "Handler fault - CRITICAL"
        );
    }
}

/// Fans each event out to several observers, in order
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn Observer>>,
}

impl Observers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for Observers {
    fn on_completed(&self, info: &RequestInfo<'_>, route: &Route, status: u16, latency: Duration) {
        for o in &self.observers {
            o.on_completed(info, route, status, latency);
        }
    }

    fn on_aborted(&self, info: &RequestInfo<'_>, route: &Route, status: u16) {
        for o in &self.observers {
            o.on_aborted(info, route, status);
        }
    }

    fn on_not_found(&self, info: &RequestInfo<'_>) {
        for o in &self.observers {
            o.on_not_found(info);
        }
    }

    fn on_method_not_allowed(&self, info: &RequestInfo<'_>, allowed: &[Method]) {
        for o in &self.observers {
            o.on_method_not_allowed(info, allowed);
        }
    }

    fn on_fault(&self, info: &RequestInfo<'_>, route: &Route, fault: &HandlerFault) {
        for o in &self.observers {
            o.on_fault(info, route, fault);
        }
    }
}
