use http::{Extensions, Method};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::context::DispatchContext;
use crate::ids::RequestId;
use crate::router::ParamVec;

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` because they repeat across requests
/// (Content-Type, Authorization, ...). Values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Engine-neutral request handed through the middleware chain to a handler.
///
/// Host engines translate their native request into this type; the core
/// never sees engine types. `params` is filled by the dispatcher after a
/// successful resolve and is empty before that.
#[derive(Debug)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Decoded query string parameters, in order of appearance
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    /// Request body, already decoded by the host engine (if present)
    pub body: Option<Value>,
    /// Path parameters captured for the matched route
    pub params: DispatchContext,
    /// Out-of-band values (deadlines, cancellation tokens, auth claims)
    /// carried for handlers; the core never reads them
    pub extensions: Extensions,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    ///
    /// The query string is split off and percent-decoded.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let query_params = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query_params,
            headers: HeaderVec::new(),
            body: None,
            params: DispatchContext::default(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value);
        self
    }

    /// Adopt a correlation id supplied by the caller (e.g. `x-request-id`)
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Path parameter by name, `""` when absent
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.params.param(name)
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: if duplicate query parameter names exist
    /// (e.g., `?limit=10&limit=20`), returns the last occurrence.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a handler or a short-circuiting middleware
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a plain-text response; the text is carried as a JSON string
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("content-type"),
            "text/plain; charset=utf-8".to_string(),
        ));
        Self {
            status,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Create an error response: `{"error": message}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Status-only response with a null body
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Body as text, when it is a JSON string
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_str()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }
}
