//! Per-request parameter bag.
//!
//! A [`DispatchContext`] is built once per request, right after a successful
//! resolve, and travels inside the [`Request`](crate::Request) through every
//! middleware into the handler. It is never shared between requests, so
//! concurrent requests on the same route cannot observe each other's values.

use std::collections::HashMap;
use std::sync::Arc;

use crate::router::ParamVec;

/// Path parameters captured for one request, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
    params: ParamVec,
}

impl DispatchContext {
    #[must_use]
    pub fn new(params: ParamVec) -> Self {
        Self { params }
    }

    /// Build a context from loose name/value pairs (tests and adapters)
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into()))
                .collect(),
        }
    }

    /// Value of the named parameter, or `""` when the route declares no such
    /// parameter.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Value of the named parameter, if present.
    ///
    /// Names are unique within a pattern; should an adapter insert a
    /// duplicate anyway, the last one wins.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Convert to a HashMap
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
