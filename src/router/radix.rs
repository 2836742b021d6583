//! Segment tree index over compiled route patterns.
//!
//! Each node represents one path position. Children are kept in three
//! buckets, searched in precedence order:
//!
//! 1. static children (exact text match)
//! 2. a single parameter child, shared by every `:name` at this position
//! 3. a single catch-all child, shared by every `*name` at this position
//!
//! A depth-first search that tries those buckets in that order, and
//! backtracks on failure, visits candidate routes in ascending
//! [`Specificity`](super::pattern::Specificity) order. The first terminal
//! that carries a route for the requested method is therefore the most
//! specific match.
//!
//! Parameter names are not part of the tree: `/users/:id/posts` and
//! `/users/:user_id/comments` share the parameter node at position 1, and the
//! matched route's own pattern names the captured values. Keeping names out
//! of the structure is what stops `/a/:x/:z` from shadowing `/a/:y/c` on
//! `/a/1/c`.
//!
//! Routes stored on one terminal are structurally identical, so they are kept
//! in registration order and the first one registered for a method wins.

use http::Method;
use std::sync::Arc;

use super::core::Route;
use super::pattern::PathSegment;

/// Node in the segment tree
#[derive(Default)]
struct RadixNode {
    /// Literal text for static nodes (empty for the root and wildcard nodes)
    segment: Box<str>,
    /// Routes terminating at this node, in registration order
    routes: Vec<Arc<Route>>,
    /// Static children, matched by exact text
    children: Vec<RadixNode>,
    /// Shared child for `:param` segments at this depth
    param_child: Option<Box<RadixNode>>,
    /// Shared child for a trailing `*catch_all` segment at this depth
    catch_all_child: Option<Box<RadixNode>>,
}

impl RadixNode {
    fn new_static(segment: &str) -> Self {
        Self {
            segment: Box::from(segment),
            ..Self::default()
        }
    }

    /// Insert a route; returns the route it is shadowed by, if any.
    fn insert(&mut self, segments: &[PathSegment], route: Arc<Route>) -> Option<Arc<Route>> {
        let Some((head, rest)) = segments.split_first() else {
            let shadowed_by = self
                .routes
                .iter()
                .find(|existing| existing.method() == route.method())
                .cloned();
            self.routes.push(route);
            return shadowed_by;
        };

        let child: &mut RadixNode = match head {
            PathSegment::Static(text) => {
                let position = self
                    .children
                    .iter()
                    .position(|child| child.segment == *text);
                match position {
                    Some(idx) => &mut self.children[idx],
                    None => {
                        self.children.push(RadixNode::new_static(text));
                        let last = self.children.len() - 1;
                        &mut self.children[last]
                    }
                }
            }
            PathSegment::Param(_) => self.param_child.get_or_insert_with(Box::default),
            PathSegment::CatchAll(_) => self.catch_all_child.get_or_insert_with(Box::default),
        };
        child.insert(rest, route)
    }

    /// Find the most specific route for `method` matching `segments`.
    fn find(&self, segments: &[&str], method: &Method) -> Option<&Arc<Route>> {
        let Some((head, rest)) = segments.split_first() else {
            return self.routes.iter().find(|route| route.method() == method);
        };

        if let Some(child) = self.children.iter().find(|c| &*c.segment == *head) {
            if let Some(found) = child.find(rest, method) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let Some(found) = child.find(rest, method) {
                return Some(found);
            }
        }

        // A catch-all node is always terminal and segments is non-empty here
        self.catch_all_child
            .as_ref()
            .and_then(|child| child.routes.iter().find(|route| route.method() == method))
    }

    /// Collect every route, for any method, whose pattern matches `segments`.
    fn collect<'a>(&'a self, segments: &[&str], out: &mut Vec<&'a Arc<Route>>) {
        let Some((head, rest)) = segments.split_first() else {
            out.extend(self.routes.iter());
            return;
        };

        if let Some(child) = self.children.iter().find(|c| &*c.segment == *head) {
            child.collect(rest, out);
        }
        if let Some(child) = &self.param_child {
            child.collect(rest, out);
        }
        if let Some(child) = &self.catch_all_child {
            out.extend(child.routes.iter());
        }
    }
}

/// Segment tree used by [`RouteTable`](super::RouteTable) for O(k) lookups,
/// k being the number of path segments.
#[derive(Default)]
pub(crate) struct RadixIndex {
    root: RadixNode,
}

impl RadixIndex {
    pub(crate) fn insert(&mut self, route: Arc<Route>) -> Option<Arc<Route>> {
        let keyed = Arc::clone(&route);
        self.root.insert(keyed.pattern().segments(), route)
    }

    pub(crate) fn find(&self, segments: &[&str], method: &Method) -> Option<&Arc<Route>> {
        self.root.find(segments, method)
    }

    pub(crate) fn matching_routes(&self, segments: &[&str]) -> Vec<&Arc<Route>> {
        let mut out = Vec::new();
        self.root.collect(segments, &mut out);
        out
    }
}
