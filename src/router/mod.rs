//! # Router Module
//!
//! Path matching and route resolution for transwarp.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route templates (`/users/:id`, `/static/*path`) into typed segments
//! - Resolving an incoming (method, path) pair to exactly one route
//! - Extracting named path parameters into a [`DispatchContext`](crate::context::DispatchContext)
//! - Distinguishing "no such path" (404) from "path exists, wrong method" (405)
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: templates are compiled by [`PathPattern::compile`] and
//!    inserted into a segment tree. Malformed templates are rejected here.
//!
//! 2. **Resolution**: the sealed [`RouteTable`] walks the tree depth-first,
//!    static children before parameters before catch-alls, so the first route
//!    found is the most specific one.
//!
//! ## Precedence
//!
//! Patterns are ranked position by position with `Static > Param > CatchAll`;
//! the first position at which two patterns differ decides. Structurally
//! identical patterns are resolved in registration order.
//!
//! ```rust
//! use http::Method;
//! use transwarp::router::{Resolution, RouteTable};
//! use transwarp::middleware::MiddlewareChain;
//! use transwarp::{Request, Response};
//!
//! let mut table = RouteTable::new();
//! let chain = MiddlewareChain::new();
//! table
//!     .register(
//!         Method::GET,
//!         "/files/:name",
//!         chain.compose(|_req: Request| Response::text(200, "named")),
//!     )
//!     .unwrap();
//! table
//!     .register(
//!         Method::GET,
//!         "/files/config",
//!         chain.compose(|_req: Request| Response::text(200, "config")),
//!     )
//!     .unwrap();
//! let table = table.seal();
//!
//! match table.resolve(&Method::GET, "/files/config") {
//!     Resolution::Matched(m) => assert_eq!(m.route.pattern().as_str(), "/files/config"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;
mod pattern;
mod radix;

pub use core::{
    ParamVec, Resolution, Route, RouteError, RouteMatch, RouteTable, DEFAULT_SLOW_MATCH_THRESHOLD,
    MAX_INLINE_PARAMS, SUPPORTED_METHODS,
};
pub use pattern::{
    rewrite_braces, PathPattern, PathSegment, PatternError, SegmentKind, Specificity,
    CATCH_ALL_SIGIL, PARAM_SIGIL,
};
