//! Route template compilation and single-pattern matching.
//!
//! A template such as `/shop/category/:cat/item/:id` or `/static/*path` is
//! compiled once, at registration time, into an ordered list of
//! [`PathSegment`]s and a [`Specificity`] rank. The rank is what makes route
//! selection deterministic when several registered patterns could match the
//! same request path.
//!
//! ## Syntax
//!
//! | Segment     | Kind       | Matches                                     |
//! |-------------|------------|---------------------------------------------|
//! | `users`     | `Static`   | exactly `users` (byte-for-byte)             |
//! | `:id`       | `Param`    | any single non-empty segment                |
//! | `*rest`     | `CatchAll` | one or more remaining segments, joined `/`  |
//!
//! Empty segments are ignored on both sides, so `/a/b/`, `/a//b` and `a/b`
//! compile to the same pattern and a trailing slash on a request path is
//! tolerated.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use super::core::{ParamVec, MAX_INLINE_PARAMS};
use crate::context::DispatchContext;

/// Sigil introducing a named single-segment parameter (`:id`).
pub const PARAM_SIGIL: char = ':';

/// Sigil introducing a catch-all parameter (`*path`).
pub const CATCH_ALL_SIGIL: char = '*';

/// Segment kind ordering used for precedence: `Static < Param < CatchAll`.
///
/// The derived `Ord` follows declaration order, so a smaller kind is a more
/// specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentKind {
    Static,
    Param,
    CatchAll,
}

/// One compiled segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Literal text compared byte-for-byte
    Static(Box<str>),
    /// Named parameter matching exactly one segment
    Param(Arc<str>),
    /// Named parameter swallowing the rest of the path; always last
    CatchAll(Arc<str>),
}

impl PathSegment {
    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        match self {
            PathSegment::Static(_) => SegmentKind::Static,
            PathSegment::Param(_) => SegmentKind::Param,
            PathSegment::CatchAll(_) => SegmentKind::CatchAll,
        }
    }

    /// Parameter name for `Param` and `CatchAll` segments
    #[must_use]
    pub fn param_name(&self) -> Option<&Arc<str>> {
        match self {
            PathSegment::Static(_) => None,
            PathSegment::Param(name) | PathSegment::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Static(text) => f.write_str(text),
            PathSegment::Param(name) => write!(f, "{PARAM_SIGIL}{name}"),
            PathSegment::CatchAll(name) => write!(f, "{CATCH_ALL_SIGIL}{name}"),
        }
    }
}

/// Precedence rank of a pattern: its segment kinds, compared lexicographically.
///
/// Lower is more specific. Two patterns that can both match a path are
/// ordered by the kind of the first segment at which they differ, so
/// `/files/config` < `/files/:name` < `/files/*rest`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(SmallVec<[SegmentKind; MAX_INLINE_PARAMS]>);

impl Specificity {
    #[must_use]
    pub fn kinds(&self) -> &[SegmentKind] {
        &self.0
    }
}

/// Error returned when a route template is malformed.
///
/// Registration surfaces this synchronously; a table containing a malformed
/// pattern is never built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A `:` or `*` sigil with no name after it
    EmptyParamName { template: String, position: usize },
    /// A parameter name containing characters other than `[A-Za-z0-9_]`
    InvalidParamName { template: String, name: String },
    /// The same parameter name used twice in one template
    DuplicateParamName { template: String, name: String },
    /// A catch-all segment followed by further segments
    CatchAllNotLast { template: String, name: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::EmptyParamName { template, position } => write!(
                f,
                "invalid route pattern '{template}': parameter at segment {position} has an empty name"
            ),
            PatternError::InvalidParamName { template, name } => write!(
                f,
                "invalid route pattern '{template}': parameter name '{name}' must only contain [A-Za-z0-9_]"
            ),
            PatternError::DuplicateParamName { template, name } => write!(
                f,
                "invalid route pattern '{template}': parameter '{name}' is declared more than once"
            ),
            PatternError::CatchAllNotLast { template, name } => write!(
                f,
                "invalid route pattern '{template}': catch-all '{CATCH_ALL_SIGIL}{name}' must be the last segment"
            ),
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Canonical form, e.g. `/files/:name`
    template: String,
    segments: Vec<PathSegment>,
    specificity: Specificity,
}

impl PathPattern {
    /// Compile a template into a pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] for an empty or non-identifier parameter
    /// name, a duplicate parameter name, or a catch-all that is not the final
    /// segment.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let raw: SmallVec<[&str; MAX_INLINE_PARAMS]> = split_segments(template).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen: SmallVec<[&str; MAX_INLINE_PARAMS]> = SmallVec::new();

        for (position, segment) in raw.iter().enumerate() {
            let compiled = if let Some(name) = segment.strip_prefix(PARAM_SIGIL) {
                check_param_name(template, position, name, &mut seen)?;
                PathSegment::Param(Arc::from(name))
            } else if let Some(name) = segment.strip_prefix(CATCH_ALL_SIGIL) {
                check_param_name(template, position, name, &mut seen)?;
                if position + 1 != raw.len() {
                    return Err(PatternError::CatchAllNotLast {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                PathSegment::CatchAll(Arc::from(name))
            } else {
                PathSegment::Static(Box::from(*segment))
            };
            segments.push(compiled);
        }

        let specificity = Specificity(segments.iter().map(PathSegment::kind).collect());
        let template = canonical_template(&segments);

        Ok(Self {
            template,
            segments,
            specificity,
        })
    }

    /// Canonical template string (leading slash, no empty segments)
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn specificity(&self) -> &Specificity {
        &self.specificity
    }

    /// Names of all parameters in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter_map(PathSegment::param_name)
            .map(|name| &**name)
    }

    #[must_use]
    pub fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::CatchAll(_)))
    }

    /// Match a request path against this pattern alone.
    ///
    /// Returns the captured parameters on success. Precedence between
    /// several patterns is the route table's job; this only answers whether
    /// this one pattern accepts the path.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<DispatchContext> {
        let segments: SmallVec<[&str; MAX_INLINE_PARAMS]> = split_segments(path).collect();
        if !self.accepts(&segments) {
            return None;
        }
        Some(self.capture(&segments))
    }

    fn accepts(&self, segments: &[&str]) -> bool {
        for (position, compiled) in self.segments.iter().enumerate() {
            match compiled {
                PathSegment::Static(text) => {
                    if segments.get(position).copied() != Some(&**text) {
                        return false;
                    }
                }
                PathSegment::Param(_) => {
                    if position >= segments.len() {
                        return false;
                    }
                }
                PathSegment::CatchAll(_) => return position < segments.len(),
            }
        }
        segments.len() == self.segments.len()
    }

    /// Extract parameter values by position from already-matched segments.
    pub(crate) fn capture(&self, segments: &[&str]) -> DispatchContext {
        let mut params = ParamVec::new();
        for (position, compiled) in self.segments.iter().enumerate() {
            match compiled {
                PathSegment::Static(_) => {}
                PathSegment::Param(name) => {
                    if let Some(value) = segments.get(position) {
                        params.push((Arc::clone(name), (*value).to_string()));
                    }
                }
                PathSegment::CatchAll(name) => {
                    if let Some(rest) = segments.get(position..) {
                        params.push((Arc::clone(name), rest.join("/")));
                    }
                }
            }
        }
        DispatchContext::new(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Split a path into its non-empty `/`-separated segments.
pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn check_param_name<'t>(
    template: &str,
    position: usize,
    name: &'t str,
    seen: &mut SmallVec<[&'t str; MAX_INLINE_PARAMS]>,
) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyParamName {
            template: template.to_string(),
            position,
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidParamName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    if seen.contains(&name) {
        return Err(PatternError::DuplicateParamName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    seen.push(name);
    Ok(())
}

fn canonical_template(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&segment.to_string());
    }
    out
}

#[allow(clippy::expect_used)]
static BRACE_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z0-9_]+)(\*)?\}").expect("brace parameter regex is valid")
});

/// Rewrite brace-delimited parameters into the canonical sigil syntax.
///
/// `/users/{id}` becomes `/users/:id` and `/assets/{path*}` becomes
/// `/assets/*path`. Host engines whose native syntax uses braces translate
/// their templates with this before registering them.
#[must_use]
pub fn rewrite_braces(template: &str) -> String {
    BRACE_PARAM
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let sigil = if caps.get(2).is_some() {
                CATCH_ALL_SIGIL
            } else {
                PARAM_SIGIL
            };
            format!("{sigil}{}", &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_static_param_catch_all() {
        let pattern = PathPattern::compile("/assets/:bucket/*path").unwrap();
        assert_eq!(pattern.as_str(), "/assets/:bucket/*path");
        assert_eq!(
            pattern.specificity().kinds(),
            &[SegmentKind::Static, SegmentKind::Param, SegmentKind::CatchAll]
        );
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["bucket", "path"]);
        assert!(pattern.has_catch_all());
    }

    #[test]
    fn test_compile_normalizes_slashes() {
        let a = PathPattern::compile("/a//b/").unwrap();
        let b = PathPattern::compile("a/b").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "/a/b");
        assert_eq!(PathPattern::compile("").unwrap().as_str(), "/");
        assert_eq!(PathPattern::compile("/").unwrap().as_str(), "/");
    }

    #[test]
    fn test_compile_rejects_catch_all_not_last() {
        let err = PathPattern::compile("/files/*rest/meta").unwrap_err();
        assert!(matches!(err, PatternError::CatchAllNotLast { ref name, .. } if name == "rest"));
    }

    #[test]
    fn test_compile_rejects_empty_names() {
        assert!(matches!(
            PathPattern::compile("/users/:").unwrap_err(),
            PatternError::EmptyParamName { position: 1, .. }
        ));
        assert!(matches!(
            PathPattern::compile("/files/*").unwrap_err(),
            PatternError::EmptyParamName { position: 1, .. }
        ));
    }

    #[test]
    fn test_compile_rejects_duplicate_names() {
        let err = PathPattern::compile("/org/:id/user/:id").unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParamName { ref name, .. } if name == "id"));
        assert!(PathPattern::compile("/org/:id/files/*id").is_err());
    }

    #[test]
    fn test_compile_rejects_non_identifier_names() {
        let err = PathPattern::compile("/v1/product/:id.json").unwrap_err();
        assert!(matches!(
            err,
            PatternError::InvalidParamName { ref name, .. } if name == "id.json"
        ));
    }

    #[test]
    fn test_sigil_only_at_segment_start_is_static() {
        let pattern = PathPattern::compile("/time/12:30").unwrap();
        assert_eq!(pattern.specificity().kinds(), &[SegmentKind::Static, SegmentKind::Static]);
        assert!(pattern.match_path("/time/12:30").is_some());
    }

    #[test]
    fn test_match_static_is_case_sensitive() {
        let pattern = PathPattern::compile("/Files/config").unwrap();
        assert!(pattern.match_path("/Files/config").is_some());
        assert!(pattern.match_path("/files/config").is_none());
    }

    #[test]
    fn test_match_params() {
        let pattern = PathPattern::compile("/shop/category/:cat/item/:id").unwrap();
        let ctx = pattern.match_path("/shop/category/books/item/42").unwrap();
        assert_eq!(ctx.param("cat"), "books");
        assert_eq!(ctx.param("id"), "42");
        assert!(pattern.match_path("/shop/category/books/item").is_none());
        assert!(pattern.match_path("/shop/category/books/item/42/extra").is_none());
    }

    #[test]
    fn test_match_catch_all_joins_remainder() {
        let pattern = PathPattern::compile("/static/*path").unwrap();
        let ctx = pattern.match_path("/static/css/site/main.css").unwrap();
        assert_eq!(ctx.param("path"), "css/site/main.css");
        // catch-all needs at least one segment
        assert!(pattern.match_path("/static").is_none());
        assert!(pattern.match_path("/static/").is_none());
    }

    #[test]
    fn test_match_root() {
        let root = PathPattern::compile("/").unwrap();
        assert!(root.match_path("/").is_some());
        assert!(root.match_path("").is_some());
        assert!(root.match_path("/x").is_none());
    }

    #[test]
    fn test_specificity_ordering() {
        let fixed = PathPattern::compile("/files/config").unwrap();
        let named = PathPattern::compile("/files/:name").unwrap();
        let rest = PathPattern::compile("/files/*rest").unwrap();
        assert!(fixed.specificity() < named.specificity());
        assert!(named.specificity() < rest.specificity());

        // first point of difference decides, not the total number of params
        let a = PathPattern::compile("/a/:x/:y").unwrap();
        let b = PathPattern::compile("/:x/b/c").unwrap();
        assert!(a.specificity() < b.specificity());
    }

    #[test]
    fn test_rewrite_braces() {
        assert_eq!(rewrite_braces("/users/{id}"), "/users/:id");
        assert_eq!(
            rewrite_braces("/users/{user_id}/posts/{post_id}"),
            "/users/:user_id/posts/:post_id"
        );
        assert_eq!(rewrite_braces("/assets/{path*}"), "/assets/*path");
        assert_eq!(rewrite_braces("/plain"), "/plain");
    }
}
