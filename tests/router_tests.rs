use http::Method;
use transwarp::router::{rewrite_braces, PatternError, SegmentKind};
use transwarp::{Request, Resolution, Response, RouteError, RouteTable, Router};

mod common;
use common::table_of;

fn assert_route_match(table: &RouteTable, method: Method, path: &str, expected: &str) {
    match table.resolve(&method, path) {
        Resolution::Matched(m) => assert_eq!(
            m.route.pattern().as_str(),
            expected,
            "{method} {path} matched the wrong route"
        ),
        other => panic!("{method} {path}: expected {expected}, got {other:?}"),
    }
}

#[test]
fn test_static_route_beats_dynamic_sibling() {
    // Registration order must not matter
    for order in [["/files/config", "/files/:name"], ["/files/:name", "/files/config"]] {
        let table = table_of(&[(Method::GET, order[0]), (Method::GET, order[1])]);
        assert_route_match(&table, Method::GET, "/files/config", "/files/config");

        let m = table
            .resolve(&Method::GET, "/files/report.pdf")
            .into_match()
            .unwrap();
        assert_eq!(m.route.pattern().as_str(), "/files/:name");
        assert_eq!(m.get_path_param("name"), Some("report.pdf"));
    }
}

#[test]
fn test_parameter_round_trip() {
    let table = table_of(&[(Method::GET, "/shop/category/:cat/item/:id")]);
    let m = table
        .resolve(&Method::GET, "/shop/category/books/item/42")
        .into_match()
        .unwrap();
    assert_eq!(m.context.param("cat"), "books");
    assert_eq!(m.context.param("id"), "42");
    assert_eq!(m.context.param("missing"), "");
    assert_eq!(m.context.len(), 2);
}

#[test]
fn test_catch_all_captures_remainder() {
    let table = table_of(&[(Method::GET, "/static/*path"), (Method::GET, "/static/:file")]);

    let m = table
        .resolve(&Method::GET, "/static/css/site/main.css")
        .into_match()
        .unwrap();
    assert_eq!(m.route.pattern().as_str(), "/static/*path");
    assert_eq!(m.get_path_param("path"), Some("css/site/main.css"));

    assert_route_match(&table, Method::GET, "/static/app.js", "/static/:file");
    // A catch-all needs at least one segment
    assert!(matches!(
        table.resolve(&Method::GET, "/static"),
        Resolution::NotFound
    ));
}

#[test]
fn test_dynamic_vs_dynamic_positional_rule() {
    let table = table_of(&[(Method::GET, "/:y/b"), (Method::GET, "/a/:x")]);
    assert_route_match(&table, Method::GET, "/a/b", "/a/:x");
    assert_route_match(&table, Method::GET, "/z/b", "/:y/b");
    assert!(!table.resolve(&Method::GET, "/z/c").is_matched());
}

#[test]
fn test_every_supported_method_routes() {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
    ];
    let routes: Vec<(Method, &str)> = methods
        .iter()
        .map(|m| (m.clone(), "/zoo/animals/:id"))
        .collect();
    let table = table_of(&routes);
    for method in methods {
        assert_route_match(&table, method, "/zoo/animals/9", "/zoo/animals/:id");
    }
}

#[test]
fn test_method_not_allowed_lists_methods_in_canonical_order() {
    let table = table_of(&[
        (Method::DELETE, "/zoo/animals/:id"),
        (Method::GET, "/zoo/animals/:id"),
        (Method::PATCH, "/zoo/animals/:id"),
    ]);
    match table.resolve(&Method::POST, "/zoo/animals/3") {
        Resolution::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::GET, Method::PATCH, Method::DELETE]);
        }
        other => panic!("expected 405, got {other:?}"),
    }
    assert!(matches!(
        table.resolve(&Method::GET, "/zoo/plants/3"),
        Resolution::NotFound
    ));
}

#[test]
fn test_brace_syntax_is_equivalent() {
    assert_eq!(rewrite_braces("/users/{id}/files/{path*}"), "/users/:id/files/*path");

    let table = table_of(&[(Method::GET, rewrite_braces("/users/{id}").as_str())]);
    let m = table.resolve(&Method::GET, "/users/7").into_match().unwrap();
    assert_eq!(m.get_path_param("id"), Some("7"));
}

#[test]
fn test_malformed_patterns_are_rejected_at_registration() {
    let router = Router::new();
    let handler = |_req: Request| Response::empty(200);

    let err = router.get("/a/:", handler).unwrap_err();
    assert!(matches!(err, RouteError::Pattern(PatternError::EmptyParamName { .. })));

    let err = router.get("/a/:id/b/:id", handler).unwrap_err();
    assert!(matches!(err, RouteError::Pattern(PatternError::DuplicateParamName { .. })));

    let err = router.get("/a/*rest/b", handler).unwrap_err();
    assert!(matches!(err, RouteError::Pattern(PatternError::CatchAllNotLast { .. })));

    assert!(router.seal().is_empty());
}

#[test]
fn test_specificity_is_lexicographic() {
    let table = table_of(&[
        (Method::GET, "/files/*rest"),
        (Method::GET, "/files/:name"),
        (Method::GET, "/files/config"),
    ]);
    let ordered = table.routes_by_precedence();
    let kinds: Vec<&[SegmentKind]> = ordered
        .iter()
        .map(|r| r.pattern().specificity().kinds())
        .collect();
    assert_eq!(kinds[0], &[SegmentKind::Static, SegmentKind::Static]);
    assert_eq!(kinds[1], &[SegmentKind::Static, SegmentKind::Param]);
    assert_eq!(kinds[2], &[SegmentKind::Static, SegmentKind::CatchAll]);
}

#[test]
fn test_resolution_is_repeatable() {
    let table = table_of(&[(Method::GET, "/a/:x"), (Method::GET, "/:y/b")]);
    let first = table.resolve(&Method::GET, "/a/b").into_match().unwrap();
    for _ in 0..100 {
        let again = table.resolve(&Method::GET, "/a/b").into_match().unwrap();
        assert_eq!(again.route.seq(), first.route.seq());
        assert_eq!(again.context, first.context);
    }
}
