use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use transwarp::middleware::{
    from_fn, AuthMiddleware, Middleware, MetricsMiddleware, MiddlewareChain, Next,
};
use transwarp::{Dispatcher, Outcome, Request, Response, Router};

mod common;
use common::reply;

/// Rejects with 403 unless `?admin=true` is present
struct Firewall;

impl Middleware for Firewall {
    fn handle(&self, req: Request, next: Next<'_>) -> Response {
        if req.get_query_param("admin") == Some("true") {
            next.run(req)
        } else {
            Response::text(403, "bloqueado")
        }
    }

    fn name(&self) -> &str {
        "firewall"
    }
}

#[test]
fn test_global_middleware_decorates_every_response() {
    let mut router = Router::new();
    router.use_middleware(from_fn(|req, next| {
        let mut res = next.run(req);
        res.set_header("X-Powered-By", "transwarp");
        res
    }));
    router.get("/a", reply("a")).unwrap();
    let nested = router.group("/deep").group("/er");
    nested.get("/b", reply("b")).unwrap();

    let dispatcher = Dispatcher::new(router.seal());
    for path in ["/a", "/deep/er/b"] {
        let res = dispatcher.dispatch(Request::new(Method::GET, path));
        assert_eq!(res.response.status, 200);
        assert_eq!(res.response.get_header("x-powered-by"), Some("transwarp"), "{path}");
    }
}

#[test]
fn test_firewall_aborts_before_handler() {
    let handler_runs = Arc::new(AtomicUsize::new(0));
    let router = Router::new();
    let mut protected = router.group("/admin");
    protected.use_middleware(Firewall);
    let runs = Arc::clone(&handler_runs);
    protected
        .get("/dashboard", move |_req: Request| {
            runs.fetch_add(1, Ordering::SeqCst);
            Response::text(200, "dashboard_data")
        })
        .unwrap();

    let dispatcher = Dispatcher::new(router.seal());

    let blocked = dispatcher.dispatch(Request::new(Method::GET, "/admin/dashboard"));
    assert_eq!(blocked.response.status, 403);
    assert_eq!(blocked.response.body_text(), Some("bloqueado"));
    assert_eq!(blocked.outcome, Outcome::Aborted);
    assert!(!blocked.reached_terminal());
    assert_eq!(handler_runs.load(Ordering::SeqCst), 0);

    let allowed = dispatcher.dispatch(Request::new(Method::GET, "/admin/dashboard?admin=true"));
    assert_eq!(allowed.response.status, 200);
    assert_eq!(allowed.response.body_text(), Some("dashboard_data"));
    assert_eq!(allowed.outcome, Outcome::Completed);
    assert!(allowed.reached_terminal());
    assert_eq!(handler_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_onion_order_across_groups_and_route() {
    let trace: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let layer = |label: &'static str| -> Arc<dyn Middleware> {
        let trace = Arc::clone(&trace);
        Arc::new(from_fn(move |req, next| {
            trace.lock().unwrap().push(format!("{label}:in"));
            let res = next.run(req);
            trace.lock().unwrap().push(format!("{label}:out"));
            res
        }))
    };

    let mut router = Router::new();
    router.use_arc(layer("root"));
    let mut api = router.group("/api");
    api.use_arc(layer("api"));

    let handler_trace = Arc::clone(&trace);
    api.handle_with(
        Method::GET,
        "/x",
        move |_req: Request| {
            handler_trace.lock().unwrap().push("handler".to_string());
            Response::empty(204)
        },
        &[layer("route")],
    )
    .unwrap();

    let dispatcher = Dispatcher::new(router.seal());
    let res = dispatcher.dispatch(Request::new(Method::GET, "/api/x"));
    assert_eq!(res.response.status, 204);
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["root:in", "api:in", "route:in", "handler", "route:out", "api:out", "root:out"]
    );
}

#[test]
fn test_per_route_middleware_can_abort() {
    let router = Router::new();
    let guard: Arc<dyn Middleware> = Arc::new(Firewall);
    router
        .handle_with(Method::GET, "/secret", reply("secret"), &[guard])
        .unwrap();
    router.get("/open", reply("open")).unwrap();

    let dispatcher = Dispatcher::new(router.seal());
    let res = dispatcher.dispatch(Request::new(Method::GET, "/secret"));
    assert_eq!(res.response.status, 403);
    assert_eq!(res.outcome, Outcome::Aborted);
    assert!(!res.reached_terminal());

    let res = dispatcher.dispatch(Request::new(Method::GET, "/open"));
    assert_eq!(res.response.body_text(), Some("open"));
}

#[test]
fn test_auth_middleware_on_group() {
    let router = Router::new();
    let mut api = router.group("/api");
    api.use_middleware(AuthMiddleware::new("t0ken"));
    api.get("/me", reply("me")).unwrap();
    let dispatcher = Dispatcher::new(router.seal());

    let res = dispatcher.dispatch(Request::new(Method::GET, "/api/me"));
    assert_eq!(res.response.status, 401);
    assert_eq!(res.response.get_header("www-authenticate"), Some("Bearer"));

    let res = dispatcher.dispatch(
        Request::new(Method::GET, "/api/me").with_header("Authorization", "Bearer t0ken"),
    );
    assert_eq!(res.response.status, 200);
}

#[test]
fn test_metrics_middleware_counts_layer_traffic() {
    let metrics = Arc::new(MetricsMiddleware::new());
    let mut router = Router::new();
    router.use_arc(Arc::clone(&metrics) as Arc<dyn Middleware>);
    router.get("/a", reply("a")).unwrap();
    let dispatcher = Dispatcher::new(router.seal());

    for _ in 0..3 {
        dispatcher.dispatch(Request::new(Method::GET, "/a"));
    }
    // 404s never enter a chain
    dispatcher.dispatch(Request::new(Method::GET, "/missing"));
    assert_eq!(metrics.request_count(), 3);
    assert!(metrics.render_prometheus().contains("transwarp_requests_total 3"));
}

#[test]
fn test_chain_names_follow_registration_order() {
    let chain = MiddlewareChain::new()
        .with(Arc::new(from_fn(|req, next| next.run(req)).named("first")))
        .with(Arc::new(Firewall))
        .with(Arc::new(AuthMiddleware::new("x")));
    assert_eq!(chain.names().collect::<Vec<_>>(), vec!["first", "firewall", "auth"]);

    let composed = chain.compose(reply("ok"));
    assert_eq!(composed.middleware_count(), 3);
}
