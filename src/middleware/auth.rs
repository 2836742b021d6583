use super::{Middleware, Next};
use crate::dispatcher::{Request, Response};

/// Static bearer-token check.
///
/// Requests without `Authorization: Bearer <token>` matching the configured
/// token are answered with 401 and never reach inner layers.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, req: Request, next: Next<'_>) -> Response {
        let presented = req
            .get_header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "));
        match presented {
            Some(token) if token == self.token => next.run(req),
            _ => {
                let mut resp = Response::error(401, "Unauthorized");
                resp.set_header("www-authenticate", "Bearer");
                resp
            }
        }
    }

    fn name(&self) -> &str {
        "auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareChain;
    use http::Method;
    use std::sync::Arc;

    #[test]
    fn test_auth_rejects_and_admits() {
        let chain = MiddlewareChain::new().with(Arc::new(AuthMiddleware::new("s3cret")));
        let composed = chain.compose(|_req: Request| Response::text(200, "in"));

        let denied = composed.call(Request::new(Method::GET, "/"));
        assert_eq!(denied.response.status, 401);
        assert!(!denied.reached_terminal);
        assert_eq!(denied.response.get_header("WWW-Authenticate"), Some("Bearer"));

        let wrong = composed.call(
            Request::new(Method::GET, "/").with_header("Authorization", "Bearer nope"),
        );
        assert_eq!(wrong.response.status, 401);

        let admitted = composed.call(
            Request::new(Method::GET, "/").with_header("Authorization", "Bearer s3cret"),
        );
        assert_eq!(admitted.response.status, 200);
        assert!(admitted.reached_terminal);
    }
}
