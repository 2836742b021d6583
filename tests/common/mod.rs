#![allow(dead_code)]

use http::Method;
use std::sync::Arc;
use transwarp::{Request, Response, RouteTable, Router};

pub mod tracing_capture {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::{Layer, Registry};

    /// A closed span with every field recorded on it
    #[derive(Debug, Clone, Default)]
    pub struct CapturedSpan {
        pub name: String,
        pub fields: Vec<(String, String)>,
    }

    impl CapturedSpan {
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// An event's level, message, and remaining fields
    #[derive(Debug, Clone)]
    pub struct CapturedEvent {
        pub level: Level,
        pub message: String,
        pub fields: Vec<(String, String)>,
    }

    impl CapturedEvent {
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct CaptureLayer {
        spans: Arc<Mutex<Vec<CapturedSpan>>>,
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S> Layer<S> for CaptureLayer
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let mut captured = CapturedSpan {
                name: attrs.metadata().name().to_string(),
                fields: Vec::new(),
            };
            attrs.record(&mut FieldVisitor(&mut captured.fields));
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().insert(captured);
            }
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            if let Some(span) = ctx.span(id) {
                if let Some(captured) = span.extensions_mut().get_mut::<CapturedSpan>() {
                    values.record(&mut FieldVisitor(&mut captured.fields));
                }
            }
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = Vec::new();
            event.record(&mut FieldVisitor(&mut fields));
            if let Some(pos) = fields.iter().position(|(k, _)| k == "message") {
                let (_, message) = fields.remove(pos);
                self.events.lock().unwrap().push(CapturedEvent {
                    level: *event.metadata().level(),
                    message,
                    fields,
                });
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            if let Some(span) = ctx.span(&id) {
                if let Some(captured) = span.extensions_mut().remove::<CapturedSpan>() {
                    self.spans.lock().unwrap().push(captured);
                }
            }
        }
    }

    /// Thread-local subscriber that records spans and event messages
    pub struct TestTracing {
        layer: CaptureLayer,
        _guard: tracing::subscriber::DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let layer = CaptureLayer::default();
            let subscriber = Registry::default().with(layer.clone());
            let guard = tracing::subscriber::set_default(subscriber);
            Self {
                layer,
                _guard: guard,
            }
        }

        pub fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
            self.layer
                .spans
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.name == name)
                .cloned()
                .collect()
        }

        pub fn has_event(&self, message: &str) -> bool {
            self.layer
                .events
                .lock()
                .unwrap()
                .iter()
                .any(|e| e.message == message)
        }

        pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
            self.layer
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.level == level)
                .cloned()
                .collect()
        }
    }
}

/// Handler that answers 200 with a fixed body
pub fn reply(body: &'static str) -> impl Fn(Request) -> Response + Send + Sync + 'static {
    move |_req: Request| Response::text(200, body)
}

/// Table with one route per `(method, pattern)`, each answering its pattern
pub fn table_of(routes: &[(Method, &str)]) -> Arc<RouteTable> {
    let router = Router::new();
    for (method, pattern) in routes {
        let body = pattern.to_string();
        router
            .handle(method.clone(), pattern, move |_req: Request| {
                Response::text(200, body.clone())
            })
            .unwrap();
    }
    router.seal()
}
