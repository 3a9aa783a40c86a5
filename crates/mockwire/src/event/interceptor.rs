use super::{EventTransport, Exchange, ReadyState, RequestEvent};
use crate::engine::MockEngine;
use crate::error::TransportError;
use crate::response::{apply_delay, status_text, synthesize_lenient};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Event-driven transport that replays a full response lifecycle from a mock
/// rule and hands unmatched requests to the original transport.
pub struct EventInterceptor {
    engine: Arc<MockEngine>,
    original: Arc<dyn EventTransport>,
}

impl EventInterceptor {
    pub fn new(engine: Arc<MockEngine>, original: Arc<dyn EventTransport>) -> Self {
        Self { engine, original }
    }

    pub fn original(&self) -> &Arc<dyn EventTransport> {
        &self.original
    }
}

#[async_trait]
impl EventTransport for EventInterceptor {
    fn open(&self, exchange: &mut Exchange, method: &str, url: &str) -> Result<(), TransportError> {
        // Matching happens at send time, so the request line is kept either way.
        exchange.capture(method, url);
        self.original.open(exchange, method, url)
    }

    async fn send(
        &self,
        exchange: &mut Exchange,
        body: Option<Bytes>,
    ) -> Result<(), TransportError> {
        let matched = exchange
            .request_line()
            .and_then(|(method, url)| self.engine.resolve(url, method));
        let Some(rule) = matched else {
            return self.original.send(exchange, body).await;
        };

        exchange.mark_intercepted();
        apply_delay(rule.delay_ms).await;

        let response = synthesize_lenient(&rule);

        exchange.set_ready_state(ReadyState::Opened);
        exchange.set_response_head(
            response.status,
            status_text(response.status),
            response.headers,
        );
        exchange.set_ready_state(ReadyState::HeadersReceived);
        exchange.set_response_body(response.body);
        exchange.set_ready_state(ReadyState::Loading);
        exchange.set_ready_state(ReadyState::Done);

        if let Some(url) = exchange.url() {
            self.engine.announce(&rule, url);
        }

        exchange.dispatch(RequestEvent::Load);
        exchange.dispatch(RequestEvent::LoadEnd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, MockRule, RuleMethod};
    use crate::event::EventRequest;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;
    use tracing_test::traced_test;

    /// Original transport that counts calls and completes with a fixed body.
    #[derive(Default)]
    struct CountingTransport {
        opens: Mutex<Vec<(String, String)>>,
        sends: Mutex<usize>,
    }

    #[async_trait]
    impl EventTransport for CountingTransport {
        fn open(
            &self,
            exchange: &mut Exchange,
            method: &str,
            url: &str,
        ) -> Result<(), TransportError> {
            self.opens.lock().push((method.to_string(), url.to_string()));
            exchange.set_ready_state(ReadyState::Opened);
            Ok(())
        }

        async fn send(
            &self,
            exchange: &mut Exchange,
            _body: Option<Bytes>,
        ) -> Result<(), TransportError> {
            *self.sends.lock() += 1;
            exchange.set_response_head(200, "OK", Default::default());
            exchange.set_ready_state(ReadyState::Done);
            exchange.dispatch(RequestEvent::Load);
            exchange.dispatch(RequestEvent::LoadEnd);
            Ok(())
        }
    }

    struct Fixture {
        engine: Arc<MockEngine>,
        original: Arc<CountingTransport>,
        interceptor: Arc<EventInterceptor>,
    }

    fn fixture(rules: Vec<MockRule>) -> Fixture {
        let engine = Arc::new(MockEngine::in_memory(EngineConfig {
            rules,
            ..Default::default()
        }));
        let original = Arc::new(CountingTransport::default());
        let interceptor = Arc::new(engine.wrap_events(original.clone()));
        Fixture {
            engine,
            original,
            interceptor,
        }
    }

    fn record_events(request: &mut EventRequest) -> Arc<Mutex<Vec<(RequestEvent, u16, String)>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        request.on_event(move |event, exchange| {
            sink.lock().push((
                event,
                exchange.status(),
                exchange.response_text().to_string(),
            ));
        });
        events
    }

    #[tokio::test]
    async fn test_listener_before_open_sees_opened_twice() {
        let fx = fixture(vec![MockRule::new("/api/user").with_text("hi")]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        request.on_event(move |event, _| sink.lock().push(event));

        request.open("GET", "/api/user").unwrap();
        request.send(None).await.unwrap();

        assert_eq!(fx.original.opens.lock().len(), 1);
        assert_eq!(
            *events.lock(),
            vec![
                RequestEvent::ReadyStateChange(ReadyState::Opened),
                RequestEvent::ReadyStateChange(ReadyState::Opened),
                RequestEvent::ReadyStateChange(ReadyState::HeadersReceived),
                RequestEvent::ReadyStateChange(ReadyState::Loading),
                RequestEvent::ReadyStateChange(ReadyState::Done),
                RequestEvent::Load,
                RequestEvent::LoadEnd,
            ]
        );
    }

    #[tokio::test]
    async fn test_matched_request_replays_lifecycle() {
        let fx = fixture(vec![MockRule::new("/api/user")
            .with_id("user")
            .with_method(RuleMethod::Get)
            .with_json(r#"{"id":1}"#)]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("GET", "/api/user/info").unwrap();
        let events = record_events(&mut request);
        request.send(None).await.unwrap();

        let body = r#"{"id":1}"#.to_string();
        assert_eq!(
            *events.lock(),
            vec![
                (RequestEvent::ReadyStateChange(ReadyState::Opened), 0, String::new()),
                (RequestEvent::ReadyStateChange(ReadyState::HeadersReceived), 200, String::new()),
                (RequestEvent::ReadyStateChange(ReadyState::Loading), 200, body.clone()),
                (RequestEvent::ReadyStateChange(ReadyState::Done), 200, body.clone()),
                (RequestEvent::Load, 200, body.clone()),
                (RequestEvent::LoadEnd, 200, body),
            ]
        );

        assert_eq!(request.ready_state(), ReadyState::Done);
        assert_eq!(request.status_text(), "OK");
        assert_eq!(request.response(), json!({"id": 1}));
        assert_eq!(request.response_header("content-type"), Some("application/json"));
        assert!(request.is_intercepted());

        assert_eq!(fx.original.opens.lock().len(), 1);
        assert_eq!(*fx.original.sends.lock(), 0);
        assert_eq!(fx.engine.request_log()[0].rule_id.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_unmatched_request_is_delegated() {
        let fx = fixture(vec![MockRule::new("/api/user").with_method(RuleMethod::Get)]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("POST", "/api/user/info").unwrap();
        request.send(Some(Bytes::from_static(b"{}"))).await.unwrap();

        assert_eq!(*fx.original.sends.lock(), 1);
        assert!(!request.is_intercepted());
        assert_eq!(
            fx.original.opens.lock()[0],
            ("POST".to_string(), "/api/user/info".to_string())
        );

        let log = fx.engine.request_log();
        assert_eq!(log.len(), 1);
        assert!(!log[0].matched);
        assert_eq!(log[0].method, "POST");
    }

    #[traced_test]
    #[tokio::test]
    async fn test_malformed_json_completes_with_error_accessor() {
        let fx = fixture(vec![MockRule::new("/x").with_json("{bad json")]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("GET", "/x").unwrap();
        let events = record_events(&mut request);
        request.send(None).await.unwrap();

        assert_eq!(events.lock().last().map(|e| e.0), Some(RequestEvent::LoadEnd));
        assert_eq!(request.response_text(), "{bad json");
        assert_eq!(request.response(), json!("{bad json"));
        let err = request.response_json().unwrap_err();
        assert_eq!(err.raw, "{bad json");
        assert!(logs_contain("invalid JSON response data"));
    }

    #[tokio::test]
    async fn test_text_rule_hides_other_headers() {
        let fx = fixture(vec![MockRule::new("/x").with_text("hello").with_status(503)]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("DELETE", "/x").unwrap();
        request.send(None).await.unwrap();

        assert_eq!(request.status(), 503);
        assert_eq!(request.response_text(), "hello");
        assert_eq!(request.response_header("Content-Type"), Some("text/plain"));
        assert_eq!(request.response_header("Cache-Control"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_happens_before_any_transition() {
        let fx = fixture(vec![MockRule::new("/slow").with_delay(500)]);

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("GET", "/slow").unwrap();
        let start = Instant::now();
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let sink = stamps.clone();
        request.on_event(move |_, _| sink.lock().push(Instant::now()));
        request.send(None).await.unwrap();

        let stamps = stamps.lock();
        assert_eq!(stamps.len(), 6);
        assert!(stamps
            .iter()
            .all(|t| t.duration_since(start) >= Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn test_disabled_engine_delegates() {
        let fx = fixture(vec![MockRule::new("")]);
        fx.engine.set_enabled(false).unwrap();

        let mut request = EventRequest::new(fx.interceptor.clone());
        request.open("GET", "/anything").unwrap();
        request.send(None).await.unwrap();

        assert_eq!(*fx.original.sends.lock(), 1);
        assert!(fx.engine.request_log()[0].rule_id.is_none());
    }
}
