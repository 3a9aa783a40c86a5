use super::{FetchRequest, FetchResponse, FetchTransport};
use crate::engine::MockEngine;
use crate::error::TransportError;
use crate::response::{apply_delay, synthesize_lenient};
use async_trait::async_trait;
use std::sync::Arc;

/// Promise-style transport that answers matching calls from mock rules and
/// hands the rest to the original transport.
pub struct FetchInterceptor {
    engine: Arc<MockEngine>,
    original: Arc<dyn FetchTransport>,
}

impl FetchInterceptor {
    pub fn new(engine: Arc<MockEngine>, original: Arc<dyn FetchTransport>) -> Self {
        Self { engine, original }
    }

    /// The wrapped transport.
    pub fn original(&self) -> &Arc<dyn FetchTransport> {
        &self.original
    }
}

#[async_trait]
impl FetchTransport for FetchInterceptor {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let Some(rule) = self.engine.resolve(&request.url, request.method()) else {
            return self.original.fetch(request).await;
        };

        apply_delay(rule.delay_ms).await;

        let response = synthesize_lenient(&rule);
        self.engine.announce(&rule, &request.url);
        Ok(FetchResponse::from_synthesized(response, request.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, MockRule, RuleMethod};
    use hyper::HeaderMap;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Original transport that records what reached it.
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<FetchRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl FetchTransport for RecordingTransport {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
            self.calls.lock().push(request.clone());
            if self.fail {
                return Err(TransportError::new("connection refused"));
            }
            Ok(FetchResponse::new(299, HeaderMap::new(), "from network").with_url(request.url))
        }
    }

    fn setup(rules: Vec<MockRule>) -> (Arc<MockEngine>, Arc<RecordingTransport>, FetchInterceptor) {
        let engine = Arc::new(MockEngine::in_memory(EngineConfig {
            rules,
            ..Default::default()
        }));
        let original = Arc::new(RecordingTransport::default());
        let fetch = engine.wrap_fetch(original.clone());
        (engine, original, fetch)
    }

    #[tokio::test]
    async fn test_matched_call_is_synthesized() {
        let (engine, original, fetch) = setup(vec![MockRule::new("/api/user")
            .with_id("user")
            .with_method(RuleMethod::Get)
            .with_json(r#"{"id":1}"#)]);

        let response = fetch.fetch(FetchRequest::new("/api/user/info")).await.unwrap();

        assert!(response.is_mocked());
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.json::<Value>().unwrap(), json!({"id": 1}));
        assert_eq!(response.url(), "/api/user/info");
        assert!(original.calls.lock().is_empty());

        let log = engine.request_log();
        assert_eq!(log[0].rule_id.as_deref(), Some("user"));
        assert_eq!(log[0].method, "GET");
    }

    #[tokio::test]
    async fn test_unmatched_call_passes_through_untouched() {
        let (engine, original, fetch) = setup(vec![MockRule::new("/api/user")
            .with_id("user")
            .with_method(RuleMethod::Get)]);

        let request = FetchRequest::new("/api/user/info")
            .with_method("POST")
            .with_header("X-Trace", "abc")
            .with_body("payload");
        let response = fetch.fetch(request).await.unwrap();

        assert!(!response.is_mocked());
        assert_eq!(response.status(), 299);
        assert_eq!(response.text(), "from network");

        let calls = original.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method.as_deref(), Some("POST"));
        assert_eq!(calls[0].headers.get("x-trace").unwrap(), "abc");
        assert_eq!(calls[0].body.as_deref(), Some(&b"payload"[..]));

        let log = engine.request_log();
        assert!(!log[0].matched);
        assert!(log[0].rule_id.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let engine = Arc::new(MockEngine::in_memory(EngineConfig::default()));
        let original = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let fetch = engine.wrap_fetch(original);

        let err = fetch.fetch(FetchRequest::new("/down")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(!engine.request_log()[0].matched);
    }

    #[tokio::test]
    async fn test_error_status_still_resolves() {
        let (_, _, fetch) = setup(vec![MockRule::new("/x").with_text("hello").with_status(503)]);
        let response = fetch.fetch(FetchRequest::new("/x")).await.unwrap();
        assert!(!response.ok());
        assert_eq!(response.status(), 503);
        assert_eq!(response.status_text(), "Service Unavailable");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.text(), "hello");
    }

    #[tokio::test]
    async fn test_malformed_json_still_completes() {
        let (_, _, fetch) = setup(vec![MockRule::new("/x").with_json("{bad json")]);
        let response = fetch.fetch(FetchRequest::new("/x")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "{bad json");
        assert!(response.json::<Value>().is_err());
    }

    #[tokio::test]
    async fn test_disabled_engine_passes_everything_through() {
        let (engine, original, fetch) = setup(vec![MockRule::new("")]);
        engine.set_enabled(false).unwrap();
        let response = fetch.fetch(FetchRequest::new("/anything")).await.unwrap();
        assert!(!response.is_mocked());
        assert_eq!(original.calls.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_honored() {
        let (_, _, fetch) = setup(vec![MockRule::new("/slow").with_delay(500)]);
        let start = Instant::now();
        fetch.fetch(FetchRequest::new("/slow")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_are_independent() {
        let (engine, _, fetch) = setup(vec![
            MockRule::new("/slow").with_id("slow").with_delay(300),
            MockRule::new("/fast").with_id("fast").with_delay(10),
        ]);

        let (slow, fast) = tokio::join!(
            fetch.fetch(FetchRequest::new("/slow")),
            fetch.fetch(FetchRequest::new("/fast"))
        );
        assert!(slow.unwrap().is_mocked());
        assert!(fast.unwrap().is_mocked());
        assert_eq!(engine.request_log().len(), 2);
    }
}
