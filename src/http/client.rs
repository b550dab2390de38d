// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request executor

use std::sync::Arc;

use tracing::{debug, warn};

use super::builder::{PreparedRequest, RequestBuilder};
use super::request::{PostBody, RequestConfig, RequestOptions};
use super::response::{ExecutionResult, HttpExchange};
use super::storage::{CookieStorage, FileCookieStorage};
use super::transport::{ReqwestTransport, Transport};
use super::user_agent::{RandomUserAgent, UserAgentSource};
use crate::config::ExecutorConfig;
use crate::error::ValidationError;

/// Performs one GET or POST per call.
///
/// Each call builds its own transport handle and releases it before
/// returning. The only state shared between calls is the cookie jar of a
/// session id, kept in the configured [`CookieStorage`].
#[derive(Clone)]
pub struct HttpExecutor {
    config: ExecutorConfig,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn CookieStorage>,
    user_agents: Arc<dyn UserAgentSource>,
}

impl HttpExecutor {
    /// Create an executor with default configuration
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with custom configuration
    pub fn with_config(config: ExecutorConfig) -> Self {
        let storage = FileCookieStorage::new(config.cookie_dir.clone());
        Self {
            config,
            transport: Arc::new(ReqwestTransport::new()),
            storage: Arc::new(storage),
            user_agents: Arc::new(RandomUserAgent),
        }
    }

    /// Replace the transport
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replace the cookie storage
    pub fn cookie_storage(mut self, storage: impl CookieStorage + 'static) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    /// Replace the cookie storage with a shared one
    pub fn shared_cookie_storage(mut self, storage: Arc<dyn CookieStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Replace the User-Agent source
    pub fn user_agents(mut self, source: impl UserAgentSource + 'static) -> Self {
        self.user_agents = Arc::new(source);
        self
    }

    /// Get executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl Into<String>, options: RequestOptions) -> ExecutionResult {
        self.execute(RequestConfig::get(url, options)).await
    }

    /// Execute a POST request
    pub async fn post(
        &self,
        url: impl Into<String>,
        body: Option<PostBody>,
        options: RequestOptions,
    ) -> ExecutionResult {
        self.execute(RequestConfig::post(url, body, options)).await
    }

    /// Build and perform a request
    pub async fn execute(&self, request: RequestConfig) -> ExecutionResult {
        match self.prepare(request).await {
            Ok(prepared) => self.perform(prepared).await,
            Err(err) => {
                debug!(error = %err, "Request rejected");
                ExecutionResult::Rejected(err)
            }
        }
    }

    /// Builder phase only: resolve options and load the cookie jar
    pub async fn prepare(&self, request: RequestConfig) -> Result<PreparedRequest, ValidationError> {
        RequestBuilder::new(&self.config, self.storage.as_ref(), self.user_agents.as_ref())
            .build(request)
            .await
    }

    /// Executor phase: perform a prepared request and parse the result
    pub async fn perform(&self, prepared: PreparedRequest) -> ExecutionResult {
        debug!(method = %prepared.options.method, url = %prepared.url, "Executing request");

        let outcome = match self.transport.open(&prepared) {
            Ok(mut handle) => {
                let outcome = handle.perform().await;
                drop(handle);
                outcome
            }
            Err(err) => Err(err),
        };

        self.persist_cookies(&prepared).await;

        match outcome {
            Ok(raw) => {
                let exchange = HttpExchange::from_raw(&raw);
                debug!(
                    url = %prepared.url,
                    status = exchange.status_code,
                    elapsed = exchange.elapsed_seconds,
                    "Request completed"
                );
                ExecutionResult::Success(exchange)
            }
            Err(err) => {
                debug!(url = %prepared.url, code = err.code, error = %err.message, "Request failed");
                ExecutionResult::Failure(err)
            }
        }
    }

    /// Write the session jar back, on success and failure alike
    async fn persist_cookies(&self, prepared: &PreparedRequest) {
        let (Some(session), Some(jar)) = (
            prepared.options.cookie_session.as_deref(),
            prepared.cookie_jar.as_ref(),
        ) else {
            return;
        };

        if let Err(e) = self.storage.save(session, jar).await {
            warn!(session = %session, error = %e, "Failed to save cookie jar");
        }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::error::TransportError;
    use crate::http::proxy::ProxyConfig;
    use crate::http::storage::MemoryCookieStorage;
    use crate::http::transport::{RawExchange, TransportHandle};
    use crate::http::user_agent::FixedUserAgent;

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        performed: AtomicUsize,
        released: AtomicUsize,
        last_body: Mutex<Option<String>>,
    }

    struct MockTransport {
        counters: Arc<Counters>,
        reply: std::result::Result<RawExchange, TransportError>,
    }

    struct MockHandle {
        counters: Arc<Counters>,
        reply: std::result::Result<RawExchange, TransportError>,
    }

    impl Transport for MockTransport {
        fn open(
            &self,
            request: &PreparedRequest,
        ) -> std::result::Result<Box<dyn TransportHandle>, TransportError> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            *self.counters.last_body.lock() = request.body.clone();
            Ok(Box::new(MockHandle {
                counters: self.counters.clone(),
                reply: self.reply.clone(),
            }))
        }
    }

    #[async_trait]
    impl TransportHandle for MockHandle {
        async fn perform(&mut self) -> std::result::Result<RawExchange, TransportError> {
            self.counters.performed.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn executor(reply: std::result::Result<RawExchange, TransportError>) -> (HttpExecutor, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let executor = HttpExecutor::new()
            .transport(MockTransport {
                counters: counters.clone(),
                reply,
            })
            .cookie_storage(MemoryCookieStorage::new())
            .user_agents(FixedUserAgent("ua/1".to_string()));
        (executor, counters)
    }

    fn ok_reply() -> std::result::Result<RawExchange, TransportError> {
        Ok(RawExchange::new(
            200,
            Duration::from_millis(20),
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n",
            b"hello",
            "GET / HTTP/1.1\r\nHost: example.com\r\nUser-Agent: ua/1\r\n\r\n",
        ))
    }

    #[tokio::test]
    async fn test_get_parses_response() {
        let (executor, counters) = executor(ok_reply());
        let result = executor.get("http://example.com/", RequestOptions::new()).await;

        let exchange = result.exchange().unwrap();
        assert_eq!(exchange.status_code, 200);
        assert_eq!(exchange.header("content-type"), Some("text/html"));
        assert_eq!(exchange.header("set-cookie"), Some("b=2"));
        assert_eq!(exchange.request_header("user-agent"), Some("ua/1"));
        assert_eq!(exchange.body, "hello");
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_transport() {
        let (executor, counters) = executor(ok_reply());
        let options = RequestOptions::new().proxy(ProxyConfig::ip(""));
        let result = executor.get("http://example.com/", options).await;

        let err = result.validation_error().unwrap();
        assert!(err.to_string().contains("server"));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
        assert_eq!(counters.performed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_proxy_missing_server_reported_first() {
        let (executor, counters) = executor(ok_reply());
        let options = RequestOptions::new().proxy(ProxyConfig::auth("", "x"));
        let result = executor.get("http://example.com/", options).await;

        assert_eq!(
            result.validation_error().and_then(|e| e.missing_field()),
            Some("server")
        );
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_failure_releases_handle_once() {
        let (executor, counters) = executor(Err(TransportError::timeout(
            "Operation timed out after 10000 milliseconds",
        )));
        let result = executor.get("http://example.com/", RequestOptions::new()).await;

        let err = result.transport_error().unwrap();
        assert!(err.is_timeout());
        assert!(result.exchange().is_none());
        assert_eq!(counters.performed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_form_body_sent_verbatim() {
        let (executor, counters) = executor(ok_reply());
        let body = PostBody::form([("name", "a b"), ("id", "1")]);
        let result = executor
            .post("http://example.com/form", Some(body), RequestOptions::new())
            .await;

        assert!(result.is_success());
        assert_eq!(
            counters.last_body.lock().as_deref(),
            Some("name=a+b&id=1")
        );
    }

    #[tokio::test]
    async fn test_cookie_jar_saved_on_failure() {
        let storage = Arc::new(MemoryCookieStorage::new());
        let counters = Arc::new(Counters::default());
        let executor = HttpExecutor::new()
            .transport(MockTransport {
                counters: counters.clone(),
                reply: Err(TransportError::new(7, "Connection refused")),
            })
            .shared_cookie_storage(storage.clone())
            .user_agents(FixedUserAgent("ua/1".to_string()));

        let result = executor
            .get("http://example.com/", RequestOptions::new().cookie_session("s1"))
            .await;

        assert!(!result.is_success());
        assert!(storage.raw("s1").is_some());
    }
}
