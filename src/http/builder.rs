// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request builder
//!
//! Turns a [`RequestConfig`] into a [`PreparedRequest`] or rejects it with a
//! [`ValidationError`] before any network I/O. Resolution order:
//!
//! 1. baseline options from [`ExecutorConfig`] plus a fresh User-Agent
//! 2. caller header lines
//! 3. proxy
//! 4. cookie session
//! 5. transport overrides, last so they win over everything above
//!
//! Once options are resolved the cookie directory is created and the
//! session's jar is loaded.

use tracing::{trace, warn};

use super::cookie::CookieJar;
use super::headers;
use super::options::TransportOptions;
use super::request::{HeaderLine, RequestConfig, RequestOptions};
use super::storage::{validate_session_id, CookieStorage};
use super::user_agent::UserAgentSource;
use crate::config::ExecutorConfig;
use crate::error::ValidationError;

/// Content type curl uses for POST fields
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request ready to hand to a transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Target URL as given by the caller
    pub url: String,
    /// Resolved options
    pub options: TransportOptions,
    /// Final outgoing headers, in send order
    pub headers: Vec<(String, String)>,
    /// Encoded payload
    pub body: Option<String>,
    /// Cookie jar for the session, shared with the transport during the call
    pub cookie_jar: Option<CookieJar>,
}

impl PreparedRequest {
    /// Look up an outgoing header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Builder phase of a request
pub struct RequestBuilder<'a> {
    config: &'a ExecutorConfig,
    storage: &'a dyn CookieStorage,
    user_agents: &'a dyn UserAgentSource,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder
    pub fn new(
        config: &'a ExecutorConfig,
        storage: &'a dyn CookieStorage,
        user_agents: &'a dyn UserAgentSource,
    ) -> Self {
        Self {
            config,
            storage,
            user_agents,
        }
    }

    /// Resolve options and prepare the cookie jar
    pub async fn build(&self, request: RequestConfig) -> Result<PreparedRequest, ValidationError> {
        if request.url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let RequestConfig {
            url,
            method,
            body,
            options: request_options,
        } = request;
        let RequestOptions {
            headers,
            proxy,
            cookie_session,
            overrides,
        } = request_options;

        let mut options =
            TransportOptions::baseline(self.config, method, self.user_agents.user_agent());

        if !headers.is_empty() {
            options.headers = headers;
        }

        if let Some(proxy) = proxy {
            options.proxy = Some(proxy.resolve()?);
        }

        if let Some(session) = cookie_session.filter(|s| !s.is_empty()) {
            options.cookie_session = Some(session);
        }

        if let Some(overrides) = overrides {
            overrides.apply(&mut options)?;
        }

        let cookie_jar = match options.cookie_session.as_deref().filter(|s| !s.is_empty()) {
            Some(session) => Some(self.open_jar(session).await?),
            None => None,
        };

        let body = body.filter(|b| !b.is_empty()).map(|b| b.encode());
        let headers = outgoing_headers(&options, body.is_some());

        trace!(
            url = %url,
            method = %options.method,
            proxy = ?options.proxy.as_ref().map(|p| p.url.as_str()),
            cookie_session = ?options.cookie_session,
            "Resolved transport options"
        );

        Ok(PreparedRequest {
            url,
            options,
            headers,
            body,
            cookie_jar,
        })
    }

    async fn open_jar(&self, session: &str) -> Result<CookieJar, ValidationError> {
        validate_session_id(session)?;
        self.storage
            .prepare(session)
            .await
            .map_err(|e| ValidationError::CookieStore(e.to_string()))?;
        self.storage
            .load(session)
            .await
            .map_err(|e| ValidationError::CookieStore(e.to_string()))
    }
}

/// Baseline headers first, then caller lines.
///
/// A caller line replaces a baseline header of the same name; `Name:` with
/// no value removes it.
fn outgoing_headers(options: &TransportOptions, has_body: bool) -> Vec<(String, String)> {
    let mut baseline = vec![
        (headers::USER_AGENT.to_string(), options.user_agent.clone()),
        (headers::ACCEPT.to_string(), headers::DEFAULT_ACCEPT.to_string()),
    ];
    if has_body {
        baseline.push((
            headers::CONTENT_TYPE.to_string(),
            FORM_CONTENT_TYPE.to_string(),
        ));
    }

    let mut custom: Vec<(String, String)> = Vec::new();
    for line in &options.headers {
        match HeaderLine::parse(line) {
            Some(HeaderLine::Set(name, value)) => {
                baseline.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
                custom.push((name, value));
            }
            Some(HeaderLine::Remove(name)) => {
                baseline.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
                custom.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
            }
            None => warn!(line = %line, "Skipping malformed header line"),
        }
    }

    baseline.extend(custom);
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::options::TransportOverrides;
    use crate::http::proxy::ProxyConfig;
    use crate::http::request::PostBody;
    use crate::http::storage::{FileCookieStorage, MemoryCookieStorage};
    use crate::http::user_agent::FixedUserAgent;
    use std::time::Duration;

    async fn build(request: RequestConfig) -> Result<PreparedRequest, ValidationError> {
        let config = ExecutorConfig::default();
        let storage = MemoryCookieStorage::new();
        let ua = FixedUserAgent("ua/1".to_string());
        RequestBuilder::new(&config, &storage, &ua).build(request).await
    }

    #[tokio::test]
    async fn test_baseline_headers() {
        let prepared = build(RequestConfig::get("http://example.com", RequestOptions::new()))
            .await
            .unwrap();
        assert_eq!(prepared.header("user-agent"), Some("ua/1"));
        assert_eq!(prepared.header("accept"), Some("*/*"));
        assert!(prepared.body.is_none());
        assert!(prepared.cookie_jar.is_none());
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let err = build(RequestConfig::get("  ", RequestOptions::new()))
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyUrl);
    }

    #[tokio::test]
    async fn test_caller_headers_replace_and_remove() {
        let options = RequestOptions::new()
            .header("User-Agent: custom/2")
            .header("Accept:")
            .header("X-Trace: 1")
            .header("no colon here");
        let prepared = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap();
        assert_eq!(prepared.header("user-agent"), Some("custom/2"));
        assert_eq!(prepared.header("accept"), None);
        assert_eq!(prepared.header("x-trace"), Some("1"));
        assert_eq!(prepared.headers.len(), 2);
    }

    #[tokio::test]
    async fn test_ip_proxy_missing_server() {
        let options = RequestOptions::new().proxy(ProxyConfig::ip(""));
        let err = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap_err();
        assert_eq!(err.missing_field(), Some("server"));
    }

    #[tokio::test]
    async fn test_auth_proxy_checks_server_before_user_pass() {
        let options = RequestOptions::new().proxy(ProxyConfig::auth("", "x"));
        let err = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap_err();
        assert_eq!(err.missing_field(), Some("server"));
    }

    #[tokio::test]
    async fn test_form_body_encoded_with_content_type() {
        let body = PostBody::form([("name", "a b"), ("id", "1")]);
        let prepared = build(RequestConfig::post(
            "http://example.com",
            Some(body),
            RequestOptions::new(),
        ))
        .await
        .unwrap();
        assert_eq!(prepared.body.as_deref(), Some("name=a+b&id=1"));
        assert_eq!(
            prepared.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn test_raw_body_keeps_caller_content_type() {
        let options = RequestOptions::new().header("Content-Type: application/json");
        let prepared = build(RequestConfig::post(
            "http://example.com",
            Some(PostBody::raw("{\"a\":1}")),
            options,
        ))
        .await
        .unwrap();
        assert_eq!(prepared.body.as_deref(), Some("{\"a\":1}"));
        assert_eq!(prepared.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_overrides_applied_last() {
        let overrides = TransportOverrides::new()
            .headers(["X-Override: yes"])
            .timeout(Duration::from_secs(2))
            .proxy(ProxyConfig::ip("10.0.0.1:8080"));
        let options = RequestOptions::new()
            .header("X-Original: yes")
            .proxy(ProxyConfig::ip("10.0.0.2:8080"))
            .overrides(overrides);
        let prepared = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap();
        assert_eq!(prepared.header("x-original"), None);
        assert_eq!(prepared.header("x-override"), Some("yes"));
        assert_eq!(prepared.options.timeout, Duration::from_secs(2));
        assert_eq!(
            prepared.options.proxy.map(|p| p.url),
            Some("http://10.0.0.1:8080".to_string())
        );
    }

    #[tokio::test]
    async fn test_overrides_clear_proxy_and_cookie_session() {
        let overrides = TransportOverrides::new().no_proxy().no_cookie_session();
        let options = RequestOptions::new()
            .proxy(ProxyConfig::ip("10.0.0.2:8080"))
            .cookie_session("s1")
            .overrides(overrides);
        let prepared = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap();
        assert!(prepared.options.proxy.is_none());
        assert!(prepared.options.cookie_session.is_none());
        assert!(prepared.cookie_jar.is_none());
    }

    #[tokio::test]
    async fn test_cookie_session_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cookie_dir = dir.path().join("cookies");
        let config = ExecutorConfig::default();
        let storage = FileCookieStorage::new(&cookie_dir);
        let ua = FixedUserAgent("ua/1".to_string());

        let request =
            RequestConfig::get("http://example.com", RequestOptions::new().cookie_session("s1"));
        let prepared = RequestBuilder::new(&config, &storage, &ua)
            .build(request)
            .await
            .unwrap();

        assert!(cookie_dir.is_dir());
        assert!(prepared.cookie_jar.is_some());
        assert_eq!(prepared.options.cookie_session.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_bad_cookie_session_rejected() {
        let options = RequestOptions::new().cookie_session("../../etc/passwd");
        let err = build(RequestConfig::get("http://example.com", options))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCookieSession(_)));
    }
}
