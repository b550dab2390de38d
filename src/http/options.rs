// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Resolved transport options and caller overrides

use std::time::Duration;

use reqwest::Method;

use super::proxy::{ProxyConfig, ProxySettings};
use crate::config::ExecutorConfig;
use crate::error::ValidationError;

/// Fully resolved options for one request
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Request method
    pub method: Method,
    /// User-Agent sent unless a header line overrides it
    pub user_agent: String,
    /// Follow `Location` redirects
    pub follow_redirects: bool,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Send `Referer` on redirects
    pub auto_referer: bool,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Total timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Request and decode compressed bodies
    pub decompress: bool,
    /// Caller header lines, `Name: Value`
    pub headers: Vec<String>,
    /// Proxy to use
    pub proxy: Option<ProxySettings>,
    /// Cookie session id
    pub cookie_session: Option<String>,
}

impl TransportOptions {
    /// Baseline options from the executor config
    pub fn baseline(config: &ExecutorConfig, method: Method, user_agent: String) -> Self {
        Self {
            method,
            user_agent,
            follow_redirects: config.follow_redirects,
            max_redirects: config.max_redirects,
            auto_referer: config.auto_referer,
            accept_invalid_certs: config.accept_invalid_certs,
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            decompress: config.decompress,
            headers: Vec::new(),
            proxy: None,
            cookie_session: None,
        }
    }
}

/// Partial options merged after everything else, so any field set here wins.
///
/// `None` leaves the resolved value alone. For `proxy` and `cookie_session`,
/// `Some(None)` clears whatever was resolved before.
#[derive(Debug, Clone, Default)]
pub struct TransportOverrides {
    /// Request method
    pub method: Option<Method>,
    /// User-Agent
    pub user_agent: Option<String>,
    /// Follow `Location` redirects
    pub follow_redirects: Option<bool>,
    /// Maximum redirects to follow
    pub max_redirects: Option<usize>,
    /// Send `Referer` on redirects
    pub auto_referer: Option<bool>,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: Option<bool>,
    /// Total timeout
    pub timeout: Option<Duration>,
    /// Connect timeout
    pub connect_timeout: Option<Duration>,
    /// Request and decode compressed bodies
    pub decompress: Option<bool>,
    /// Replaces the caller header lines entirely
    pub headers: Option<Vec<String>>,
    /// Replace or clear the proxy
    pub proxy: Option<Option<ProxyConfig>>,
    /// Replace or clear the cookie session
    pub cookie_session: Option<Option<String>>,
}

impl TransportOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the request method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Override the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Override redirect following
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Override max redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Override referer on redirect
    pub fn auto_referer(mut self, enabled: bool) -> Self {
        self.auto_referer = Some(enabled);
        self
    }

    /// Override certificate checks
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = Some(accept);
        self
    }

    /// Override total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override decompression
    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = Some(decompress);
        self
    }

    /// Replace header lines
    pub fn headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    /// Override the proxy
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(Some(proxy));
        self
    }

    /// Send the request directly, dropping any configured proxy
    pub fn no_proxy(mut self) -> Self {
        self.proxy = Some(None);
        self
    }

    /// Override the cookie session
    pub fn cookie_session(mut self, session: impl Into<String>) -> Self {
        self.cookie_session = Some(Some(session.into()));
        self
    }

    /// Neither read nor write a cookie jar
    pub fn no_cookie_session(mut self) -> Self {
        self.cookie_session = Some(None);
        self
    }

    /// Merge into resolved options. A proxy given here is validated like any other.
    pub fn apply(&self, options: &mut TransportOptions) -> Result<(), ValidationError> {
        if let Some(ref method) = self.method {
            options.method = method.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            options.user_agent = user_agent.clone();
        }
        if let Some(follow) = self.follow_redirects {
            options.follow_redirects = follow;
        }
        if let Some(max) = self.max_redirects {
            options.max_redirects = max;
        }
        if let Some(referer) = self.auto_referer {
            options.auto_referer = referer;
        }
        if let Some(accept) = self.accept_invalid_certs {
            options.accept_invalid_certs = accept;
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = timeout;
        }
        if let Some(decompress) = self.decompress {
            options.decompress = decompress;
        }
        if let Some(ref headers) = self.headers {
            options.headers = headers.clone();
        }
        if let Some(ref proxy) = self.proxy {
            options.proxy = proxy.as_ref().map(ProxyConfig::resolve).transpose()?;
        }
        if let Some(ref session) = self.cookie_session {
            options.cookie_session = session.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> TransportOptions {
        TransportOptions::baseline(&ExecutorConfig::default(), Method::GET, "ua/1".to_string())
    }

    #[test]
    fn test_baseline_from_config() {
        let options = baseline();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert!(options.accept_invalid_certs);
        assert!(options.proxy.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let mut options = baseline();
        options.headers = vec!["X-A: 1".to_string()];

        TransportOverrides::new()
            .timeout(Duration::from_secs(1))
            .headers(["X-B: 2"])
            .accept_invalid_certs(false)
            .cookie_session("other")
            .apply(&mut options)
            .unwrap();

        assert_eq!(options.timeout, Duration::from_secs(1));
        assert_eq!(options.headers, vec!["X-B: 2".to_string()]);
        assert!(!options.accept_invalid_certs);
        assert_eq!(options.cookie_session.as_deref(), Some("other"));
        assert_eq!(options.user_agent, "ua/1");
    }

    #[test]
    fn test_overrides_clear_proxy_and_session() {
        let mut options = baseline();
        options.proxy = Some(ProxyConfig::ip("10.0.0.1:3128").resolve().unwrap());
        options.cookie_session = Some("s1".to_string());

        TransportOverrides::new()
            .no_proxy()
            .no_cookie_session()
            .apply(&mut options)
            .unwrap();

        assert!(options.proxy.is_none());
        assert!(options.cookie_session.is_none());
    }

    #[test]
    fn test_override_proxy_is_validated() {
        let mut options = baseline();
        let err = TransportOverrides::new()
            .proxy(ProxyConfig::ip(""))
            .apply(&mut options)
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("server"));
    }
}
