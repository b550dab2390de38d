// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Proxy configuration
//!
//! Two proxy modes are supported:
//! - `ip`: every request goes through a CONNECT tunnel, no credentials
//! - `auth`: proxy with a `user:pass` credential; plain-http requests are
//!   forwarded to it, https ones tunnelled
//!
//! Configs coming from loosely typed input (JSON, CLI glue) go through
//! [`ProxyConfig::from_parts`] or serde, which report a missing or unknown
//! `method` the same way the rest of the validation errors are reported.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Proxy configuration for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", try_from = "RawProxyConfig")]
pub enum ProxyConfig {
    /// HTTP proxy tunnel without authentication
    #[serde(rename = "ip")]
    IpTunnel {
        /// Proxy address, `host:port` or a full URL
        server: String,
    },
    /// Proxy with `user:pass` credentials
    #[serde(rename = "auth")]
    AuthTunnel {
        /// Proxy address, `host:port` or a full URL
        server: String,
        /// Credential in `user:pass` form
        #[serde(rename = "userPass")]
        user_pass: String,
    },
}

/// Untyped shape accepted from serialized input
#[derive(Debug, Deserialize)]
struct RawProxyConfig {
    method: Option<String>,
    server: Option<String>,
    #[serde(rename = "userPass")]
    user_pass: Option<String>,
}

impl TryFrom<RawProxyConfig> for ProxyConfig {
    type Error = ValidationError;

    fn try_from(raw: RawProxyConfig) -> Result<Self, Self::Error> {
        ProxyConfig::from_parts(
            raw.method.as_deref(),
            raw.server.as_deref(),
            raw.user_pass.as_deref(),
        )
    }
}

impl ProxyConfig {
    /// Create an IP tunnel proxy config
    pub fn ip(server: impl Into<String>) -> Self {
        ProxyConfig::IpTunnel {
            server: server.into(),
        }
    }

    /// Create an authenticated proxy config
    pub fn auth(server: impl Into<String>, user_pass: impl Into<String>) -> Self {
        ProxyConfig::AuthTunnel {
            server: server.into(),
            user_pass: user_pass.into(),
        }
    }

    /// Build a config from a method discriminator plus loose fields.
    ///
    /// Only the discriminator is checked here. Empty `server`/`userPass`
    /// values are reported later by [`ProxyConfig::resolve`].
    pub fn from_parts(
        method: Option<&str>,
        server: Option<&str>,
        user_pass: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let server = server.unwrap_or_default().to_string();
        match method.map(str::trim) {
            None | Some("") => Err(ValidationError::MissingMethod),
            Some("ip") => Ok(ProxyConfig::IpTunnel { server }),
            Some("auth") => Ok(ProxyConfig::AuthTunnel {
                server,
                user_pass: user_pass.unwrap_or_default().to_string(),
            }),
            Some(other) => Err(ValidationError::InvalidMethod(other.to_string())),
        }
    }

    /// Method discriminator as used in serialized form
    pub fn method(&self) -> &'static str {
        match self {
            ProxyConfig::IpTunnel { .. } => "ip",
            ProxyConfig::AuthTunnel { .. } => "auth",
        }
    }

    /// Proxy server address
    pub fn server(&self) -> &str {
        match self {
            ProxyConfig::IpTunnel { server } | ProxyConfig::AuthTunnel { server, .. } => server,
        }
    }

    /// Validate required fields and resolve into transport settings.
    ///
    /// `server` is checked before `userPass`.
    pub fn resolve(&self) -> Result<ProxySettings, ValidationError> {
        match self {
            ProxyConfig::IpTunnel { server } => {
                let server = server.trim();
                if server.is_empty() {
                    return Err(ValidationError::MissingField("server"));
                }
                Ok(ProxySettings {
                    url: normalize_proxy_url(server),
                    credentials: None,
                    tunnel: true,
                })
            }
            ProxyConfig::AuthTunnel { server, user_pass } => {
                let server = server.trim();
                if server.is_empty() {
                    return Err(ValidationError::MissingField("server"));
                }
                if user_pass.is_empty() {
                    return Err(ValidationError::MissingField("userPass"));
                }
                let (user, pass) = user_pass
                    .split_once(':')
                    .unwrap_or((user_pass.as_str(), ""));
                Ok(ProxySettings {
                    url: normalize_proxy_url(server),
                    credentials: Some((user.to_string(), pass.to_string())),
                    tunnel: false,
                })
            }
        }
    }
}

/// Resolved proxy settings handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy URL with scheme
    pub url: String,
    /// Basic credentials (user, password)
    pub credentials: Option<(String, String)>,
    /// Request CONNECT tunnelling through the proxy
    pub tunnel: bool,
}

/// Bare `host:port` proxies are HTTP proxies
fn normalize_proxy_url(server: &str) -> String {
    if server.contains("://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}
