// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request types

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::options::TransportOverrides;
use super::proxy::ProxyConfig;

/// POST payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostBody {
    /// Field/value pairs, form-url-encoded in the given order
    Form(Vec<(String, String)>),
    /// Pre-encoded payload sent unmodified
    Raw(String),
}

impl PostBody {
    /// Create a form body from field/value pairs
    pub fn form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PostBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Create a raw body
    pub fn raw(body: impl Into<String>) -> Self {
        PostBody::Raw(body.into())
    }

    /// Encode into the bytes sent on the wire
    pub fn encode(&self) -> String {
        match self {
            PostBody::Form(fields) => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish(),
            PostBody::Raw(raw) => raw.clone(),
        }
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        match self {
            PostBody::Form(fields) => fields.is_empty(),
            PostBody::Raw(raw) => raw.is_empty(),
        }
    }
}

impl From<String> for PostBody {
    fn from(body: String) -> Self {
        PostBody::Raw(body)
    }
}

impl From<&str> for PostBody {
    fn from(body: &str) -> Self {
        PostBody::Raw(body.to_string())
    }
}

impl From<Vec<(String, String)>> for PostBody {
    fn from(fields: Vec<(String, String)>) -> Self {
        PostBody::Form(fields)
    }
}

/// Optional arguments shared by GET and POST
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Outgoing header lines, `Name: Value`
    pub headers: Vec<String>,
    /// Proxy to route the request through
    pub proxy: Option<ProxyConfig>,
    /// Cookie session id; selects the cookie jar
    pub cookie_session: Option<String>,
    /// Transport overrides applied last
    pub overrides: Option<TransportOverrides>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header line (`Name: Value`)
    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    /// Replace all header lines
    pub fn headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set cookie session id
    pub fn cookie_session(mut self, session: impl Into<String>) -> Self {
        self.cookie_session = Some(session.into());
        self
    }

    /// Set transport overrides
    pub fn overrides(mut self, overrides: TransportOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

/// Everything needed to perform one request
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Target URL
    pub url: String,
    /// Request method
    pub method: Method,
    /// POST payload
    pub body: Option<PostBody>,
    /// Optional arguments
    pub options: RequestOptions,
}

impl RequestConfig {
    /// Create a GET request config
    pub fn get(url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            body: None,
            options,
        }
    }

    /// Create a POST request config
    pub fn post(url: impl Into<String>, body: Option<PostBody>, options: RequestOptions) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            body,
            options,
        }
    }
}

/// A parsed outgoing header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// Set `name` to `value`
    Set(String, String),
    /// Remove a default header (`Name:` with nothing after the colon)
    Remove(String),
}

impl HeaderLine {
    /// Parse a `Name: Value` line. Returns None for lines without a colon.
    pub fn parse(line: &str) -> Option<Self> {
        let (name, value) = line.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        if value.is_empty() {
            Some(HeaderLine::Remove(name.to_string()))
        } else {
            Some(HeaderLine::Set(name.to_string(), value.to_string()))
        }
    }
}
