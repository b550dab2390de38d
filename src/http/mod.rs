// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for Haukka
//!
//! Two phases per call:
//! - [`RequestBuilder`] resolves options, validates proxy input and loads
//!   the session's cookie jar
//! - [`HttpExecutor`] opens a transport handle, performs the exchange and
//!   parses the raw response into an [`ExecutionResult`]

mod builder;
mod client;
mod cookie;
mod options;
mod proxy;
mod request;
mod response;
mod storage;
mod transport;
mod tunnel;
mod user_agent;

pub use builder::{PreparedRequest, RequestBuilder};
pub use client::HttpExecutor;
pub use cookie::{Cookie, CookieJar};
pub use options::{TransportOptions, TransportOverrides};
pub use proxy::{ProxyConfig, ProxySettings};
pub use request::{HeaderLine, PostBody, RequestConfig, RequestOptions};
pub use response::{parse_headers, ExecutionResult, HeaderFields, HttpExchange};
pub use storage::{
    validate_session_id, CookieStorage, FileCookieStorage, MemoryCookieStorage,
    DEFAULT_COOKIE_DIR,
};
pub use transport::{RawExchange, ReqwestTransport, Transport, TransportHandle};
pub use user_agent::{FixedUserAgent, RandomUserAgent, UserAgentSource};

/// Fallback user agent string
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Common HTTP headers
pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const COOKIE: &str = "Cookie";
    pub const HOST: &str = "Host";
    pub const REFERER: &str = "Referer";
    pub const USER_AGENT: &str = "User-Agent";

    /// Accept header sent when the caller sets none
    pub const DEFAULT_ACCEPT: &str = "*/*";

    /// Encodings asked for when decompression is on
    pub const DEFAULT_ACCEPT_ENCODING: &str = "gzip, br";
}
