// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Haukka - Single-shot HTTP Request Executor
//!
//! Performs one GET or POST per call and returns either the parsed exchange
//! (status, timing, request/response headers, body) or a structured error.
//! Built for talking to arbitrary targets during security testing.
//!
//! ## Features
//!
//! - Proxy tunnels: plain (`ip`) or with `user:pass` credentials (`auth`)
//! - Cookie sessions: jars persisted per session id in `cookies/ck_<id>.txt`
//! - Random realistic User-Agent per request
//! - Transport overrides applied last, so callers can change anything
//! - Errors as data: validation and transport failures never panic or throw
//!
//! TLS certificate verification is disabled by default so self-signed
//! targets work. See [`ExecutorConfig::verify_tls`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use haukka::{ExecutionResult, HttpExecutor, PostBody, ProxyConfig, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = HttpExecutor::new();
//!
//!     let options = RequestOptions::new()
//!         .header("Accept-Language: en-US")
//!         .proxy(ProxyConfig::ip("127.0.0.1:8080"))
//!         .cookie_session("login");
//!     let body = PostBody::form([("user", "admin"), ("pass", "hunter2")]);
//!
//!     match executor.post("https://example.com/login", Some(body), options).await {
//!         ExecutionResult::Success(exchange) => {
//!             println!("{} in {:.3}s", exchange.status_code, exchange.elapsed_seconds);
//!         }
//!         ExecutionResult::Failure(err) => eprintln!("transport error {}: {}", err.code, err.message),
//!         ExecutionResult::Rejected(err) => eprintln!("rejected: {}", err),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

// Re-exports for convenience

// Configuration
pub use config::ExecutorConfig;

// Errors
pub use error::{Error, Result, TransportError, ValidationError};

// HTTP
pub use http::{ExecutionResult, HeaderFields, HttpExchange, HttpExecutor};
pub use http::{PostBody, ProxyConfig, RequestConfig, RequestOptions, TransportOverrides};
pub use http::{Cookie, CookieJar, CookieStorage, FileCookieStorage, MemoryCookieStorage};
pub use http::{RawExchange, ReqwestTransport, Transport, TransportHandle};
pub use http::{FixedUserAgent, RandomUserAgent, UserAgentSource};

/// Haukka version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
