// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Haukka
//!
//! Two classes of failure reach callers, both as data:
//! - [`ValidationError`] - the request was rejected before any network I/O
//! - [`TransportError`] - the transport never produced a response
//!
//! Transport errors carry curl's numeric error codes so that callers who
//! already branch on those codes keep working.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Haukka operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for internal plumbing
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected during option resolution
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Transport failed to produce a response
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error was raised before any network I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_timeout())
    }
}

/// Input rejected while building the request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// URL was empty
    #[error("URL is empty.")]
    EmptyUrl,

    /// Proxy method discriminator missing
    #[error("$server[\"method\"] does not exist.")]
    MissingMethod,

    /// Proxy method not recognized
    #[error("Invalid method.")]
    InvalidMethod(String),

    /// A required proxy field is empty (`server` or `userPass`)
    #[error("$server[\"{0}\"] does not exist.")]
    MissingField(&'static str),

    /// Cookie session id would escape the cookie directory
    #[error("Invalid cookie session id: {0}")]
    InvalidCookieSession(String),

    /// Cookie storage could not be prepared
    #[error("Cookie store unavailable: {0}")]
    CookieStore(String),
}

impl ValidationError {
    /// Name of the missing field, if this is a missing-field error
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(field) => Some(*field),
            ValidationError::MissingMethod => Some("method"),
            _ => None,
        }
    }
}

/// curl error codes used as the transport's native taxonomy
pub mod codes {
    pub const UNSUPPORTED_PROTOCOL: u32 = 1;
    pub const FAILED_INIT: u32 = 2;
    pub const URL_MALFORMAT: u32 = 3;
    pub const COULDNT_RESOLVE_PROXY: u32 = 5;
    pub const COULDNT_RESOLVE_HOST: u32 = 6;
    pub const COULDNT_CONNECT: u32 = 7;
    pub const OPERATION_TIMEDOUT: u32 = 28;
    pub const SSL_CONNECT_ERROR: u32 = 35;
    pub const TOO_MANY_REDIRECTS: u32 = 47;
    pub const GOT_NOTHING: u32 = 52;
    pub const RECV_ERROR: u32 = 56;
    pub const BAD_CONTENT_ENCODING: u32 = 61;
}

/// Transport-level failure: no response was obtained
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("transport error {code}: {message}")]
pub struct TransportError {
    /// curl-compatible error code
    pub code: u32,
    /// Human readable message from the transport
    pub message: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(codes::OPERATION_TIMEDOUT, message)
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        self.code == codes::OPERATION_TIMEDOUT
    }

    /// Classify a reqwest error into a curl code, keeping reqwest's message
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let chain = error_chain(err);
        // Classify on the causes only; the top-level message embeds the URL
        let lower = causes(err).to_lowercase();

        let code = if err.is_timeout() {
            codes::OPERATION_TIMEDOUT
        } else if err.is_redirect() {
            codes::TOO_MANY_REDIRECTS
        } else if err.is_builder() {
            if lower.contains("scheme") {
                codes::UNSUPPORTED_PROTOCOL
            } else {
                codes::URL_MALFORMAT
            }
        } else if lower.contains("dns error") || lower.contains("failed to lookup") {
            if lower.contains("proxy") {
                codes::COULDNT_RESOLVE_PROXY
            } else {
                codes::COULDNT_RESOLVE_HOST
            }
        } else if lower.contains("certificate")
            || lower.contains("tls")
            || lower.contains("handshake")
        {
            codes::SSL_CONNECT_ERROR
        } else if err.is_connect() {
            codes::COULDNT_CONNECT
        } else if err.is_decode() {
            codes::BAD_CONTENT_ENCODING
        } else if lower.contains("connection closed before message completed") {
            codes::GOT_NOTHING
        } else {
            codes::RECV_ERROR
        };

        Self::new(code, chain)
    }

    /// Classify a failure of the HTTP/1 connection inside a proxy tunnel
    pub fn from_hyper(err: &hyper::Error) -> Self {
        let code = if err.is_timeout() {
            codes::OPERATION_TIMEDOUT
        } else if err.is_incomplete_message() {
            codes::GOT_NOTHING
        } else {
            codes::RECV_ERROR
        };
        Self::new(code, error_chain(err))
    }
}

/// Flatten an error and its sources into one message
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Display of every source below the top-level error
fn causes(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push(cause.to_string());
        source = cause.source();
    }
    out.join(": ")
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::from_reqwest(&err)
    }
}

impl From<hyper::Error> for TransportError {
    fn from(err: hyper::Error) -> Self {
        TransportError::from_hyper(&err)
    }
}
