// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Execution results and raw response parsing

use std::collections::HashMap;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use super::transport::RawExchange;
use crate::error::{Error, Result, TransportError, ValidationError};

/// Header name (lower-cased, trimmed) to value (trimmed)
pub type HeaderFields = HashMap<String, String>;

lazy_static! {
    /// One `Name: Value` per line; status lines have no colon and never match
    static ref HEADER_LINE: Regex = Regex::new(r"(?m)^(.*?):[ \t]*(.*?)$").unwrap();
}

/// Parse a raw header block. A repeated name keeps its last value.
pub fn parse_headers(block: &str) -> HeaderFields {
    HEADER_LINE
        .captures_iter(block)
        .map(|caps| {
            (
                caps[1].trim().to_lowercase(),
                caps[2].trim().to_string(),
            )
        })
        .collect()
}

/// A completed HTTP exchange. Any status code counts, 4xx and 5xx included.
#[derive(Debug, Clone, Serialize)]
pub struct HttpExchange {
    /// Final HTTP status code
    pub status_code: u16,
    /// Total time in seconds
    pub elapsed_seconds: f64,
    /// Headers that were sent
    pub request_headers: HeaderFields,
    /// Headers that were received
    pub response_headers: HeaderFields,
    /// Response body as text. Invalid UTF-8 is replaced with U+FFFD, so
    /// binary payloads should be read from `raw_body`.
    pub body: String,
    /// Response body bytes exactly as received
    #[serde(skip)]
    pub raw_body: Bytes,
}

impl HttpExchange {
    /// Split and parse a raw exchange
    pub fn from_raw(raw: &RawExchange) -> Self {
        let split = raw.header_size.min(raw.raw.len());
        let (head, body) = raw.raw.split_at(split);

        Self {
            status_code: raw.status,
            elapsed_seconds: raw.total_time.as_secs_f64(),
            request_headers: parse_headers(&raw.request_header),
            response_headers: parse_headers(&String::from_utf8_lossy(head)),
            body: String::from_utf8_lossy(body).into_owned(),
            raw_body: raw.raw.slice(split..),
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Get a response header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// Get a request header value
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .get(&name.to_lowercase())
            .map(String::as_str)
    }
}

/// Outcome of one GET or POST
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// A response was received
    Success(HttpExchange),
    /// The transport never produced a response
    Failure(TransportError),
    /// The request was rejected before any network I/O
    Rejected(ValidationError),
}

impl ExecutionResult {
    /// Check if a response was received
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// The exchange, on success
    pub fn exchange(&self) -> Option<&HttpExchange> {
        match self {
            ExecutionResult::Success(exchange) => Some(exchange),
            _ => None,
        }
    }

    /// The transport error, on failure
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ExecutionResult::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// The validation error, on rejection
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            ExecutionResult::Rejected(err) => Some(err),
            _ => None,
        }
    }

    /// Status code, on success
    pub fn status_code(&self) -> Option<u16> {
        self.exchange().map(|e| e.status_code)
    }

    /// Error message for failures and rejections
    pub fn error_message(&self) -> Option<String> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Failure(err) => Some(err.message.clone()),
            ExecutionResult::Rejected(err) => Some(err.to_string()),
        }
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> Result<HttpExchange> {
        match self {
            ExecutionResult::Success(exchange) => Ok(exchange),
            ExecutionResult::Failure(err) => Err(Error::Transport(err)),
            ExecutionResult::Rejected(err) => Err(Error::Validation(err)),
        }
    }

    /// JSON shape with a `success` flag:
    ///
    /// - `{"success":true,"code":..,"time":..,"headers":{"req":..,"res":..},"body":..}`
    /// - `{"success":false,"error":{"code":..,"msg":..}}` for transport failures
    /// - `{"success":false,"error":".."}` for rejected input
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ExecutionResult::Success(e) => json!({
                "success": true,
                "code": e.status_code,
                "time": e.elapsed_seconds,
                "headers": {
                    "req": e.request_headers,
                    "res": e.response_headers,
                },
                "body": e.body,
            }),
            ExecutionResult::Failure(err) => json!({
                "success": false,
                "error": {
                    "code": err.code,
                    "msg": err.message,
                },
            }),
            ExecutionResult::Rejected(err) => json!({
                "success": false,
                "error": err.to_string(),
            }),
        }
    }
}

impl From<HttpExchange> for ExecutionResult {
    fn from(exchange: HttpExchange) -> Self {
        ExecutionResult::Success(exchange)
    }
}

impl From<TransportError> for ExecutionResult {
    fn from(err: TransportError) -> Self {
        ExecutionResult::Failure(err)
    }
}

impl From<ValidationError> for ExecutionResult {
    fn from(err: ValidationError) -> Self {
        ExecutionResult::Rejected(err)
    }
}
