// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Executor configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::http::DEFAULT_COOKIE_DIR;

/// Baseline settings applied to every request before caller overrides.
///
/// Certificate verification is off by default: the executor is meant to
/// talk to arbitrary hosts, self-signed ones included. Use
/// [`ExecutorConfig::verify_tls`] to turn it back on.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Total time allowed for one request
    pub timeout: Duration,
    /// Time allowed for connection setup
    pub connect_timeout: Duration,
    /// Follow `Location` redirects
    pub follow_redirects: bool,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Send `Referer` when following a redirect
    pub auto_referer: bool,
    /// Accept invalid TLS certificates and host names
    pub accept_invalid_certs: bool,
    /// Ask for and transparently decode compressed bodies
    pub decompress: bool,
    /// Directory holding cookie jar files
    pub cookie_dir: PathBuf,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            follow_redirects: true,
            max_redirects: 50,
            auto_referer: true,
            accept_invalid_certs: true,
            decompress: false,
            cookie_dir: PathBuf::from(DEFAULT_COOKIE_DIR),
        }
    }
}

impl ExecutorConfig {
    /// Create a new executor config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable/disable redirect following
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Set max redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set cookie jar directory
    pub fn cookie_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cookie_dir = dir.into();
        self
    }

    /// Enable/disable transparent decompression
    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    /// Verify TLS certificates and host names
    pub fn verify_tls(mut self) -> Self {
        self.accept_invalid_certs = false;
        self
    }
}
