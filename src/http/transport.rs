// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport seam
//!
//! A [`Transport`] opens one [`TransportHandle`] per request. The handle
//! performs exactly one exchange and reports it the way curl does: the raw
//! response (every header block of the redirect chain followed by the final
//! body), the length of those header blocks, the raw headers of the last
//! request sent, status and total time. Dropping the handle releases it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use tracing::{debug, warn};
use url::Url;

use super::builder::PreparedRequest;
use super::cookie::CookieJar;
use super::headers;
use super::options::TransportOptions;
use super::tunnel;
use crate::error::{codes, TransportError};

/// Everything the transport reports about one completed exchange
#[derive(Debug, Clone)]
pub struct RawExchange {
    /// Final HTTP status code
    pub status: u16,
    /// Total time of the exchange
    pub total_time: Duration,
    /// Length of the header blocks at the start of `raw`
    pub header_size: usize,
    /// Header blocks followed by the body
    pub raw: Bytes,
    /// Raw header block of the last request sent
    pub request_header: String,
}

impl RawExchange {
    /// Assemble from header blocks and a body
    pub fn new(
        status: u16,
        total_time: Duration,
        header_block: &str,
        body: &[u8],
        request_header: impl Into<String>,
    ) -> Self {
        let mut raw = BytesMut::with_capacity(header_block.len() + body.len());
        raw.extend_from_slice(header_block.as_bytes());
        raw.extend_from_slice(body);
        Self {
            status,
            total_time,
            header_size: header_block.len(),
            raw: raw.freeze(),
            request_header: request_header.into(),
        }
    }
}

/// Opens transport handles
pub trait Transport: Send + Sync {
    /// Acquire a handle configured for `request`
    fn open(&self, request: &PreparedRequest) -> Result<Box<dyn TransportHandle>, TransportError>;
}

/// A configured, single-use connection
#[async_trait]
pub trait TransportHandle: Send {
    /// Perform the exchange
    async fn perform(&mut self) -> Result<RawExchange, TransportError>;
}

/// One request as it goes on the wire
pub(crate) struct HopRequest<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub headers: &'a [(String, String)],
    pub body: Option<&'a str>,
}

/// One response of a redirect chain
pub(crate) struct Hop {
    pub status: u16,
    /// Status line, header lines and the blank line ending them
    pub head: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Hop {
    pub(crate) fn new<'h>(
        version: String,
        status: u16,
        reason: Option<&str>,
        fields: impl IntoIterator<Item = (&'h str, &'h [u8])>,
        body: Bytes,
    ) -> Self {
        let mut head = format!("{} {} {}\r\n", version, status, reason.unwrap_or(""));
        let mut headers = Vec::new();
        for (name, value) in fields {
            let value = String::from_utf8_lossy(value).into_owned();
            head.push_str(&format!("{}: {}\r\n", name, value));
            headers.push((name.to_string(), value));
        }
        head.push_str("\r\n");
        Self {
            status,
            head,
            headers,
            body,
        }
    }

    fn header_values<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Redirect target, when this response is one
    fn location(&self) -> Option<&str> {
        if !matches!(self.status, 301 | 302 | 303 | 307 | 308) {
            return None;
        }
        self.header_values("location").next()
    }
}

/// reqwest-backed transport. A fresh client per request; nothing is pooled
/// across calls. Plain-http targets behind a tunnelling proxy go through
/// a CONNECT tunnel instead of the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Create a new transport
    pub fn new() -> Self {
        Self
    }

    fn client(options: &TransportOptions) -> Result<Client, TransportError> {
        // Redirects are followed hop by hop in the handle
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .redirect(Policy::none())
            .referer(false)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .pool_max_idle_per_host(0);

        if !options.decompress {
            builder = builder.no_gzip().no_brotli();
        }

        if let Some(ref settings) = options.proxy {
            let mut proxy = reqwest::Proxy::all(settings.url.as_str()).map_err(|e| {
                TransportError::new(
                    codes::COULDNT_RESOLVE_PROXY,
                    format!("Invalid proxy {}: {}", settings.url, e),
                )
            })?;
            if let Some((ref user, ref pass)) = settings.credentials {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| TransportError::new(codes::FAILED_INIT, e.to_string()))
    }
}

impl Transport for ReqwestTransport {
    fn open(&self, request: &PreparedRequest) -> Result<Box<dyn TransportHandle>, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| {
            TransportError::new(
                codes::URL_MALFORMAT,
                format!("URL using bad/illegal format or missing URL: {}", e),
            )
        })?;
        check_scheme(&url)?;

        Ok(Box::new(HttpHandle {
            client: Self::client(&request.options)?,
            options: request.options.clone(),
            url,
            headers: request.headers.clone(),
            body: request.body.clone(),
            cookie_jar: request.cookie_jar.clone(),
            used: false,
        }))
    }
}

fn check_scheme(url: &Url) -> Result<(), TransportError> {
    if matches!(url.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(TransportError::new(
            codes::UNSUPPORTED_PROTOCOL,
            format!("Protocol \"{}\" not supported", url.scheme()),
        ))
    }
}

/// Single-use client plus the request it will send
struct HttpHandle {
    client: Client,
    options: TransportOptions,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<String>,
    cookie_jar: Option<CookieJar>,
    used: bool,
}

impl HttpHandle {
    /// Whether `url` goes through a CONNECT tunnel of our own
    fn tunnels(&self, url: &Url) -> bool {
        url.scheme() == "http" && self.options.proxy.as_ref().map_or(false, |p| p.tunnel)
    }

    /// Headers for one hop: Host first, then the prepared headers, then
    /// Referer, Cookie and Accept-Encoding unless the caller set them
    fn hop_headers(&self, url: &Url, referer: Option<&str>, has_body: bool) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.headers.len() + 4);
        if !has_header(&self.headers, headers::HOST) {
            out.push((headers::HOST.to_string(), host_header(url)));
        }
        out.extend(
            self.headers
                .iter()
                .filter(|(n, _)| has_body || !n.eq_ignore_ascii_case(headers::CONTENT_TYPE))
                .cloned(),
        );
        if let Some(referer) = referer {
            if !has_header(&out, headers::REFERER) {
                out.push((headers::REFERER.to_string(), referer.to_string()));
            }
        }
        if let Some(cookie) = self
            .cookie_jar
            .as_ref()
            .and_then(|jar| jar.get_cookie_header(url))
        {
            if !has_header(&out, headers::COOKIE) {
                out.push((headers::COOKIE.to_string(), cookie));
            }
        }
        if self.options.decompress && !self.tunnels(url) && !has_header(&out, headers::ACCEPT_ENCODING) {
            out.push((
                headers::ACCEPT_ENCODING.to_string(),
                headers::DEFAULT_ACCEPT_ENCODING.to_string(),
            ));
        }
        out
    }

    async fn send(&self, request: HopRequest<'_>) -> Result<Hop, TransportError> {
        if self.tunnels(request.url) {
            if let Some(ref proxy) = self.options.proxy {
                let stream =
                    tunnel::open(proxy, request.url, self.options.connect_timeout).await?;
                return tunnel::send(stream, request).await;
            }
        }

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in request.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => warn!(header = %name, "Dropping header with invalid name or value"),
            }
        }
        if let Some(body) = request.body {
            builder = builder.body(body.to_string());
        }

        let response = self.client.execute(builder.build()?).await?;
        let version = format!("{:?}", response.version());
        let status = response.status();
        let fields: Vec<(String, Vec<u8>)> = response
            .headers()
            .iter()
            .map(|(n, v)| (n.as_str().to_string(), v.as_bytes().to_vec()))
            .collect();
        let body = response.bytes().await?;

        Ok(Hop::new(
            version,
            status.as_u16(),
            status.canonical_reason(),
            fields.iter().map(|(n, v)| (n.as_str(), v.as_slice())),
            body,
        ))
    }

    /// Send hops until a response is not a redirect to follow
    async fn follow(&self, start: Instant) -> Result<RawExchange, TransportError> {
        let mut url = self.url.clone();
        let mut method = self.options.method.clone();
        let mut body = self.body.clone();
        let mut referer: Option<String> = None;
        let mut header_blocks = String::new();
        let mut redirects = 0;

        loop {
            let hop_headers = self.hop_headers(&url, referer.as_deref(), body.is_some());
            let request_header =
                request_head(&method, &url, &hop_headers, body.as_ref().map(String::len));

            let hop = self
                .send(HopRequest {
                    method: &method,
                    url: &url,
                    headers: &hop_headers,
                    body: body.as_deref(),
                })
                .await?;

            if let Some(ref jar) = self.cookie_jar {
                for value in hop.header_values("set-cookie") {
                    jar.add_from_header(value, &url);
                }
            }
            header_blocks.push_str(&hop.head);

            let location = if self.options.follow_redirects {
                hop.location()
            } else {
                None
            };
            let Some(location) = location else {
                return Ok(RawExchange::new(
                    hop.status,
                    start.elapsed(),
                    &header_blocks,
                    &hop.body,
                    request_header,
                ));
            };

            if redirects >= self.options.max_redirects {
                return Err(TransportError::new(
                    codes::TOO_MANY_REDIRECTS,
                    format!("Maximum ({}) redirects followed", self.options.max_redirects),
                ));
            }
            redirects += 1;

            let next = url.join(location).map_err(|e| {
                TransportError::new(
                    codes::URL_MALFORMAT,
                    format!("Bad redirect location {}: {}", location, e),
                )
            })?;
            check_scheme(&next)?;
            debug!(from = %url, to = %next, status = hop.status, "Following redirect");

            referer = if self.options.auto_referer {
                referer_for(&url, &next)
            } else {
                None
            };
            if switches_to_get(hop.status, &method) {
                method = Method::GET;
                body = None;
            }
            url = next;
        }
    }
}

#[async_trait]
impl TransportHandle for HttpHandle {
    async fn perform(&mut self) -> Result<RawExchange, TransportError> {
        if self.used {
            return Err(TransportError::new(codes::FAILED_INIT, "Handle already used"));
        }
        self.used = true;

        let start = Instant::now();
        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, self.follow(start))
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::timeout(format!(
                    "Operation timed out after {} milliseconds",
                    timeout.as_millis()
                )))
            })
    }
}

fn has_header(list: &[(String, String)], name: &str) -> bool {
    list.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Outgoing header block as it goes on the wire
fn request_head(
    method: &Method,
    url: &Url,
    hop_headers: &[(String, String)],
    body_len: Option<usize>,
) -> String {
    let mut out = format!("{} {} HTTP/1.1\r\n", method, origin_form(url));
    for (name, value) in hop_headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    if let Some(len) = body_len {
        out.push_str(&format!("Content-Length: {}\r\n", len));
    }
    out.push_str("\r\n");
    out
}

/// Path and query of `url`
pub(crate) fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Referer sent to `next`: the previous URL without credentials or fragment,
/// never leaked from https to http
fn referer_for(previous: &Url, next: &Url) -> Option<String> {
    if previous.scheme() == "https" && next.scheme() == "http" {
        return None;
    }
    let mut referer = previous.clone();
    referer.set_fragment(None);
    let _ = referer.set_username("");
    let _ = referer.set_password(None);
    Some(referer.to_string())
}

/// 303 always becomes GET; 301 and 302 turn a POST into a GET
fn switches_to_get(status: u16, method: &Method) -> bool {
    match status {
        303 => *method != Method::HEAD,
        301 | 302 => *method == Method::POST,
        _ => false,
    }
}
