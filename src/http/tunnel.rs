// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CONNECT tunnels through an HTTP proxy
//!
//! reqwest hands plain-http targets to a proxy as absolute-form requests and
//! only tunnels https. A tunnelling proxy instead gets `CONNECT host:port`
//! first, and the request then travels over the opened stream in origin form
//! on its own HTTP/1 connection.

use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::header::{HeaderName, HeaderValue};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use url::Url;

use super::proxy::ProxySettings;
use super::transport::{origin_form, Hop, HopRequest};
use crate::error::{codes, TransportError};

/// Connect to the proxy and ask it for a tunnel to `target`
pub(crate) async fn open(
    proxy: &ProxySettings,
    target: &Url,
    connect_timeout: Duration,
) -> Result<TcpStream, TransportError> {
    let proxy_url = Url::parse(&proxy.url).map_err(|e| {
        TransportError::new(
            codes::COULDNT_RESOLVE_PROXY,
            format!("Invalid proxy {}: {}", proxy.url, e),
        )
    })?;
    if proxy_url.scheme() != "http" {
        return Err(TransportError::new(
            codes::UNSUPPORTED_PROTOCOL,
            format!("Proxy scheme \"{}\" cannot tunnel", proxy_url.scheme()),
        ));
    }
    let host = proxy_url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .ok_or_else(|| {
            TransportError::new(codes::COULDNT_RESOLVE_PROXY, "Proxy URL has no host")
        })?;
    let port = proxy_url.port_or_known_default().unwrap_or(80);

    let stream = tokio::time::timeout(connect_timeout, connect(&host, port))
        .await
        .map_err(|_| {
            TransportError::timeout(format!(
                "Connection timed out after {} milliseconds",
                connect_timeout.as_millis()
            ))
        })??;

    handshake(stream, proxy, &authority(target)?).await
}

async fn connect(host: &str, port: u16) -> Result<TcpStream, TransportError> {
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        TransportError::new(
            codes::COULDNT_RESOLVE_PROXY,
            format!("Could not resolve proxy: {}: {}", host, e),
        )
    })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(TransportError::new(
        codes::COULDNT_CONNECT,
        format!(
            "Failed to connect to {} port {}: {}",
            host,
            port,
            last_error.map_or_else(|| "no address".to_string(), |e| e.to_string())
        ),
    ))
}

async fn handshake(
    mut stream: TcpStream,
    proxy: &ProxySettings,
    authority: &str,
) -> Result<TcpStream, TransportError> {
    let mut head = format!("CONNECT {0} HTTP/1.1\r\nHost: {0}\r\n", authority);
    if let Some((ref user, ref pass)) = proxy.credentials {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
        head.push_str(&format!("Proxy-Authorization: Basic {}\r\n", token));
    }
    head.push_str("Proxy-Connection: Keep-Alive\r\n\r\n");

    stream.write_all(head.as_bytes()).await.map_err(|e| {
        TransportError::new(codes::RECV_ERROR, format!("Failed sending CONNECT to proxy: {}", e))
    })?;

    let mut reader = BufReader::new(stream);
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(read_error)?;
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await.map_err(read_error)?;
        if read == 0 || line.trim().is_empty() {
            break;
        }
    }

    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok());
    match status {
        Some(code) if (200..300).contains(&code) => {}
        Some(code) => {
            return Err(TransportError::new(
                codes::RECV_ERROR,
                format!("Received HTTP code {} from proxy after CONNECT", code),
            ))
        }
        None => {
            return Err(TransportError::new(
                codes::GOT_NOTHING,
                "Proxy CONNECT aborted",
            ))
        }
    }

    if !reader.buffer().is_empty() {
        warn!(target = %authority, "Proxy sent data ahead of the tunnelled request");
    }
    debug!(target = %authority, "Tunnel established");
    Ok(reader.into_inner())
}

fn read_error(e: std::io::Error) -> TransportError {
    TransportError::new(
        codes::RECV_ERROR,
        format!("Failed reading CONNECT response from proxy: {}", e),
    )
}

/// `host:port` of the tunnel target
fn authority(target: &Url) -> Result<String, TransportError> {
    let host = target
        .host_str()
        .ok_or_else(|| TransportError::new(codes::URL_MALFORMAT, "No host part in the URL"))?;
    let port = target.port_or_known_default().unwrap_or(80);
    Ok(format!("{}:{}", host, port))
}

/// Send one request over an established tunnel
pub(crate) async fn send(stream: TcpStream, request: HopRequest<'_>) -> Result<Hop, TransportError> {
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;

    let method = hyper::Method::from_bytes(request.method.as_str().as_bytes())
        .map_err(|e| TransportError::new(codes::FAILED_INIT, e.to_string()))?;
    let mut builder = hyper::Request::builder()
        .method(method)
        .uri(origin_form(request.url));
    for (name, value) in request.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => builder = builder.header(name, value),
            _ => warn!(header = %name, "Dropping header with invalid name or value"),
        }
    }
    let body = Full::new(Bytes::from(request.body.unwrap_or_default().to_string()));
    let outgoing = builder
        .body(body)
        .map_err(|e| TransportError::new(codes::FAILED_INIT, e.to_string()))?;

    // The sender is dropped with this future, which lets the connection finish
    let exchange = async move {
        let response = sender.send_request(outgoing).await?;
        let (parts, incoming) = response.into_parts();
        let body = incoming.collect().await?.to_bytes();
        Ok::<_, hyper::Error>((parts, body))
    };
    let (result, closed) = tokio::join!(exchange, connection);
    if let Err(e) = closed {
        debug!(error = %e, "Tunnel connection closed with error");
    }
    let (parts, body) = result?;

    Ok(Hop::new(
        format!("{:?}", parts.version),
        parts.status.as_u16(),
        parts.status.canonical_reason(),
        parts.headers.iter().map(|(n, v)| (n.as_str(), v.as_bytes())),
        body,
    ))
}
