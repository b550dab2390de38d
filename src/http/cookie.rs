// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar implementation for persistent cookie storage
//!
//! The transport reads the jar before every hop of a call and stores each
//! hop's `Set-Cookie` headers back into it, so cookies set on intermediate
//! redirects are captured too. Jars serialize to the Netscape cookie file
//! format used by curl.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use dashmap::DashMap;
use url::Url;

/// Prefix curl uses for HttpOnly cookies in jar files
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Header written at the top of every jar file
const JAR_FILE_HEADER: &str = "# Netscape HTTP Cookie File\n\
# This file was generated by haukka. Edit at your own risk.\n\n";

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to (no leading dot)
    pub domain: String,
    /// Also send to subdomains of `domain`
    pub include_subdomains: bool,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            include_subdomains: false,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie matches the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !path_matches(&self.path, url.path()) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        let host = host.to_ascii_lowercase();
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        if host == domain {
            return true;
        }
        self.include_subdomains && host.ends_with(&format!(".{}", domain))
    }

    /// Parse a Set-Cookie header value
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim());

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        cookie.domain = host.clone();
        cookie.path = default_path(url);

        let mut max_age_seen = false;
        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" => {
                        let domain = val.trim_start_matches('.').to_ascii_lowercase();
                        if domain.is_empty() {
                            continue;
                        }
                        // A server may only widen the cookie to a parent domain of itself
                        if host != domain && !host.ends_with(&format!(".{}", domain)) {
                            return None;
                        }
                        cookie.domain = domain;
                        cookie.include_subdomains = true;
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" if !max_age_seen => {
                        if let Some(expires) = parse_cookie_date(val) {
                            cookie.expires = Some(expires);
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            max_age_seen = true;
                            cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                        }
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Render as one Netscape cookie file line
    pub fn to_netscape_line(&self) -> String {
        let domain = if self.include_subdomains {
            format!(".{}", self.domain)
        } else {
            self.domain.clone()
        };
        let prefix = if self.http_only { HTTP_ONLY_PREFIX } else { "" };
        let expires = self.expires.map_or(0, |exp| exp.timestamp());

        format!(
            "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            prefix,
            domain,
            netscape_bool(self.include_subdomains),
            self.path,
            netscape_bool(self.secure),
            expires,
            self.name,
            self.value
        )
    }

    /// Parse one Netscape cookie file line. Comment and blank lines yield None.
    pub fn from_netscape_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            return None;
        }

        let expires = match fields[4].trim().parse::<i64>() {
            Ok(0) => None,
            Ok(secs) => DateTime::from_timestamp(secs, 0),
            Err(_) => return None,
        };

        Some(Cookie {
            name: fields[5].to_string(),
            value: fields.get(6).map(|v| v.to_string()).unwrap_or_default(),
            domain: fields[0].trim_start_matches('.').to_ascii_lowercase(),
            include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
            path: fields[2].to_string(),
            expires,
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            http_only,
        })
    }
}

/// Date formats seen in `Expires`, tried after RFC 2822
const COOKIE_DATE_FORMATS: &[&str] = &[
    // Netscape: Thu, 01-Jan-1970 00:00:01 GMT
    "%a, %d-%b-%Y %H:%M:%S GMT",
    // RFC 850: Thursday, 01-Jan-70 00:00:01 GMT
    "%A, %d-%b-%y %H:%M:%S GMT",
    // asctime: Thu Jan  1 00:00:01 1970
    "%a %b %e %H:%M:%S %Y",
];

/// Parse a cookie `Expires` value. All formats are read as UTC.
fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    COOKIE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn netscape_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Default cookie path: the request path up to its last `/`
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Thread-safe cookie storage
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Add a cookie to the jar, replacing one with the same name and path.
    /// An already expired cookie only removes its predecessor.
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// Get all cookies for a URL
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        let mut result: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|c| c.matches(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        // Longer paths first
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        result
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// All cookies in the jar
    pub fn all(&self) -> Vec<Cookie> {
        let mut all: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        all.sort_by(|a, b| (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name)));
        all
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export all live cookies in Netscape cookie file format
    pub fn to_netscape(&self) -> String {
        let mut out = String::from(JAR_FILE_HEADER);
        for cookie in self.all().into_iter().filter(|c| !c.is_expired()) {
            out.push_str(&cookie.to_netscape_line());
            out.push('\n');
        }
        out
    }

    /// Import cookies from Netscape cookie file text. Expired entries are dropped.
    pub fn from_netscape(text: &str) -> Self {
        let jar = CookieJar::new();
        for cookie in text.lines().filter_map(Cookie::from_netscape_line) {
            jar.add(cookie);
        }
        jar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://example.com/path").unwrap();
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert!(cookie.include_subdomains);
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_cookie_rejects_foreign_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(Cookie::parse("a=1; Domain=evil.com", &url).is_none());
    }

    #[test]
    fn test_host_only_cookie() {
        let url = Url::parse("http://example.com/").unwrap();
        let cookie = Cookie::parse("a=1", &url).unwrap();
        assert!(!cookie.include_subdomains);
        assert!(cookie.matches(&url));
        assert!(!cookie.matches(&Url::parse("http://sub.example.com/").unwrap()));
    }

    #[test]
    fn test_cookie_jar() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/path").unwrap();

        jar.add(Cookie::new("test", "value").domain("example.com"));
        assert_eq!(jar.len(), 1);

        let cookies = jar.get_cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "test");
        assert_eq!(jar.get_cookie_header(&url).as_deref(), Some("test=value"));
    }

    #[test]
    fn test_max_age_zero_deletes() {
        let jar = CookieJar::new();
        let url = Url::parse("http://example.com/").unwrap();
        jar.add_from_header("sid=1", &url);
        assert_eq!(jar.len(), 1);
        jar.add_from_header("sid=deleted; Max-Age=0", &url);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_netscape_round_trip() {
        let url = Url::parse("https://example.com/app/login").unwrap();
        let jar = CookieJar::new();
        jar.add_from_header("sid=abc; Path=/; HttpOnly", &url);
        jar.add_from_header("pref=dark; Domain=example.com; Max-Age=3600; Secure", &url);

        let text = jar.to_netscape();
        assert!(text.starts_with("# Netscape HTTP Cookie File"));
        assert!(text.contains("#HttpOnly_example.com\tFALSE\t/\tFALSE\t0\tsid\tabc"));
        assert!(text.contains(".example.com\tTRUE\t/app\tTRUE\t"));

        let restored = CookieJar::from_netscape(&text);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.to_netscape(), text);
    }

    #[test]
    fn test_netscape_skips_expired_and_comments() {
        let text = "# Netscape HTTP Cookie File\n\
                    \n\
                    example.com\tFALSE\t/\tFALSE\t1\told\tx\n\
                    example.com\tFALSE\t/\tFALSE\t0\tlive\ty\n";
        let jar = CookieJar::from_netscape(text);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.all()[0].name, "live");
    }

    #[test]
    fn test_netscape_expires_deletes() {
        let jar = CookieJar::new();
        let url = Url::parse("http://example.com/").unwrap();
        jar.add_from_header("sid=1", &url);
        jar.add_from_header("sid=deleted; expires=Thu, 01-Jan-1970 00:00:01 GMT; path=/", &url);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_expires_formats() {
        let epoch_plus_one = DateTime::from_timestamp(1, 0);
        assert_eq!(parse_cookie_date("Thu, 01 Jan 1970 00:00:01 GMT"), epoch_plus_one);
        assert_eq!(parse_cookie_date("Thu, 01-Jan-1970 00:00:01 GMT"), epoch_plus_one);
        assert_eq!(parse_cookie_date("Thursday, 01-Jan-70 00:00:01 GMT"), epoch_plus_one);
        assert_eq!(parse_cookie_date("Thu Jan  1 00:00:01 1970"), epoch_plus_one);
        assert_eq!(parse_cookie_date("not a date"), None);
    }

    #[test]
    fn test_future_netscape_expires_kept() {
        let url = Url::parse("http://example.com/").unwrap();
        let cookie = Cookie::parse("a=1; expires=Fri, 31-Dec-2100 23:59:59 GMT", &url).unwrap();
        assert_eq!(
            cookie.expires.map(|e| e.timestamp()),
            Some(4133980799)
        );
        assert!(cookie.matches(&url));
    }
}
