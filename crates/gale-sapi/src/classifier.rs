//! Server variable classification
//!
//! Reads a [`ServerParams`] snapshot and pulls out the request method,
//! protocol version, URI hints and header candidates. Each concern has its
//! own fallback chain; missing input falls back to defaults and never fails.

use crate::header_name::normalize_header_name;
use gale_message::ServerParams;
use std::borrow::Cow;

/// Method used when `REQUEST_METHOD` is missing
pub const DEFAULT_METHOD: &str = "GET";

/// Protocol version used when `SERVER_PROTOCOL` is missing
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

const REDIRECT_PREFIX: &str = "REDIRECT_";
const HTTP_PREFIX: &str = "HTTP_";
const CONTENT_PREFIX: &str = "CONTENT_";

/// URI components gathered from server variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriHints {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
}

/// Header derived from a server variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCandidate {
    /// Canonical name, derived from the variable name only
    pub name: String,
    pub value: String,
}

/// Everything classification extracts from one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub method: String,
    pub protocol_version: String,
    pub uri: UriHints,
    pub headers: Vec<HeaderCandidate>,
}

/// Classify a server variable snapshot
pub fn classify(server: &ServerParams) -> Classification {
    Classification {
        method: method(server),
        protocol_version: protocol_version(server),
        uri: uri_hints(server),
        headers: header_candidates(server),
    }
}

/// `REQUEST_METHOD`, or `GET`
pub fn method(server: &ServerParams) -> String {
    server
        .text("REQUEST_METHOD")
        .map_or_else(|| DEFAULT_METHOD.to_string(), Cow::into_owned)
}

/// `SERVER_PROTOCOL` without its `HTTP/` prefix, or `1.1`
pub fn protocol_version(server: &ServerParams) -> String {
    match server.text("SERVER_PROTOCOL") {
        Some(protocol) => protocol
            .strip_prefix("HTTP/")
            .unwrap_or(&protocol)
            .to_string(),
        None => DEFAULT_PROTOCOL_VERSION.to_string(),
    }
}

/// Scheme, host, port, path and query hints
pub fn uri_hints(server: &ServerParams) -> UriHints {
    let mut hints = UriHints {
        scheme: scheme(server),
        ..Default::default()
    };

    let host = first_text(server, &["HTTP_X_FORWARDED_HOST", "HTTP_HOST"])
        .or_else(|| first_text(server, &["SERVER_NAME", "SERVER_ADDR"]));
    let mut embedded_port = false;
    if let Some(host) = host {
        let (host, port) = split_host_port(&host);
        embedded_port = port.is_some();
        hints.host = Some(host);
        hints.port = port;
    }

    if !embedded_port {
        if let Some(port) = server.text("SERVER_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) if port > 0 => hints.port = Some(port),
                _ => tracing::warn!(server_port = %port, "ignoring invalid SERVER_PORT"),
            }
        }
    }

    if let Some(request_uri) = first_text(server, &["REQUEST_URI", "ORIG_PATH_INFO"]) {
        let path = strip_scheme_authority(&request_uri);
        let path = path.split('?').next().unwrap_or_default();
        hints.path = Some(path.to_string());
    }

    hints.query = server
        .get("QUERY_STRING")
        .and_then(|v| v.as_text())
        .map(Cow::into_owned);

    hints
}

/// Header candidates in server map order
///
/// A `REDIRECT_`-prefixed variable whose unprefixed name also exists is
/// skipped. Otherwise the prefix is dropped before matching `HTTP_*` (name
/// after the prefix) and `CONTENT_*` (full name). A name produced twice keeps
/// its first position and the later value.
pub fn header_candidates(server: &ServerParams) -> Vec<HeaderCandidate> {
    let mut headers: Vec<HeaderCandidate> = Vec::new();

    for (name, value) in server.iter() {
        let value = match value.as_text() {
            Some(value) if !value.is_empty() => value,
            _ => continue,
        };

        let mut name = name;
        if let Some(unprefixed) = name.strip_prefix(REDIRECT_PREFIX) {
            if server.contains(unprefixed) {
                tracing::trace!(variable = name, "skipping redirect-shadowed variable");
                continue;
            }
            name = unprefixed;
        }

        let header_name = if let Some(rest) = name.strip_prefix(HTTP_PREFIX) {
            normalize_header_name(rest)
        } else if name.starts_with(CONTENT_PREFIX) {
            normalize_header_name(name)
        } else {
            continue;
        };

        match headers.iter_mut().find(|h| h.name == header_name) {
            Some(existing) => existing.value = value.into_owned(),
            None => headers.push(HeaderCandidate {
                name: header_name,
                value: value.into_owned(),
            }),
        }
    }

    headers
}

/// `https` when `HTTPS` is on, else the forwarded or request scheme
fn scheme(server: &ServerParams) -> Option<String> {
    let https = server
        .text("HTTPS")
        .map_or(false, |v| v.eq_ignore_ascii_case("on") || v == "1");
    if https {
        return Some("https".to_string());
    }
    first_text(server, &["HTTP_X_FORWARDED_PROTO", "REQUEST_SCHEME"])
}

fn first_text(server: &ServerParams, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| server.text(name))
        .map(Cow::into_owned)
}

/// Split a trailing `:digits` port off a host
///
/// Bare IPv6 addresses are bracketed and never split. An empty trailing port
/// (`example.com:`) is dropped.
pub fn split_host_port(host: &str) -> (String, Option<u16>) {
    if host.starts_with('[') {
        if let Some((addr, port)) = host.rsplit_once("]:") {
            if port.is_empty() {
                return (format!("{}]", addr), None);
            }
            if let Some(port) = parse_port(port) {
                return (format!("{}]", addr), Some(port));
            }
        }
        return (host.to_string(), None);
    }

    match host.rsplit_once(':') {
        Some((name, _)) if name.contains(':') => (format!("[{}]", host), None),
        Some((name, "")) => (name.to_string(), None),
        Some((name, port)) => match parse_port(port) {
            Some(port) => (name.to_string(), Some(port)),
            None => (host.to_string(), None),
        },
        None => (host.to_string(), None),
    }
}

fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse().ok().filter(|port| *port > 0)
}

/// Drop a leading `scheme://authority` from an absolute request line
fn strip_scheme_authority(request_uri: &str) -> &str {
    let Some((scheme, rest)) = request_uri.split_once("://") else {
        return request_uri;
    };
    if scheme.is_empty() || scheme.contains(['/', ':']) {
        return request_uri;
    }
    let end = rest.find('/').unwrap_or(rest.len());
    if end == 0 {
        return request_uri;
    }
    &rest[end..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gale_message::Value;

    fn server() -> ServerParams {
        ServerParams::new()
            .with("HTTPS", "on")
            .with("SERVER_PORT", "443")
            .with("REQUEST_METHOD", "GET")
            .with("SERVER_PROTOCOL", "HTTP/1.1")
            .with("HTTP_HOST", "example.com")
            .with("HTTP_CACHE_CONTROL", "max-age=0")
            .with("HTTP_X_FORWARDED_PROTO", "https")
            .with("CONTENT_TYPE", "text/html; charset=UTF-8")
            .with("REQUEST_URI", "/path?name=value")
            .with("QUERY_STRING", "name=value")
    }

    fn header<'a>(headers: &'a [HeaderCandidate], name: &str) -> Option<&'a str> {
        headers.iter().find(|h| h.name == name).map(|h| h.value.as_str())
    }

    #[test]
    fn test_method() {
        assert_eq!(method(&server()), "GET");
        assert_eq!(method(&server().with("REQUEST_METHOD", "PATCH")), "PATCH");
    }

    #[test]
    fn test_method_defaults_to_get() {
        assert_eq!(method(&server().with("REQUEST_METHOD", Value::Null)), "GET");
        assert_eq!(method(&server().with("REQUEST_METHOD", "")), "GET");
        assert_eq!(method(&ServerParams::new()), "GET");
    }

    #[test]
    fn test_protocol_version() {
        assert_eq!(protocol_version(&server()), "1.1");
        assert_eq!(protocol_version(&server().with("SERVER_PROTOCOL", "HTTP/1.0")), "1.0");
        assert_eq!(protocol_version(&server().with("SERVER_PROTOCOL", Value::Null)), "1.1");
        assert_eq!(protocol_version(&server().with("SERVER_PROTOCOL", "")), "1.1");
        assert_eq!(protocol_version(&ServerParams::new()), "1.1");
    }

    #[test]
    fn test_uri_hints() {
        let hints = uri_hints(&server());
        assert_eq!(hints.scheme.as_deref(), Some("https"));
        assert_eq!(hints.host.as_deref(), Some("example.com"));
        assert_eq!(hints.port, Some(443));
        assert_eq!(hints.path.as_deref(), Some("/path"));
        assert_eq!(hints.query.as_deref(), Some("name=value"));
    }

    #[test]
    fn test_uri_hints_empty_server() {
        assert_eq!(uri_hints(&ServerParams::new()), UriHints::default());
    }

    #[test]
    fn test_scheme_precedence() {
        let base = ServerParams::new().with("REQUEST_SCHEME", "http");
        assert_eq!(uri_hints(&base).scheme.as_deref(), Some("http"));

        let forwarded = base.clone().with("HTTP_X_FORWARDED_PROTO", "https");
        assert_eq!(uri_hints(&forwarded).scheme.as_deref(), Some("https"));

        let https = base.clone().with("HTTPS", "1");
        assert_eq!(uri_hints(&https).scheme.as_deref(), Some("https"));

        let off = base.with("HTTPS", "off");
        assert_eq!(uri_hints(&off).scheme.as_deref(), Some("http"));
    }

    #[test]
    fn test_host_precedence() {
        let server = ServerParams::new()
            .with("SERVER_NAME", "server.local")
            .with("SERVER_ADDR", "10.0.0.1");
        assert_eq!(uri_hints(&server).host.as_deref(), Some("server.local"));

        let server = server.with("HTTP_HOST", "example.com");
        assert_eq!(uri_hints(&server).host.as_deref(), Some("example.com"));

        let server = server.with("HTTP_X_FORWARDED_HOST", "public.example.com");
        assert_eq!(uri_hints(&server).host.as_deref(), Some("public.example.com"));

        let server = server.with("HTTP_X_FORWARDED_HOST", "");
        assert_eq!(uri_hints(&server).host.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_embedded_port_wins_over_server_port() {
        let server = ServerParams::new()
            .with("SERVER_PORT", 443)
            .with("HTTP_HOST", "example.com:8080");
        let hints = uri_hints(&server);
        assert_eq!(hints.host.as_deref(), Some("example.com"));
        assert_eq!(hints.port, Some(8080));
    }

    #[test]
    fn test_invalid_server_port_ignored() {
        let server = ServerParams::new().with("HTTP_HOST", "example.com").with("SERVER_PORT", "http");
        assert_eq!(uri_hints(&server).port, None);
        let server = server.with("SERVER_PORT", "0");
        assert_eq!(uri_hints(&server).port, None);
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com"), ("example.com".to_string(), None));
        assert_eq!(split_host_port("example.com:8080"), ("example.com".to_string(), Some(8080)));
        assert_eq!(split_host_port("[::1]:8080"), ("[::1]".to_string(), Some(8080)));
        assert_eq!(split_host_port("[::1]"), ("[::1]".to_string(), None));
        assert_eq!(split_host_port("::1"), ("[::1]".to_string(), None));
        assert_eq!(split_host_port("example.com:http"), ("example.com:http".to_string(), None));
        assert_eq!(split_host_port("example.com:"), ("example.com".to_string(), None));
        assert_eq!(split_host_port("[::1]:"), ("[::1]".to_string(), None));
    }

    #[test]
    fn test_empty_embedded_port_falls_back_to_server_port() {
        let server = ServerParams::new()
            .with("HTTP_HOST", "example.com:")
            .with("SERVER_PORT", "8080");
        let hints = uri_hints(&server);
        assert_eq!(hints.host.as_deref(), Some("example.com"));
        assert_eq!(hints.port, Some(8080));
    }

    #[test]
    fn test_false_values_fall_back_to_defaults() {
        let server = ServerParams::new()
            .with("REQUEST_METHOD", false)
            .with("SERVER_PROTOCOL", false)
            .with("HTTP_X_FORWARDED_HOST", false)
            .with("HTTP_HOST", "example.com")
            .with("HTTPS", false)
            .with("REQUEST_SCHEME", "http");
        assert_eq!(method(&server), "GET");
        assert_eq!(protocol_version(&server), "1.1");
        let hints = uri_hints(&server);
        assert_eq!(hints.host.as_deref(), Some("example.com"));
        assert_eq!(hints.scheme.as_deref(), Some("http"));
        assert!(header(&header_candidates(&server), "X-Forwarded-Host").is_none());
    }

    #[test]
    fn test_path_strips_absolute_form_and_query() {
        let server = ServerParams::new().with("REQUEST_URI", "http://example.com/a/b?c=d");
        assert_eq!(uri_hints(&server).path.as_deref(), Some("/a/b"));

        let server = ServerParams::new().with("REQUEST_URI", "https://example.com");
        assert_eq!(uri_hints(&server).path.as_deref(), Some(""));

        let server = ServerParams::new().with("ORIG_PATH_INFO", "/index.php");
        assert_eq!(uri_hints(&server).path.as_deref(), Some("/index.php"));

        let server = ServerParams::new()
            .with("REQUEST_URI", "")
            .with("ORIG_PATH_INFO", "/fallback");
        assert_eq!(uri_hints(&server).path.as_deref(), Some("/fallback"));
    }

    #[test]
    fn test_query_applied_when_present() {
        let server = ServerParams::new().with("QUERY_STRING", "");
        assert_eq!(uri_hints(&server).query.as_deref(), Some(""));
        let server = ServerParams::new().with("QUERY_STRING", Value::Null);
        assert_eq!(uri_hints(&server).query, None);
    }

    #[test]
    fn test_header_candidates() {
        let headers = header_candidates(&server());
        assert_eq!(header(&headers, "Host"), Some("example.com"));
        assert_eq!(header(&headers, "Cache-Control"), Some("max-age=0"));
        assert_eq!(header(&headers, "X-Forwarded-Proto"), Some("https"));
        assert_eq!(header(&headers, "Content-Type"), Some("text/html; charset=UTF-8"));
        assert_eq!(headers.len(), 4);

        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Host", "Cache-Control", "X-Forwarded-Proto", "Content-Type"]);
    }

    #[test]
    fn test_header_candidates_empty_server() {
        assert!(header_candidates(&ServerParams::new()).is_empty());
    }

    #[test]
    fn test_redirect_shadowing() {
        let server = ServerParams::new()
            .with("REDIRECT_HTTP_HOST", "shadowed.example.com")
            .with("HTTP_HOST", "example.com")
            .with("REDIRECT_STATUS", "200")
            .with("REDIRECT_HTTP_AUTHORIZATION", "Bearer token");
        let headers = header_candidates(&server);
        assert_eq!(header(&headers, "Host"), Some("example.com"));
        assert_eq!(header(&headers, "Authorization"), Some("Bearer token"));
        assert!(header(&headers, "Status").is_none());
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_blank_and_non_scalar_values_skipped() {
        let server = ServerParams::new()
            .with("HTTP_ACCEPT", "")
            .with("HTTP_X_NULL", Value::Null)
            .with("HTTP_X_LIST", gale_message::Array::list(["a"]))
            .with("CONTENT_LENGTH", 42);
        let headers = header_candidates(&server);
        assert_eq!(headers.len(), 1);
        assert_eq!(header(&headers, "Content-Length"), Some("42"));
    }

    #[test]
    fn test_duplicate_canonical_name_keeps_position() {
        let server = ServerParams::new()
            .with("HTTP_CONTENT_TYPE", "text/plain")
            .with("HTTP_ACCEPT", "*/*")
            .with("CONTENT_TYPE", "application/json");
        let headers = header_candidates(&server);
        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Content-Type", "Accept"]);
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_classify_is_deterministic() {
        assert_eq!(classify(&server()), classify(&server()));
    }
}
