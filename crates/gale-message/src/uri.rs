//! URI value type
//!
//! Immutable, component-wise URI following RFC 3986. Every `with_*` returns a
//! new value. Standard ports (80 for http, 443 for https) are kept but never
//! reported or serialized.

use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use std::str::FromStr;

/// Characters escaped in the path
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'#')
    .add(b'?');

/// Characters escaped in the query and fragment
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'#');

/// Default port of a scheme
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// URI value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Uri {
    scheme: String,
    user_info: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    /// The empty URI
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> UriBuilder {
        UriBuilder::default()
    }

    /// Parse a URI reference (absolute or relative)
    pub fn parse(input: &str) -> Result<Self> {
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (input, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        let (scheme, rest) = match rest.find(':') {
            Some(i) if is_scheme(&rest[..i]) => (Some(&rest[..i]), &rest[i + 1..]),
            _ => (None, rest),
        };

        let mut builder = UriBuilder::default();
        let path = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                let authority = &after[..end];
                let host_port = match authority.rsplit_once('@') {
                    Some((user_info, host_port)) => {
                        builder = builder.user_info(user_info);
                        host_port
                    }
                    None => authority,
                };
                let (host, port) = split_authority_port(host_port)?;
                builder = builder.host(host);
                if let Some(port) = port {
                    builder = builder.port(port);
                }
                &after[end..]
            }
            None => rest,
        };

        if let Some(scheme) = scheme {
            builder = builder.scheme(scheme);
        }
        builder = builder.path(path);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(fragment) = fragment {
            builder = builder.fragment(fragment);
        }
        builder.build()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, or `None` when absent or standard for the scheme
    pub fn port(&self) -> Option<u16> {
        self.port.filter(|port| Some(*port) != default_port(&self.scheme))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// `[user-info@]host[:port]`, empty when there is no host
    pub fn authority(&self) -> String {
        if self.host.is_empty() {
            return String::new();
        }
        let mut authority = String::new();
        if !self.user_info.is_empty() {
            authority.push_str(&self.user_info);
            authority.push('@');
        }
        authority.push_str(&self.host);
        if let Some(port) = self.port() {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    }

    /// Value for a `Host` header: `host[:port]` with non-standard ports only
    pub fn host_header(&self) -> Option<String> {
        if self.host.is_empty() {
            return None;
        }
        Some(match self.port() {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        })
    }

    pub fn with_scheme(&self, scheme: &str) -> Result<Self> {
        let mut uri = self.clone();
        uri.scheme = normalize_scheme(scheme)?;
        Ok(uri)
    }

    pub fn with_user_info(&self, user: &str, password: Option<&str>) -> Self {
        let mut uri = self.clone();
        uri.user_info = match password {
            Some(password) if !user.is_empty() => format!("{}:{}", user, password),
            _ => user.to_string(),
        };
        uri
    }

    pub fn with_host(&self, host: &str) -> Result<Self> {
        let mut uri = self.clone();
        uri.host = normalize_host(host)?;
        Ok(uri)
    }

    pub fn with_port(&self, port: Option<u16>) -> Result<Self> {
        let mut uri = self.clone();
        uri.port = port.map(validate_port).transpose()?;
        Ok(uri)
    }

    pub fn with_path(&self, path: &str) -> Self {
        let mut uri = self.clone();
        uri.path = encode_path(path);
        uri
    }

    pub fn with_query(&self, query: &str) -> Self {
        let mut uri = self.clone();
        uri.query = encode_query(query);
        uri
    }

    pub fn with_fragment(&self, fragment: &str) -> Self {
        let mut uri = self.clone();
        uri.fragment = encode_query(fragment);
        uri
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        let authority = self.authority();
        if !authority.is_empty() {
            write!(f, "//{}", authority)?;
        }
        if !self.path.is_empty() {
            if !authority.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
                f.write_str(&self.path)?;
            } else if authority.is_empty() && self.path.starts_with("//") {
                f.write_str("/")?;
                f.write_str(self.path.trim_start_matches('/'))?;
            } else {
                f.write_str(&self.path)?;
            }
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uri::parse(s)
    }
}

/// Component-wise URI construction
///
/// Components that are never set keep the empty defaults of [`Uri::new`].
#[derive(Debug, Clone, Default)]
pub struct UriBuilder {
    scheme: Option<String>,
    user_info: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl UriBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn user_info(mut self, user_info: impl Into<String>) -> Self {
        self.user_info = Some(user_info.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Validate and assemble the URI
    pub fn build(self) -> Result<Uri> {
        let mut uri = Uri::new();
        if let Some(scheme) = self.scheme {
            uri.scheme = normalize_scheme(&scheme)?;
        }
        if let Some(user_info) = self.user_info {
            uri.user_info = user_info;
        }
        if let Some(host) = self.host {
            uri.host = normalize_host(&host)?;
        }
        if let Some(port) = self.port {
            uri.port = Some(validate_port(port)?);
        }
        if let Some(path) = self.path {
            uri.path = encode_path(&path);
        }
        if let Some(query) = self.query {
            uri.query = encode_query(&query);
        }
        if let Some(fragment) = self.fragment {
            uri.fragment = encode_query(&fragment);
        }
        Ok(uri)
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn normalize_scheme(scheme: &str) -> Result<String> {
    let scheme = scheme.trim_end_matches("://").trim_end_matches(':');
    if scheme.is_empty() || is_scheme(scheme) {
        Ok(scheme.to_ascii_lowercase())
    } else {
        Err(Error::InvalidUri(format!("invalid scheme {:?}", scheme)))
    }
}

/// Lower-cased host; `:` is only allowed inside an IP literal (`[...]`)
fn normalize_host(host: &str) -> Result<String> {
    let ip_literal = host.len() > 2 && host.starts_with('[') && host.ends_with(']');
    let bare = if ip_literal { &host[1..host.len() - 1] } else { host };
    if bare.chars().any(|c| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '/' | '?' | '#' | '@' | '[' | ']')
            || (c == ':' && !ip_literal)
    }) {
        return Err(Error::InvalidUri(format!("invalid host {:?}", host)));
    }
    Ok(host.to_ascii_lowercase())
}

fn validate_port(port: u16) -> Result<u16> {
    if port == 0 {
        return Err(Error::InvalidUri("port 0 is out of range".to_string()));
    }
    Ok(port)
}

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

fn encode_query(query: &str) -> String {
    utf8_percent_encode(query, QUERY).to_string()
}

/// Split `host[:port]` from a parsed authority
fn split_authority_port(host_port: &str) -> Result<(&str, Option<u16>)> {
    let port_start = if host_port.starts_with('[') {
        host_port.find(']').map(|end| end + 1)
    } else {
        host_port.find(':')
    };
    let Some(start) = port_start.filter(|&i| i < host_port.len()) else {
        return Ok((host_port, None));
    };
    let (host, rest) = host_port.split_at(start);
    let Some(port) = rest.strip_prefix(':') else {
        return Err(Error::InvalidUri(format!("invalid authority {:?}", host_port)));
    };
    if port.is_empty() {
        return Ok((host, None));
    }
    port.parse::<u16>()
        .map(|port| (host, Some(port)))
        .map_err(|_| Error::InvalidUri(format!("invalid port {:?}", port)))
}
