//! HTTP Request value

use crate::{Body, Error, Headers, Result, Uri};
pub use http::Method;

/// Parse a method token, keeping its case
pub fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidMethod(method.to_string()))
}

/// Validate an HTTP protocol version (`1.0`, `1.1`, `2`, ...)
pub fn validate_protocol_version(version: &str) -> Result<()> {
    let valid = match version.as_bytes() {
        [major] => major.is_ascii_digit(),
        [major, b'.', minor] => major.is_ascii_digit() && minor.is_ascii_digit(),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidProtocolVersion(version.to_string()))
    }
}

/// HTTP Request
///
/// Immutable: every `with_*` returns a new request. Clones share the body
/// stream.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: Headers,
    protocol_version: String,
    body: Body,
    request_target: Option<String>,
}

impl Request {
    /// Create a request; a missing `Host` header is derived from the URI
    pub fn new(
        method: &str,
        uri: Uri,
        body: Body,
        headers: Headers,
        protocol_version: &str,
    ) -> Result<Self> {
        let method = parse_method(method)?;
        validate_protocol_version(protocol_version)?;
        let mut request = Self {
            method,
            uri,
            headers,
            protocol_version: protocol_version.to_string(),
            body,
            request_target: None,
        };
        if !request.headers.contains("host") {
            request.update_host_from_uri();
        }
        Ok(request)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Values of a header (case-insensitive)
    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name).unwrap_or(&[])
    }

    /// Values of a header joined with `", "`; empty when absent
    pub fn header_line(&self, name: &str) -> String {
        self.headers.line(name).unwrap_or_default()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Explicit target, else path and query of the URI, else `/`
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.request_target {
            return target.clone();
        }
        let mut target = self.uri.path().to_string();
        if target.is_empty() {
            target.push('/');
        }
        if !self.uri.query().is_empty() {
            target.push('?');
            target.push_str(self.uri.query());
        }
        target
    }

    pub fn with_request_target(&self, target: &str) -> Result<Self> {
        if target.is_empty() || target.chars().any(char::is_whitespace) {
            return Err(Error::InvalidRequestTarget(target.to_string()));
        }
        let mut request = self.clone();
        request.request_target = Some(target.to_string());
        Ok(request)
    }

    pub fn with_method(&self, method: &str) -> Result<Self> {
        let mut request = self.clone();
        request.method = parse_method(method)?;
        Ok(request)
    }

    /// Replace the URI; `Host` follows the new URI unless `preserve_host` is
    /// set and a `Host` header already exists
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut request = self.clone();
        request.uri = uri;
        if !preserve_host || !request.headers.contains("host") {
            request.update_host_from_uri();
        }
        request
    }

    pub fn with_protocol_version(&self, version: &str) -> Result<Self> {
        validate_protocol_version(version)?;
        let mut request = self.clone();
        request.protocol_version = version.to_string();
        Ok(request)
    }

    pub fn with_header<I, V>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut request = self.clone();
        request.headers = self.headers.with(name, values)?;
        Ok(request)
    }

    pub fn with_added_header<I, V>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut request = self.clone();
        request.headers = self.headers.with_added(name, values)?;
        Ok(request)
    }

    pub fn without_header(&self, name: &str) -> Self {
        let mut request = self.clone();
        request.headers = self.headers.without(name);
        request
    }

    pub fn with_body(&self, body: Body) -> Self {
        let mut request = self.clone();
        request.body = body;
        request
    }

    fn update_host_from_uri(&mut self) {
        if let Some(host) = self.uri.host_header() {
            self.headers.put_host_first(host);
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::new(),
            headers: Headers::new(),
            protocol_version: "1.1".to_string(),
            body: Body::empty(),
            request_target: None,
        }
    }
}
