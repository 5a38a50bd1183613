//! Server-side request value
//!
//! A [`Request`] together with what the server knows about it: server
//! variables, cookies, query params, parsed body, uploaded files and
//! application attributes.

use crate::value::{Array, Key, ServerParams, Value};
use crate::{Body, FileTree, Headers, Method, Request, Result, Uri};

/// Parts of a server request besides the request itself
#[derive(Debug, Clone, Default)]
pub struct ServerRequestParts {
    pub server_params: ServerParams,
    pub cookie_params: Array,
    pub query_params: Array,
    pub parsed_body: Option<Array>,
    pub uploaded_files: FileTree,
}

/// Server request
#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    request: Request,
    server_params: ServerParams,
    cookie_params: Array,
    query_params: Array,
    parsed_body: Option<Array>,
    uploaded_files: FileTree,
    attributes: Array,
}

impl ServerRequest {
    /// Request with server params and empty everything else
    pub fn new(request: Request, server_params: ServerParams) -> Self {
        Self::from_parts(
            request,
            ServerRequestParts {
                server_params,
                ..Default::default()
            },
        )
    }

    pub fn from_parts(request: Request, parts: ServerRequestParts) -> Self {
        Self {
            request,
            server_params: parts.server_params,
            cookie_params: parts.cookie_params,
            query_params: parts.query_params,
            parsed_body: parts.parsed_body,
            uploaded_files: parts.uploaded_files,
            attributes: Array::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn headers(&self) -> &Headers {
        self.request.headers()
    }

    pub fn header(&self, name: &str) -> &[String] {
        self.request.header(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.request.header_line(name)
    }

    pub fn protocol_version(&self) -> &str {
        self.request.protocol_version()
    }

    pub fn body(&self) -> &Body {
        self.request.body()
    }

    pub fn server_params(&self) -> &ServerParams {
        &self.server_params
    }

    pub fn cookie_params(&self) -> &Array {
        &self.cookie_params
    }

    pub fn query_params(&self) -> &Array {
        &self.query_params
    }

    /// Parsed body; `None` when none was provided
    pub fn parsed_body(&self) -> Option<&Array> {
        self.parsed_body.as_ref()
    }

    pub fn uploaded_files(&self) -> &FileTree {
        &self.uploaded_files
    }

    pub fn attributes(&self) -> &Array {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.attribute(name).unwrap_or(default)
    }

    /// Copy with the underlying request replaced
    pub fn with_request(&self, request: Request) -> Self {
        let mut server_request = self.clone();
        server_request.request = request;
        server_request
    }

    pub fn with_method(&self, method: &str) -> Result<Self> {
        Ok(self.with_request(self.request.with_method(method)?))
    }

    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        self.with_request(self.request.with_uri(uri, preserve_host))
    }

    pub fn with_header<I, V>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        Ok(self.with_request(self.request.with_header(name, values)?))
    }

    pub fn with_body(&self, body: Body) -> Self {
        self.with_request(self.request.with_body(body))
    }

    pub fn with_cookie_params(&self, cookies: Array) -> Self {
        let mut request = self.clone();
        request.cookie_params = cookies;
        request
    }

    pub fn with_query_params(&self, query: Array) -> Self {
        let mut request = self.clone();
        request.query_params = query;
        request
    }

    pub fn with_parsed_body(&self, parsed_body: Option<Array>) -> Self {
        let mut request = self.clone();
        request.parsed_body = parsed_body;
        request
    }

    pub fn with_uploaded_files(&self, files: FileTree) -> Self {
        let mut request = self.clone();
        request.uploaded_files = files;
        request
    }

    pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
        let mut request = self.clone();
        request.attributes.insert(name, value);
        request
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        let mut request = self.clone();
        request.attributes.remove(Key::from(name));
        request
    }
}
