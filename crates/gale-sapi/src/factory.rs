//! Minimal request factories
//!
//! Direct construction without server-variable normalization.

use gale_message::{
    Body, Headers, Request, Result, ServerParams, ServerRequest, ServerRequestParts, Uri,
};

/// Anything a factory accepts as a request URI
pub trait IntoUri {
    fn into_uri(self) -> Result<Uri>;
}

impl IntoUri for Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self)
    }
}

impl IntoUri for &Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self.clone())
    }
}

impl IntoUri for &str {
    fn into_uri(self) -> Result<Uri> {
        Uri::parse(self)
    }
}

impl IntoUri for String {
    fn into_uri(self) -> Result<Uri> {
        Uri::parse(&self)
    }
}

/// Factory for client-side style requests
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFactory;

impl RequestFactory {
    /// Request with every component given
    pub fn create(
        method: &str,
        uri: impl IntoUri,
        body: Body,
        headers: Headers,
        protocol_version: &str,
    ) -> Result<Request> {
        Request::new(method, uri.into_uri()?, body, headers, protocol_version)
    }

    /// Request with an empty body, no headers and protocol `1.1`
    pub fn create_request(&self, method: &str, uri: impl IntoUri) -> Result<Request> {
        Self::create(method, uri, Body::empty(), Headers::new(), "1.1")
    }
}

/// Factory for server requests built from explicit parts
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerRequestFactory;

impl ServerRequestFactory {
    /// Server request with only method, URI and server params set
    ///
    /// Cookies, query params and uploaded files are empty, the parsed body is
    /// absent and the body stream is empty.
    pub fn create_server_request(
        &self,
        method: &str,
        uri: impl IntoUri,
        server_params: ServerParams,
    ) -> Result<ServerRequest> {
        let request = RequestFactory.create_request(method, uri)?;
        Ok(ServerRequest::from_parts(
            request,
            ServerRequestParts {
                server_params,
                parsed_body: None,
                ..Default::default()
            },
        ))
    }
}
