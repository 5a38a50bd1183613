//! Server request assembly
//!
//! [`ServerRequestCreator`] runs the whole pipeline: classification, URI
//! assembly, header normalization and upload-tree building, then wraps the
//! result with cookies, query params, parsed body and the body stream.

use crate::normalizer::{SapiNormalizer, ServerNormalizer};
use crate::upload::{create_from_globals, FileInput};
use gale_message::{
    Array, Body, BodySource, Headers, Key, Request, Result, ServerParams, ServerRequest,
    ServerRequestParts,
};
use std::sync::Arc;

/// Explicit per-request inputs
#[derive(Debug, Clone, Default)]
pub struct Globals {
    /// Server variables
    pub server: ServerParams,
    /// Upload descriptors keyed by field name
    pub files: Vec<(Key, FileInput)>,
    /// Cookie params
    pub cookies: Array,
    /// Query params
    pub query: Array,
    /// Parsed form body
    pub post: Array,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment as server variables
    pub fn from_env() -> Self {
        let server = std::env::vars_os()
            .map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self {
            server,
            ..Default::default()
        }
    }

    pub fn server(mut self, server: ServerParams) -> Self {
        self.server = server;
        self
    }

    pub fn file(mut self, key: impl Into<Key>, input: impl Into<FileInput>) -> Self {
        self.files.push((key.into(), input.into()));
        self
    }

    pub fn cookies(mut self, cookies: Array) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn query(mut self, query: Array) -> Self {
        self.query = query;
        self
    }

    pub fn post(mut self, post: Array) -> Self {
        self.post = post;
        self
    }
}

/// Server request creator configuration
#[derive(Clone)]
pub struct ServerRequestCreator {
    /// Normalizer for server variables
    pub normalizer: Arc<dyn ServerNormalizer>,
    /// Where the request body is read from
    pub body_source: BodySource,
}

impl Default for ServerRequestCreator {
    fn default() -> Self {
        Self {
            normalizer: Arc::new(SapiNormalizer),
            body_source: BodySource::Stdin,
        }
    }
}

impl ServerRequestCreator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalizer(mut self, normalizer: impl ServerNormalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn body_source(mut self, source: BodySource) -> Self {
        self.body_source = source;
        self
    }

    /// Request for the running CGI process: environment variables as server
    /// params, stdin as body
    pub fn from_env() -> Result<ServerRequest> {
        Self::default().create(Globals::from_env())
    }

    /// Assemble a server request from explicit inputs
    ///
    /// The body source is not opened here.
    pub fn create(&self, globals: Globals) -> Result<ServerRequest> {
        let Globals {
            server,
            files,
            cookies,
            query,
            post,
        } = globals;

        let uploaded_files = create_from_globals(files)?;
        let method = self.normalizer.normalize_method(&server);
        let uri = self.normalizer.normalize_uri(&server)?;
        let headers = Headers::from_pairs(
            self.normalizer
                .normalize_headers(&server)
                .into_iter()
                .map(|h| (h.name, h.value)),
        )?;
        let protocol_version = self.normalizer.normalize_protocol_version(&server);
        let body = Body::new(self.body_source.clone());

        let request = Request::new(&method, uri, body, headers, &protocol_version)?;
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            headers = request.headers().len(),
            files = uploaded_files.file_count(),
            "server request assembled"
        );

        Ok(ServerRequest::from_parts(
            request,
            ServerRequestParts {
                server_params: server,
                cookie_params: cookies,
                query_params: query,
                parsed_body: Some(post),
                uploaded_files,
            },
        ))
    }
}
