//! Server normalizer
//!
//! The [`ServerNormalizer`] trait is the seam between raw server variables and
//! request construction. [`SapiNormalizer`] implements it for CGI/SAPI
//! variable conventions.

use crate::classifier::{self, HeaderCandidate};
use crate::uri::assemble_uri;
use gale_message::{Result, ServerParams, Uri};

/// Turns server variables into request components
pub trait ServerNormalizer: Send + Sync {
    /// Request method
    fn normalize_method(&self, server: &ServerParams) -> String;

    /// Protocol version without the `HTTP/` prefix
    fn normalize_protocol_version(&self, server: &ServerParams) -> String;

    /// Request URI
    fn normalize_uri(&self, server: &ServerParams) -> Result<Uri>;

    /// Headers as ordered `(name, value)` pairs
    fn normalize_headers(&self, server: &ServerParams) -> Vec<HeaderCandidate>;
}

/// Normalizer for CGI/SAPI server variables
#[derive(Debug, Clone, Copy, Default)]
pub struct SapiNormalizer;

impl SapiNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl ServerNormalizer for SapiNormalizer {
    fn normalize_method(&self, server: &ServerParams) -> String {
        classifier::method(server)
    }

    fn normalize_protocol_version(&self, server: &ServerParams) -> String {
        classifier::protocol_version(server)
    }

    fn normalize_uri(&self, server: &ServerParams) -> Result<Uri> {
        assemble_uri(&classifier::uri_hints(server))
    }

    fn normalize_headers(&self, server: &ServerParams) -> Vec<HeaderCandidate> {
        classifier::header_candidates(server)
    }
}
