//! gale-sapi: Server requests from CGI/SAPI server variables
//!
//! Turns the loosely structured inputs a CGI-style server hands to a script
//! (server variables, upload descriptors, cookies, query and form params)
//! into immutable [`ServerRequest`] values.
//!
//! ## Example
//!
//! ```
//! use gale_sapi::{Globals, ServerParams, ServerRequestCreator, BodySource};
//!
//! let server = ServerParams::new()
//!     .with("REQUEST_METHOD", "POST")
//!     .with("HTTP_HOST", "example.com")
//!     .with("REQUEST_URI", "/submit?draft=1")
//!     .with("QUERY_STRING", "draft=1");
//!
//! let request = ServerRequestCreator::new()
//!     .body_source(BodySource::Empty)
//!     .create(Globals::new().server(server))
//!     .unwrap();
//!
//! assert_eq!(request.method().as_str(), "POST");
//! assert_eq!(request.uri().to_string(), "//example.com/submit?draft=1");
//! assert_eq!(request.header_line("host"), "example.com");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod classifier;
pub mod creator;
pub mod factory;
pub mod header_name;
pub mod normalizer;
pub mod upload;
pub mod uri;

// Re-exports
pub use classifier::{split_host_port, Classification, HeaderCandidate, UriHints};
pub use creator::{Globals, ServerRequestCreator};
pub use factory::{IntoUri, RequestFactory, ServerRequestFactory};
pub use header_name::normalize_header_name;
pub use normalizer::{SapiNormalizer, ServerNormalizer};
pub use upload::{create, create_from_array, create_from_globals, FileInput};
pub use uri::assemble_uri;

pub use gale_message::{
    Array, Body, BodySource, Error, FileNode, FileTree, Headers, Key, Method, Request, Result,
    ServerParams, ServerRequest, UploadError, UploadedFile, Uri, Value,
};
