//! gale-message: Immutable HTTP message values
//!
//! Value types shared by the gale request pipeline. Every mutator returns a
//! new value; nothing is modified in place.
//!
//! ## Types
//! - [`Request`] / [`ServerRequest`] - client and server-side requests
//! - [`Uri`] / [`UriBuilder`] - RFC 3986 URI with standard-port suppression
//! - [`Headers`] - ordered, case-insensitive header collection
//! - [`Body`] - lazily opened, read-once body stream
//! - [`UploadedFile`] / [`FileTree`] - uploaded files, nested to any depth
//! - [`Value`] / [`Array`] / [`ServerParams`] - loosely typed input data

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod body;
pub mod error;
pub mod headers;
pub mod request;
pub mod server_request;
pub mod uploaded_file;
pub mod uri;
pub mod value;

// Re-exports
pub use body::{Body, BodySource};
pub use error::{Error, Result};
pub use headers::Headers;
pub use request::{parse_method, validate_protocol_version, Method, Request};
pub use server_request::{ServerRequest, ServerRequestParts};
pub use uploaded_file::{FileNode, FileSource, FileTree, UploadError, UploadedFile};
pub use uri::{default_port, Uri, UriBuilder};
pub use value::{Array, Key, ServerParams, Value};
