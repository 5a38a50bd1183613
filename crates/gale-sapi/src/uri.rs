//! URI assembly from classified hints

use crate::classifier::UriHints;
use gale_message::{Result, Uri, UriBuilder};

/// Build a URI from hints
///
/// Absent hints are not applied, so the builder defaults stay in place. Path
/// and query are applied as given when present, even if empty. User info and
/// fragment are never set.
pub fn assemble_uri(hints: &UriHints) -> Result<Uri> {
    let mut builder = UriBuilder::new();
    if let Some(scheme) = &hints.scheme {
        builder = builder.scheme(scheme.as_str());
    }
    if let Some(host) = &hints.host {
        builder = builder.host(host.as_str());
    }
    if let Some(port) = hints.port {
        builder = builder.port(port);
    }
    if let Some(path) = &hints.path {
        builder = builder.path(path.as_str());
    }
    if let Some(query) = &hints.query {
        builder = builder.query(query.as_str());
    }
    builder.build()
}
