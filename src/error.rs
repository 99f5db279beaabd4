//! Error types for the render pipeline.
//!
//! Startup failures are fatal and stop the process before it binds a socket.
//! Everything raised between building an application instance and composing
//! the final document is a [`RenderError`], which bubbles up to the HTTP front
//! door untouched.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading process-scoped state at startup.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The template or manifest file could not be read.
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset manifest is not the expected JSON shape.
    #[error("invalid asset manifest {path}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The template is missing a required marker or repeats one.
    #[error("invalid template: {0}")]
    Template(String),

    /// The static route table did not compile.
    #[error("invalid route table")]
    Routes(#[from] ResolveError),

    /// The Data API client could not be constructed.
    #[error("failed to build Data API client")]
    Client(#[from] reqwest::Error),
}

/// Failure talking to the upstream Data API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or protocol failure.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status.
    #[error("request to {url} returned {status}")]
    Status { url: String, status: u16 },

    /// The body was not valid JSON.
    #[error("invalid JSON from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The URL could not be joined onto the API base.
    #[error("invalid Data API url")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    /// True when the upstream explicitly reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Failure while compiling or resolving routes.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("route '{name}' has an invalid pattern '{pattern}'")]
    Pattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unbalanced parameter constraint in pattern '{0}'")]
    Unbalanced(String),

    #[error("too many redirects while resolving {0}")]
    RedirectLoop(String),

    #[error("no route matched {0} and no catch-all route is registered")]
    Unmatched(String),
}

/// Any failure inside the render pipeline.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("data fetch failed")]
    Fetch(#[from] FetchError),

    /// Fetched data did not have the shape the view expects.
    #[error("unexpected payload for query {query}")]
    Payload {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    /// The instance was rendered before a route was resolved.
    #[error("application instance has no resolved view")]
    NotResolved,

    #[error("failed to serialize hydration state")]
    Serialize(#[from] serde_json::Error),
}

/// Renders the full cause chain of an error on one line.
///
/// Display strings above never repeat their source, so walking the chain
/// does not duplicate text.
pub fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
