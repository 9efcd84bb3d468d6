use std::path::PathBuf;

use thiserror::Error;

use crate::preprocess::DirectiveError;

/// Top-level error type for loading an INI context.
///
/// Every variant is a hard failure: the load is abandoned and no context is
/// returned. Soft failures (malformed `#@if` conditions, unknown annotation
/// functions) are logged and never surface here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("preprocessing failed: {0}")]
    Directive(#[from] DirectiveError),

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("include file \"{path}\" not exists, line: \"{line}\"")]
    IncludeNotFound { path: PathBuf, line: String },

    #[error("include nesting exceeds {0} levels")]
    IncludeDepthExceeded(usize),

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("the path of the config file is too long: {0}")]
    PathTooLong(PathBuf),

    #[error("failed to resolve working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("no remote fetcher configured for url: {0}")]
    NoFetcher(String),

    #[error("failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP status code: {status} != 200, url: {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to deserialize section '{section}': {source}")]
    Deserialize {
        section: String,
        source: toml::de::Error,
    },
}
