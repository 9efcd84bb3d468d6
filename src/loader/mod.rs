//! Load entry points, path resolution and document retrieval.

mod builder;
mod file;
mod source;

pub use builder::Loader;
pub use file::MAX_PATH_LEN;
#[cfg(feature = "http")]
pub use source::HttpFetcher;
pub use source::{is_remote, FetchError, FetchResponse, RemoteFetcher};

pub(crate) use file::resolve_include;
