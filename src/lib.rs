//! INI configuration with preprocessing directives.
//!
//! On top of plain `[section]` / `name = value` files this crate understands:
//!
//! - `#include <path>` to pull in another local or remote file,
//! - `#@if %{LOCAL_HOST} in [a, b]` / `#@else` / `#@endif` (and the same with
//!   `%{LOCAL_IP}`) to keep text only on matching hosts,
//! - `#@for i from 1 to 8 step 1` / `#@endfor` to repeat text with `{$i}`
//!   replaced by each value,
//! - `#@function <name>` to expand the next item's value into several values
//!   through an [`AnnotationRegistry`].
//!
//! Keys may repeat; [`IniContext::get_values`] returns every value.
//!
//! ```
//! let ctx = ini_directives::load_str(
//!     "#@for i from 1 to 3\nnode = 10.0.0.{$i}\n#@endfor\n[log]\nlevel = debug\n",
//! )?;
//!
//! assert_eq!(ctx.get_values("", "node", 8).len(), 3);
//! assert_eq!(ctx.get_str("log", "level"), Some("debug"));
//! # Ok::<(), ini_directives::Error>(())
//! ```

pub mod annotation;
pub mod context;
mod error;
pub mod host;
pub mod loader;
mod parser;
pub mod preprocess;

use std::path::Path;

pub use annotation::{Annotation, AnnotationRegistry, MAX_ANNOTATION_VALUES};
pub use context::{IniContext, Item, Section, SectionView};
pub use error::Error;
pub use host::{HostIdentity, StaticHost, SystemHost};
pub use loader::{FetchResponse, Loader, RemoteFetcher};

/// Loads a file with default settings and annotations enabled.
pub fn load_file(path: impl AsRef<Path>) -> Result<IniContext, Error> {
    Loader::builder().load_file(path)
}

/// Loads a file, honoring `#@function` lines only when `annotations_enabled`.
pub fn load_file_ex(path: impl AsRef<Path>, annotations_enabled: bool) -> Result<IniContext, Error> {
    Loader::builder()
        .ignore_annotations(!annotations_enabled)
        .load_file(path)
}

/// Loads an in-memory document with default settings.
pub fn load_str(content: &str) -> Result<IniContext, Error> {
    Loader::builder().load_str(content)
}
