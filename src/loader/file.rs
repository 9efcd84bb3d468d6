//! Path resolution and local file reading.

use std::fmt;
use std::path::{Path, PathBuf};

use super::source::is_remote;
use crate::Error;

/// Longest accepted base directory, in bytes.
pub const MAX_PATH_LEN: usize = 256;

/// Where a document's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    Local(PathBuf),
    Remote(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => f.write_str(url),
        }
    }
}

/// Resolves a top-level path and the base directory for its includes.
///
/// Remote documents have an empty base directory. Relative paths are
/// resolved against the working directory.
pub(crate) fn resolve_top_level(path: &Path) -> Result<(Location, PathBuf), Error> {
    let text = path.to_string_lossy();
    if is_remote(&text) {
        return Ok((Location::Remote(text.into_owned()), PathBuf::new()));
    }

    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(Error::CurrentDir)?.join(path)
    };
    let base_dir = full.parent().map(Path::to_path_buf).unwrap_or_default();
    check_length(&base_dir, path)?;

    Ok((Location::Local(full), base_dir))
}

/// Resolves the target of an `#include` line.
///
/// Local targets must exist; `line` is reported when they don't.
pub(crate) fn resolve_include(target: &str, base_dir: &Path, line: &str) -> Result<Location, Error> {
    if is_remote(target) {
        return Ok(Location::Remote(target.to_string()));
    }

    let path = Path::new(target);
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        check_length(base_dir, path)?;
        base_dir.join(path)
    };

    if !full.exists() {
        return Err(Error::IncludeNotFound {
            path: full,
            line: line.trim().to_string(),
        });
    }
    Ok(Location::Local(full))
}

pub(crate) fn check_length(base_dir: &Path, path: &Path) -> Result<(), Error> {
    if base_dir.as_os_str().len() > MAX_PATH_LEN {
        return Err(Error::PathTooLong(path.to_path_buf()));
    }
    Ok(())
}

/// Reads a local file. Invalid UTF-8 is replaced rather than rejected.
pub(crate) fn read_local(path: &Path) -> Result<String, Error> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(Error::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
