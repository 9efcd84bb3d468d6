//! Scratch buffers produced by directive expansion.

use std::sync::Arc;

use super::DirectiveError;

/// Owned pool of the buffers written by `#@if` / `#@for` rewrites.
///
/// Buffers are never released one at a time. A later pass may still be
/// reading an earlier buffer, so the whole pool lives as long as the
/// [`IniContext`](crate::IniContext) that owns it and is released with it.
#[derive(Debug, Default)]
pub struct ScratchArena {
    buffers: Vec<Arc<str>>,
    bytes: usize,
}

impl ScratchArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a rewritten buffer and returns a shared handle to it.
    pub fn alloc(&mut self, content: String) -> Result<Arc<str>, DirectiveError> {
        self.buffers
            .try_reserve(1)
            .map_err(|source| DirectiveError::Allocation {
                bytes: std::mem::size_of::<Arc<str>>(),
                source,
            })?;

        let buffer: Arc<str> = Arc::from(content);
        self.bytes += buffer.len();
        self.buffers.push(Arc::clone(&buffer));
        Ok(buffer)
    }

    /// Number of buffers currently held.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Total bytes across all held buffers.
    pub fn total_bytes(&self) -> usize {
        self.bytes
    }

    /// Releases every buffer at once.
    pub fn release(&mut self) {
        self.buffers.clear();
        self.bytes = 0;
    }
}
