//! Directive preprocessing.
//!
//! Raw text goes through two passes before line parsing: `#@if` resolution,
//! then `#@for` expansion. Each pass rewrites one block at a time and is
//! re-run on its own output until nothing changes. Every rewrite is a fresh
//! buffer owned by the context's [`ScratchArena`].

mod arena;
mod condition;
mod repeat;

use std::borrow::Cow;
use std::collections::TryReserveError;
use std::sync::Arc;

use thiserror::Error;

use crate::host::HostIdentity;

pub use arena::ScratchArena;
pub use condition::{resolve_if, MAX_CONDITION_VALUES};
pub use repeat::{expand_for, ForRange, MAX_FOR_IDENTIFIER};

/// Hard failures raised while expanding directives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DirectiveError {
    #[error("invalid for range: {range}")]
    InvalidForRange { range: String },

    #[error("invalid step: {step} for range: {range}")]
    InvalidStep { step: i64, range: String },

    #[error("failed to allocate {bytes} bytes for expanded content: {source}")]
    Allocation {
        bytes: usize,
        source: TryReserveError,
    },
}

pub(crate) fn buffer_with_capacity(bytes: usize) -> Result<String, DirectiveError> {
    let mut buffer = String::new();
    buffer
        .try_reserve_exact(bytes)
        .map_err(|source| DirectiveError::Allocation { bytes, source })?;
    Ok(buffer)
}

/// Runs `#@if` resolution and then `#@for` expansion, each to a fixed point.
pub fn preprocess(
    content: Arc<str>,
    arena: &mut ScratchArena,
    host: &dyn HostIdentity,
) -> Result<Arc<str>, DirectiveError> {
    let mut current = content;

    let mut passes = 0usize;
    loop {
        let resolved = match resolve_if(&current, host)? {
            Cow::Borrowed(_) => break,
            Cow::Owned(resolved) => resolved,
        };
        current = arena.alloc(resolved)?;
        passes += 1;
    }
    tracing::trace!(passes, "if blocks resolved");

    let mut passes = 0usize;
    loop {
        let expanded = match expand_for(&current)? {
            Cow::Borrowed(_) => break,
            Cow::Owned(expanded) => expanded,
        };
        current = arena.alloc(expanded)?;
        passes += 1;
    }
    tracing::trace!(passes, "for blocks expanded");

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;

    fn run(content: &str, host: &StaticHost) -> (String, ScratchArena) {
        let mut arena = ScratchArena::new();
        let out = preprocess(Arc::from(content), &mut arena, host).unwrap();
        (out.to_string(), arena)
    }

    #[test]
    fn test_plain_text_allocates_nothing() {
        let (out, arena) = run("a=1\nb=2\n", &StaticHost::new("h"));
        assert_eq!(out, "a=1\nb=2\n");
        assert!(arena.is_empty());
    }

    #[test]
    fn test_nested_if_blocks_reach_fixed_point() {
        let content = "\
#@if %{LOCAL_HOST} in [h]
outer=1
#@if %{LOCAL_HOST} in [h]
inner=1
#@endif
#@endif
tail=1
";
        let (out, arena) = run(content, &StaticHost::new("h"));
        assert!(!out.contains("#@"));
        assert!(out.contains("outer=1"));
        assert!(out.contains("inner=1"));
        assert!(out.contains("tail=1"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_sequential_blocks_each_allocate() {
        let content = "\
#@if %{LOCAL_HOST} in [other]
a=1
#@else
a=2
#@endif
#@for i from 1 to 2
b={$i}
#@endfor
#@for j from 3 to 4
c={$j}
#@endfor
";
        let (out, arena) = run(content, &StaticHost::new("h"));
        let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["a=2", "b=1", "b=2", "c=3", "c=4"]);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_if_runs_before_for() {
        let content = "\
#@for i from 1 to 2
#@if %{LOCAL_HOST} in [h]
x={$i}
#@endif
#@endfor
";
        let (out, _) = run(content, &StaticHost::new("h"));
        let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["x=1", "x=2"]);
    }

    #[test]
    fn test_for_error_propagates() {
        let mut arena = ScratchArena::new();
        let result = preprocess(
            Arc::from("#@for i from 1 to 3 step 0\nx\n#@endfor\n"),
            &mut arena,
            &StaticHost::new("h"),
        );
        assert!(matches!(result, Err(DirectiveError::InvalidStep { .. })));
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let result = buffer_with_capacity(usize::MAX);
        assert!(matches!(result, Err(DirectiveError::Allocation { .. })));
    }
}
