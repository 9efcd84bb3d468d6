//! Line parser: turns a preprocessed document into sections and items.
//!
//! Recognized lines, checked in this order:
//!
//! - `#include <path>`: loads another document into the same context, then
//!   switches back to the global section.
//! - `#@function <name>`: applies the named annotation function to the
//!   key=value line immediately below.
//! - `# comment` and blank lines.
//! - `[section]`: switches the current section; `[]` is the global section.
//! - `name = value`: one item, split at the first `=`.
//!
//! Anything else is ignored.

use crate::context::{truncate, IniContext, Item, Section, ITEM_NAME_MAX};
use crate::loader::{resolve_include, Loader};
use crate::Error;

const INCLUDE_TAG: &str = "include";
const FUNCTION_TAG: &str = "@function";

/// Returns the text after `#<tag><blank>` when `line` starts with it.
/// The tag is matched case-insensitively.
fn directive_argument<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('#')?;
    if !rest.get(..tag.len())?.eq_ignore_ascii_case(tag) {
        return None;
    }
    let rest = &rest[tag.len()..];
    rest.starts_with([' ', '\t']).then(|| &rest[1..])
}

fn discard(annotation: Option<String>) {
    if let Some(function) = annotation {
        tracing::warn!(
            function = %function,
            "the @function annotation line must be followed by a key=value line"
        );
    }
}

/// Parses `content` into `ctx`, starting in the global section.
pub(crate) fn parse_into(
    loader: &Loader,
    ctx: &mut IniContext,
    content: &str,
    depth: usize,
) -> Result<(), Error> {
    let mut current: Option<String> = None;
    let mut pending: Option<String> = None;

    for line in content.split('\n') {
        let annotation = pending.take();

        if let Some(target) = directive_argument(line, INCLUDE_TAG) {
            discard(annotation);
            let location = resolve_include(target.trim(), ctx.base_dir(), line)?;
            tracing::debug!(%location, depth = depth + 1, "including");
            loader.load_location(ctx, &location, depth + 1)?;
            current = None;
            continue;
        }

        if let Some(function) = directive_argument(line, FUNCTION_TAG) {
            discard(annotation);
            if ctx.annotations_enabled() {
                let function = truncate(function, ITEM_NAME_MAX).trim();
                if function.is_empty() {
                    tracing::warn!("the function name of annotation line is empty");
                } else {
                    pending = Some(function.to_string());
                }
            }
            continue;
        }

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            discard(annotation);
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            discard(annotation);
            let name = inner.trim();
            current = if name.is_empty() {
                None
            } else {
                ctx.section_mut(Some(name));
                Some(name.to_string())
            };
            continue;
        }

        let Some((raw_name, raw_value)) = line.split_once('=') else {
            discard(annotation);
            continue;
        };

        let item = Item::new(raw_name, raw_value);
        let section = ctx.section_mut(current.as_deref());
        match annotation {
            None => section.push(item),
            Some(function) => push_annotated(loader, section, item, &function),
        }
    }

    discard(pending);
    Ok(())
}

/// Appends one item per value produced by `function`, or `item` itself when
/// the function is unavailable or produces nothing.
fn push_annotated(loader: &Loader, section: &mut Section, item: Item, function: &str) {
    let Some(registry) = loader.annotations() else {
        tracing::warn!(
            item = item.name(),
            value = item.value(),
            "no annotation functions installed, keeping the item value"
        );
        section.push(item);
        return;
    };

    match registry.expand(function, item.value()) {
        None => {
            tracing::warn!(
                function,
                item = item.name(),
                value = item.value(),
                "annotation function not found, keeping the item value"
            );
            section.push(item);
        }
        Some(values) if values.is_empty() => {
            tracing::warn!(
                function,
                item = item.name(),
                value = item.value(),
                "annotation function produced no values, keeping the item value"
            );
            section.push(item);
        }
        Some(values) => {
            for value in &values {
                section.push(item.with_value(value));
            }
        }
    }
}
