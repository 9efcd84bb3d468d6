//! `#@for` / `#@endfor` expansion.
//!
//! ```text
//! #@for i from 0 to 15 step 1
//! port_{$i}=80{$i}
//! #@endfor
//! ```
//!
//! Substitution is a plain substring replacement of `{$<id>}`. It does not
//! look at word boundaries, so the token of one loop must not appear inside
//! a longer token of another.

use std::borrow::Cow;

use super::{buffer_with_capacity, DirectiveError};

const FOR_TAG: &str = "#@for ";
const ENDFOR_TAG: &str = "#@endfor";

/// Longest accepted loop identifier, in bytes.
pub const MAX_FOR_IDENTIFIER: usize = 64;

/// Extra bytes reserved per iteration for the rendered loop value.
const ITERATION_SLACK: usize = 16;

const BLANKS: [char; 2] = [' ', '\t'];

/// A parsed `<id> from <start> to <end> [step <step>]` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForRange<'a> {
    pub id: &'a str,
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl<'a> ForRange<'a> {
    /// Parses a range header. Returns `None` on any syntax error.
    pub fn parse(text: &'a str) -> Option<Self> {
        let rest = text
            .trim_end_matches([' ', '\t', '\r'])
            .trim_start_matches(BLANKS);

        let id_len = rest.find(BLANKS).unwrap_or(rest.len());
        let id = &rest[..id_len];
        if id.is_empty() || id.len() > MAX_FOR_IDENTIFIER {
            return None;
        }

        let rest = keyword(&rest[id_len..], "from")?;
        let (start, rest) = integer(rest)?;
        let rest = keyword(rest, "to")?;
        let (end, rest) = integer(rest)?;
        if rest.is_empty() {
            return Some(Self {
                id,
                start,
                end,
                step: 1,
            });
        }

        let rest = keyword(rest, "step")?;
        let (step, rest) = integer(rest)?;
        if !rest.is_empty() {
            return None;
        }

        Some(Self {
            id,
            start,
            end,
            step,
        })
    }

    /// `(end - start) / step`, the number of steps after the first value.
    ///
    /// Negative when the step walks away from `end`.
    fn span(&self) -> Option<i64> {
        self.end.checked_sub(self.start)?.checked_div(self.step)
    }

    /// Every loop value from `start` to `end` inclusive.
    pub fn values(&self) -> impl Iterator<Item = i64> {
        let Self {
            start, end, step, ..
        } = *self;
        let mut next = (step != 0).then_some(start);
        std::iter::from_fn(move || {
            let current = next?;
            let in_range = if step > 0 {
                current <= end
            } else {
                current >= end
            };
            if !in_range {
                next = None;
                return None;
            }
            next = current.checked_add(step);
            Some(current)
        })
    }
}

/// Matches `<blank>+<word><blank>` and returns the text after the word.
fn keyword<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let trimmed = text.trim_start_matches(BLANKS);
    if trimmed.len() == text.len() {
        return None;
    }
    let rest = trimmed.strip_prefix(word)?;
    rest.starts_with(BLANKS).then_some(rest)
}

/// Reads an optionally signed decimal integer after optional blanks.
fn integer(text: &str) -> Option<(i64, &str)> {
    let trimmed = text.trim_start_matches(BLANKS);
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let number_len = trimmed.len() - unsigned.len() + digits;
    let value = trimmed[..number_len].parse().ok()?;
    Some((value, &trimmed[number_len..]))
}

/// Expands the first `#@for` block in `content`.
///
/// Returns `Cow::Borrowed(content)` when there is nothing left to expand: no
/// `#@for`, or a `#@for` without a terminating newline or `#@endfor`. A
/// malformed range header or a step that never reaches the end is an error.
pub fn expand_for(content: &str) -> Result<Cow<'_, str>, DirectiveError> {
    let Some(start) = content.find(FOR_TAG) else {
        return Ok(Cow::Borrowed(content));
    };
    let range_start = start + FOR_TAG.len();
    let Some(newline) = content[range_start..].find('\n') else {
        return Ok(Cow::Borrowed(content));
    };
    let body_start = range_start + newline;
    let range_text = &content[range_start..body_start];

    let Some(endfor) = content[body_start..].find(ENDFOR_TAG) else {
        return Ok(Cow::Borrowed(content));
    };
    let end = body_start + endfor;
    let body = &content[body_start..end];

    let range = ForRange::parse(range_text).ok_or_else(|| DirectiveError::InvalidForRange {
        range: range_text.trim().to_string(),
    })?;
    let invalid_step = || DirectiveError::InvalidStep {
        step: range.step,
        range: range_text.trim().to_string(),
    };
    if range.step == 0 {
        return Err(invalid_step());
    }
    let span = range.span().ok_or_else(invalid_step)?;
    let Ok(span) = usize::try_from(span) else {
        return Err(invalid_step());
    };

    let prefix = &content[..start];
    let suffix = &content[end + ENDFOR_TAG.len()..];
    let estimate = (body.len() + ITERATION_SLACK)
        .saturating_mul(span)
        .saturating_add(content.len());
    let mut expanded = buffer_with_capacity(estimate)?;
    expanded.push_str(prefix);

    let tag = format!("{{${}}}", range.id);
    for value in range.values() {
        let value = value.to_string();
        let mut rest = body;
        while let Some(pos) = rest.find(&tag) {
            expanded.push_str(&rest[..pos]);
            expanded.push_str(&value);
            rest = &rest[pos + tag.len()..];
        }
        expanded.push_str(rest);
    }

    expanded.push_str(suffix);
    Ok(Cow::Owned(expanded))
}
