//! `#@if` / `#@else` / `#@endif` resolution.
//!
//! Conditions have the form `%{VARIABLE} in [value, value, ...]` where the
//! variable is `%{LOCAL_IP}` or `%{LOCAL_HOST}`. A condition that cannot be
//! parsed is logged and evaluates to false.

use std::borrow::Cow;

use super::{buffer_with_capacity, DirectiveError};
use crate::host::HostIdentity;

const IF_TAG: &str = "#@if ";
const ELSE_TAG: &str = "#@else";
const ENDIF_TAG: &str = "#@endif";

const LOCAL_IP: &str = "%{LOCAL_IP}";
const LOCAL_HOST: &str = "%{LOCAL_HOST}";

/// Comparison values beyond this count are folded into the last one.
pub const MAX_CONDITION_VALUES: usize = 32;

const BLANKS: [char; 2] = [' ', '\t'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variable {
    LocalIp,
    LocalHost,
}

#[derive(Debug)]
struct Condition<'a> {
    variable: Variable,
    values: Vec<&'a str>,
}

/// Resolves the first `#@if` block in `content`.
///
/// Returns `Cow::Borrowed(content)` when there is nothing left to resolve:
/// no `#@if`, or an `#@if` without a terminating newline or `#@endif`.
/// Otherwise returns the rewritten text: everything before the `#@if`, the
/// chosen branch, and everything after the `#@endif` tag.
pub fn resolve_if<'a>(
    content: &'a str,
    host: &dyn HostIdentity,
) -> Result<Cow<'a, str>, DirectiveError> {
    let Some(start) = content.find(IF_TAG) else {
        return Ok(Cow::Borrowed(content));
    };
    let condition_start = start + IF_TAG.len();
    let Some(newline) = content[condition_start..].find('\n') else {
        return Ok(Cow::Borrowed(content));
    };
    let if_start = condition_start + newline;
    let condition = &content[condition_start..if_start];

    let Some(endif) = content[if_start..].find(ENDIF_TAG) else {
        return Ok(Cow::Borrowed(content));
    };
    let end = if_start + endif;

    let (if_part, else_part) = match content[if_start..end].find(ELSE_TAG) {
        None => (&content[if_start..end], ""),
        Some(offset) => {
            let else_tag = if_start + offset;
            let after_tag = else_tag + ELSE_TAG.len();
            let Some(newline) = content[after_tag..].find('\n') else {
                return Ok(Cow::Borrowed(content));
            };
            let else_start = after_tag + newline;
            let else_part = if else_start < end {
                &content[else_start..end]
            } else {
                ""
            };
            (&content[if_start..else_tag], else_part)
        }
    };

    let branch = if evaluate(condition, host) {
        if_part
    } else {
        else_part
    };
    let prefix = &content[..start];
    let suffix = &content[end + ENDIF_TAG.len()..];

    let mut resolved = buffer_with_capacity(prefix.len() + branch.len() + suffix.len())?;
    resolved.push_str(prefix);
    resolved.push_str(branch);
    resolved.push_str(suffix);
    Ok(Cow::Owned(resolved))
}

fn evaluate(condition: &str, host: &dyn HostIdentity) -> bool {
    match parse_condition(condition) {
        Ok(parsed) => parsed.matches(host),
        Err(reason) => {
            tracing::warn!(condition = %condition, "{reason}");
            false
        }
    }
}

fn parse_condition(condition: &str) -> Result<Condition<'_>, &'static str> {
    let Some(body) = condition
        .trim_end_matches([' ', '\t', '\r'])
        .strip_suffix(']')
    else {
        return Err("expect \"]\"");
    };

    let rest = body.trim_start_matches(BLANKS);
    if rest.len() < LOCAL_IP.len() {
        return Err("condition too short");
    }

    let (variable, rest) = if let Some(rest) = rest.strip_prefix(LOCAL_IP) {
        (Variable::LocalIp, rest)
    } else if let Some(rest) = rest.strip_prefix(LOCAL_HOST) {
        (Variable::LocalHost, rest)
    } else {
        return Err("unknown condition variable");
    };

    let Some(rest) = rest.trim_start_matches(BLANKS).strip_prefix("in") else {
        return Err("expect \"in\"");
    };
    let Some(list) = rest.trim_start_matches(BLANKS).strip_prefix('[') else {
        return Err("expect \"[\"");
    };

    let values = list.splitn(MAX_CONDITION_VALUES, ',').map(str::trim).collect();
    Ok(Condition { variable, values })
}

impl Condition<'_> {
    fn matches(&self, host: &dyn HostIdentity) -> bool {
        match self.variable {
            Variable::LocalHost => match host.hostname() {
                Some(name) => self.values.contains(&name.as_str()),
                None => {
                    tracing::warn!("cannot determine hostname, condition is false");
                    false
                }
            },
            Variable::LocalIp => host
                .local_ips()
                .iter()
                .any(|ip| self.values.contains(&ip.to_string().as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;

    fn host() -> StaticHost {
        StaticHost::new("web-01").with_ip("10.0.11.89".parse().unwrap())
    }

    fn resolve(content: &str) -> String {
        resolve_if(content, &host()).unwrap().into_owned()
    }

    #[test]
    fn test_no_directive_is_fixed_point() {
        let content = "a=1\n[s]\nb=2\n";
        let result = resolve_if(content, &host()).unwrap();
        assert!(matches!(result, Cow::Borrowed(s) if std::ptr::eq(s, content)));
    }

    #[test]
    fn test_hostname_match_keeps_body() {
        let out = resolve("a=1\n#@if %{LOCAL_HOST} in [web-01]\nb=2\n#@endif\nc=3\n");
        assert_eq!(out, "a=1\n\nb=2\n\nc=3\n");
    }

    #[test]
    fn test_hostname_mismatch_drops_body() {
        let out = resolve("#@if %{LOCAL_HOST} in [web-02]\nb=2\n#@endif\nc=3\n");
        assert_eq!(out, "\nc=3\n");
    }

    #[test]
    fn test_hostname_match_is_case_sensitive() {
        let out = resolve("#@if %{LOCAL_HOST} in [WEB-01]\nb=2\n#@endif\n");
        assert!(!out.contains("b=2"));
    }

    #[test]
    fn test_else_branch() {
        let content = "#@if %{LOCAL_IP} in [10.0.0.1, 10.0.0.2]\nx=if\n#@else\nx=else\n#@endif\n";
        let out = resolve(content);
        assert!(out.contains("x=else"));
        assert!(!out.contains("x=if"));
    }

    #[test]
    fn test_ip_match_any_value() {
        let content = "#@if %{LOCAL_IP} in [ 10.0.0.1 ,10.0.11.89 ]\nx=if\n#@else\nx=else\n#@endif\n";
        let out = resolve(content);
        assert!(out.contains("x=if"));
        assert!(!out.contains("x=else"));
    }

    #[test]
    fn test_malformed_condition_takes_else_branch() {
        for condition in [
            "%{LOCAL_HOST} in [web-01",
            "%{LOCAL_HOST} [web-01]",
            "%{HOSTNAME} in [web-01]",
            "[web-01]",
            "%{LOCAL_HOST} in web-01]",
        ] {
            let content = format!("#@if {condition}\nx=if\n#@else\nx=else\n#@endif\n");
            let out = resolve(&content);
            assert!(out.contains("x=else"), "condition: {condition}");
            assert!(!out.contains("x=if"), "condition: {condition}");
        }
    }

    #[test]
    fn test_unterminated_block_is_left_alone() {
        let content = "#@if %{LOCAL_HOST} in [web-01]\nx=1\n";
        assert!(matches!(resolve_if(content, &host()).unwrap(), Cow::Borrowed(_)));

        let content = "x=1\n#@if %{LOCAL_HOST} in [web-01]";
        assert!(matches!(resolve_if(content, &host()).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_resolves_first_block_only() {
        let content = "#@if %{LOCAL_HOST} in [web-01]\na=1\n#@endif\n#@if %{LOCAL_HOST} in [x]\nb=1\n#@endif\n";
        let once = resolve(content);
        assert!(once.contains("#@if %{LOCAL_HOST} in [x]"));
        let twice = resolve(&once);
        assert_eq!(twice, "\na=1\n\n\n");
    }

    #[test]
    fn test_missing_hostname_is_false() {
        let host = StaticHost::default();
        let out = resolve_if("#@if %{LOCAL_HOST} in [web-01]\na=1\n#@endif\n", &host).unwrap();
        assert_eq!(out, "\n");
    }
}
