//! Typed views over loaded items.
//!
//! Item values are plain text. For deserialization each value is coerced to
//! the most specific TOML scalar: boolean, integer, float, then string.

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::{IniContext, Item};
use crate::Error;

impl IniContext {
    /// Deserializes the whole context.
    ///
    /// Global items sit at the root; each named section becomes a nested
    /// table. A key with several values becomes an array.
    ///
    /// ```
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct App {
    ///     name: String,
    ///     server: Server,
    /// }
    ///
    /// #[derive(Deserialize)]
    /// struct Server {
    ///     port: u16,
    ///     peer: Vec<String>,
    /// }
    ///
    /// let ctx = ini_directives::load_str(
    ///     "name = demo\n[server]\nport = 8080\npeer = a\npeer = b\n",
    /// )?;
    /// let app: App = ctx.deserialize()?;
    ///
    /// assert_eq!(app.name, "demo");
    /// assert_eq!(app.server.port, 8080);
    /// assert_eq!(app.server.peer.len(), 2);
    /// # Ok::<(), ini_directives::Error>(())
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let mut root = items_table(self.section_items(""));
        for view in self.sections() {
            if root.contains_key(view.name()) {
                tracing::debug!(section = view.name(), "section shadows global item of the same name");
            }
            root.insert(view.name().to_string(), Value::Table(items_table(view.items())));
        }

        Value::Table(root)
            .try_into()
            .map_err(|source| Error::Deserialize {
                section: String::new(),
                source,
            })
    }

    /// Deserializes one section; `""` is the global section.
    ///
    /// A missing section deserializes as an empty table, so `#[serde(default)]`
    /// fields still apply.
    pub fn deserialize_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, Error> {
        Value::Table(items_table(self.section_items(section)))
            .try_into()
            .map_err(|source| Error::Deserialize {
                section: section.to_string(),
                source,
            })
    }
}

fn items_table(items: &[Item]) -> Table {
    let mut table = Table::new();
    for item in items {
        let value = coerce_value(item.value());
        match table.get_mut(item.name()) {
            None => {
                table.insert(item.name().to_string(), value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::Boolean(false));
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    table
}

/// Boolean words accepted in INI values, matching `get_bool` for true.
const TRUE_WORDS: [&str; 3] = ["true", "yes", "on"];
const FALSE_WORDS: [&str; 3] = ["false", "no", "off"];

/// Reads an item value as the most specific TOML scalar.
///
/// `yes`/`on` and `no`/`off` are booleans as well as `true`/`false`.
/// Anything that is not wholly a number stays a string, so addresses such as
/// `10.0.0.1` or versions such as `1.2.3` are not mangled.
fn coerce_value(raw: &str) -> Value {
    if TRUE_WORDS.iter().any(|word| raw.eq_ignore_ascii_case(word)) {
        return Value::Boolean(true);
    }
    if FALSE_WORDS.iter().any(|word| raw.eq_ignore_ascii_case(word)) {
        return Value::Boolean(false);
    }

    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return Value::String(raw.to_string());
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Integer(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if digits.contains('.') || digits.contains(['e', 'E']) => Value::Float(f),
        _ => Value::String(raw.to_string()),
    }
}

/// Splits an optional sign off `s` after leading whitespace.
fn split_sign(s: &str) -> (bool, &str) {
    let s = s.trim_start();
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

/// Reads the integer at the start of `s` like `strtoll`: 0 when there are no
/// digits, saturating at the `i64` bounds.
pub(super) fn leading_integer(s: &str) -> i64 {
    let (negative, rest) = split_sign(s);
    let mut value: i64 = 0;
    for digit in rest.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        let next = value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(digit) } else { v.checked_add(digit) });
        match next {
            Some(next) => value = next,
            None => return if negative { i64::MIN } else { i64::MAX },
        }
    }
    value
}

/// Reads the floating point number at the start of `s` like `strtod`:
/// decimal with optional exponent, or `inf`/`infinity`/`nan`. 0.0 when
/// nothing matches.
pub(super) fn leading_float(s: &str) -> f64 {
    let (negative, rest) = split_sign(s);
    let sign = if negative { -1.0 } else { 1.0 };

    for (word, value) in [("infinity", f64::INFINITY), ("inf", f64::INFINITY), ("nan", f64::NAN)] {
        if rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
        {
            return sign * value;
        }
    }

    let candidate = rest
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map_or(rest, |end| &rest[..end]);
    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
        .map_or(0.0, |value| sign * value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::path::PathBuf;

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("TRUE"), Value::Boolean(true));
        assert_eq!(coerce_value("yes"), Value::Boolean(true));
        assert_eq!(coerce_value("On"), Value::Boolean(true));
        assert_eq!(coerce_value("off"), Value::Boolean(false));
        assert_eq!(coerce_value("-42"), Value::Integer(-42));
        assert_eq!(coerce_value("+7"), Value::Integer(7));
        assert_eq!(coerce_value("2.5"), Value::Float(2.5));
        assert_eq!(coerce_value("1e3"), Value::Float(1000.0));
        assert_eq!(coerce_value("10.0.0.1"), Value::String("10.0.0.1".into()));
        assert_eq!(coerce_value("inf"), Value::String("inf".into()));
        assert_eq!(coerce_value("-"), Value::String("-".into()));
        assert_eq!(coerce_value(""), Value::String(String::new()));
    }

    #[test]
    fn test_leading_numbers() {
        assert_eq!(leading_integer(" -17 apples"), -17);
        assert_eq!(leading_integer("+3"), 3);
        assert_eq!(leading_integer("x1"), 0);
        assert_eq!(leading_integer("-99999999999999999999"), i64::MIN);
        assert_eq!(leading_float("1.5e3ms"), 1500.0);
        assert_eq!(leading_float("3.ms"), 3.0);
        assert_eq!(leading_float("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(leading_float("abc"), 0.0);
    }

    #[test]
    fn test_items_table_groups_repeated_keys() {
        let items = [
            Item::new("peer", "a"),
            Item::new("peer", "b"),
            Item::new("peer", "c"),
            Item::new("port", "80"),
        ];
        let table = items_table(&items);
        assert_eq!(table["peer"].as_array().map(Vec::len), Some(3));
        assert_eq!(table["port"].as_integer(), Some(80));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pool {
        size: u32,
        #[serde(default)]
        verbose: bool,
    }

    #[test]
    fn test_deserialize_section_and_missing_section() {
        let mut ctx = IniContext::new(PathBuf::new(), true);
        ctx.section_mut(Some("pool")).push(Item::new("size", "8"));
        ctx.sort_items();

        let pool: Pool = ctx.deserialize_section("pool").unwrap();
        assert_eq!(
            pool,
            Pool {
                size: 8,
                verbose: false
            }
        );

        let result = ctx.deserialize_section::<Pool>("other");
        assert!(matches!(result, Err(Error::Deserialize { ref section, .. }) if section == "other"));
    }
}
