//! Declarative options
//!
//! Parses the value of trigger attributes such as
//! `data-md-dialog="target: #confirm; closeOnEscape: false"` into a JSON
//! object. A complete JSON object is accepted as is. Anything else is read
//! entry by entry, and entries that cannot be read are dropped (and logged)
//! while the rest still apply.

use serde_json::{Map, Value};
use thiserror::Error;

/// Parsed options mapping
pub type Options = Map<String, Value>;

/// Why a single option entry was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("entry '{0}' has no ':' or '=' separator")]
    MissingSeparator(String),

    #[error("entry '{0}' has an empty key")]
    EmptyKey(String),

    #[error("entry '{0}' has an empty value")]
    EmptyValue(String),

    #[error("entry '{0}' has an unbalanced value")]
    UnbalancedValue(String),
}

/// Parse a declarative options string; never fails
pub fn parse_options(text: &str) -> Options {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Options::new();
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return map;
    }

    let body = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut options = Options::new();
    for entry in split_entries(body) {
        match parse_entry(&entry) {
            Ok((key, value)) => {
                options.insert(key, value);
            }
            Err(err) => tracing::debug!("dropping option entry: {}", err),
        }
    }
    options
}

/// Split on top-level `,` / `;`, skipping over closed quotes and brackets.
/// An opener without a matching closer is treated as a plain character.
fn split_entries(body: &str) -> Vec<String> {
    let chars: Vec<char> = body.chars().collect();
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            ',' | ';' => {
                entries.push(std::mem::take(&mut current));
                i += 1;
            }
            '"' | '\'' | '[' | '{' => match find_closer(&chars, i) {
                Some(end) => {
                    current.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    current.push(ch);
                    i += 1;
                }
            },
            _ => {
                current.push(ch);
                i += 1;
            }
        }
    }
    entries.push(current);
    entries.retain(|e| !e.trim().is_empty());
    entries
}

fn find_closer(chars: &[char], open: usize) -> Option<usize> {
    let opener = chars[open];
    if opener == '"' || opener == '\'' {
        let mut i = open + 1;
        while i < chars.len() {
            match chars[i] {
                '\\' => i += 2,
                c if c == opener => return Some(i),
                _ => i += 1,
            }
        }
        return None;
    }

    let closer = if opener == '[' { ']' } else { '}' };
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == closer => return Some(i),
            '"' | '\'' | '[' | '{' => i = find_closer(chars, i)? + 1,
            _ => i += 1,
        }
    }
    None
}

fn parse_entry(entry: &str) -> Result<(String, Value), OptionsError> {
    let entry = entry.trim();
    let sep = separator_position(entry).ok_or_else(|| OptionsError::MissingSeparator(entry.to_string()))?;

    let key = unquote(entry[..sep].trim());
    if key.is_empty() {
        return Err(OptionsError::EmptyKey(entry.to_string()));
    }
    let raw = entry[sep + 1..].trim();
    if raw.is_empty() {
        return Err(OptionsError::EmptyValue(entry.to_string()));
    }
    let value = parse_value(raw).ok_or_else(|| OptionsError::UnbalancedValue(entry.to_string()))?;
    Ok((key.to_string(), value))
}

/// First `:` or `=` outside quotes
fn separator_position(entry: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (pos, ch) in entry.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, ':' | '=') => return Some(pos),
            _ => {}
        }
    }
    None
}

fn unquote(text: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    text
}

fn parse_value(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }
    if !is_balanced(raw) {
        return None;
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(Value::String(raw[1..raw.len() - 1].to_string()));
    }
    Some(Value::String(raw.to_string()))
}

fn is_balanced(raw: &str) -> bool {
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' | '[' | '{' => match find_closer(&chars, i) {
                Some(end) => i = end + 1,
                None => return false,
            },
            ']' | '}' => return false,
            _ => i += 1,
        }
    }
    true
}

/// Read an option as a string
pub fn get_str<'a>(options: &'a Options, key: &str) -> Option<&'a str> {
    options.get(key)?.as_str()
}

/// Read an option as a boolean, accepting `"true"` / `"false"` strings
pub fn get_bool(options: &Options, key: &str) -> Option<bool> {
    match options.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_json_object() {
        let opts = parse_options(r##"{"target": "#confirm", "closeOnEscape": false}"##);
        assert_eq!(get_str(&opts, "target"), Some("#confirm"));
        assert_eq!(get_bool(&opts, "closeOnEscape"), Some(false));
    }

    #[test]
    fn test_lenient_entries() {
        let opts = parse_options("target: #confirm; closeOnEscape: false, stacked=true, title: 'Hi, you'");
        assert_eq!(get_str(&opts, "target"), Some("#confirm"));
        assert_eq!(get_bool(&opts, "closeOnEscape"), Some(false));
        assert_eq!(get_bool(&opts, "stacked"), Some(true));
        assert_eq!(get_str(&opts, "title"), Some("Hi, you"));
    }

    #[test]
    fn test_selector_with_attribute_brackets() {
        let opts = parse_options("target: [data-id='a,b']");
        assert_eq!(get_str(&opts, "target"), Some("[data-id='a,b']"));
    }

    #[test]
    fn test_malformed_entries_dropped() {
        let opts = parse_options("{target: .dialog, nonsense, : 3, empty:, list: [1, 2, count: 4}");
        assert_eq!(get_str(&opts, "target"), Some(".dialog"));
        assert_eq!(opts.get("count"), Some(&Value::from(4)));
        assert!(!opts.contains_key("list"));
        assert!(!opts.contains_key("empty"));
        assert_eq!(opts.len(), 2);
    }

    #[test]
    fn test_entry_errors() {
        assert_eq!(parse_entry("nonsense"), Err(OptionsError::MissingSeparator("nonsense".into())));
        assert_eq!(parse_entry(" : 3"), Err(OptionsError::EmptyKey(": 3".into())));
        assert!(matches!(parse_entry("a: [1"), Err(OptionsError::UnbalancedValue(_))));
        assert_eq!(parse_entry("'quoted key': 1"), Ok(("quoted key".to_string(), Value::from(1))));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_options("").is_empty());
        assert!(parse_options("   ").is_empty());
    }
}
