//! Best-effort JSON extraction/repair pipeline (§4.11 "JSON handling").
//!
//! Applied cumulatively, in this exact order: markdown fence strip → first
//! balanced-brace extraction → trailing-comma strip → control-character
//! escape. The gateway tries to parse after each step and stops at the
//! first one that yields valid JSON.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
}

/// Strips a leading/trailing markdown code fence, if present.
pub fn strip_markdown_fence(raw: &str) -> String {
    if let Some(caps) = FENCE_RE.captures(raw) {
        caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_else(|| raw.to_string())
    } else {
        raw.to_string()
    }
}

/// Extracts the first balanced `{...}` group, scanning for matching braces
/// (string-aware, so braces inside quoted JSON strings don't confuse depth).
pub fn extract_first_balanced_braces(raw: &str) -> Option<String> {
    let bytes: Vec<char> = raw.chars().collect();
    let start = bytes.iter().position(|&c| c == '{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &c) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(bytes[start..end].iter().collect());
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes trailing commas before a closing `}` or `]`.
pub fn strip_trailing_commas(raw: &str) -> String {
    TRAILING_COMMA_RE.replace_all(raw, "$1").to_string()
}

/// Escapes bare control characters (e.g. literal newlines inside a string
/// value) that would otherwise make an LLM response invalid JSON.
pub fn escape_control_chars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in raw.chars() {
        if in_string && !escaped {
            match c {
                '\n' => {
                    out.push_str("\\n");
                    continue;
                }
                '\r' => {
                    out.push_str("\\r");
                    continue;
                }
                '\t' => {
                    out.push_str("\\t");
                    continue;
                }
                _ => {}
            }
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

/// Runs the full cumulative pipeline, returning the parsed value from the
/// first stage that succeeds.
pub fn repair_and_parse(raw: &str) -> Option<serde_json::Value> {
    if let Ok(v) = serde_json::from_str(raw) {
        return Some(v);
    }

    let fenced = strip_markdown_fence(raw);
    if let Ok(v) = serde_json::from_str(&fenced) {
        return Some(v);
    }

    let Some(braced) = extract_first_balanced_braces(&fenced) else {
        return None;
    };
    if let Ok(v) = serde_json::from_str(&braced) {
        return Some(v);
    }

    let no_trailing_commas = strip_trailing_commas(&braced);
    if let Ok(v) = serde_json::from_str(&no_trailing_commas) {
        return Some(v);
    }

    let escaped = escape_control_chars(&no_trailing_commas);
    serde_json::from_str(&escaped).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_without_repair() {
        assert!(repair_and_parse(r#"{"a": 1}"#).is_some());
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(repair_and_parse(raw).unwrap()["a"], 1);
    }

    #[test]
    fn extracts_first_balanced_brace_group_amid_prose() {
        let raw = "Here is the JSON: {\"a\": 1} -- hope that helps!";
        assert_eq!(repair_and_parse(raw).unwrap()["a"], 1);
    }

    #[test]
    fn strips_trailing_comma() {
        let raw = r#"{"a": 1, "b": [1, 2,],}"#;
        assert_eq!(repair_and_parse(raw).unwrap()["a"], 1);
    }

    #[test]
    fn escapes_bare_newline_in_string_value() {
        let raw = "{\"a\": \"line one\nline two\"}";
        let parsed = repair_and_parse(raw).unwrap();
        assert_eq!(parsed["a"], "line one\nline two");
    }

    #[test]
    fn returns_none_for_unrecoverable_garbage() {
        assert!(repair_and_parse("not json at all").is_none());
    }
}
