//! Stage 2 of the repair pipeline: a permissive, general-purpose JSON
//! repairer.
//!
//! There is no crate in the dependency graph equivalent to Python's
//! `json_repair`, so this hand-rolls the subset of repairs the upstream
//! stream actually needs: closing unterminated strings, closing unbalanced
//! brackets/braces, and dropping trailing commas. Grounded on the
//! `attempt_json_repair` pass in the Sven agent core (other_examples), which
//! walks the text once tracking bracket/string state rather than pulling in
//! a dedicated crate.
use std::sync::OnceLock;

use regex::Regex;

static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();

fn trailing_comma_re() -> &'static Regex {
    TRAILING_COMMA.get_or_init(|| Regex::new(r",\s*([}\]])").expect("static pattern compiles"))
}

/// Best-effort repair: if `text` already parses, it's returned unchanged
/// (minus trailing commas). Otherwise brackets and a trailing unterminated
/// string are closed out based on a single scan of bracket/string state.
pub(super) fn repair_json(text: &str) -> String {
    let without_trailing_commas = trailing_comma_re().replace_all(text, "$1").to_string();

    if serde_json::from_str::<serde_json::Value>(&without_trailing_commas).is_ok() {
        return without_trailing_commas;
    }

    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in without_trailing_commas.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = without_trailing_commas;
    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }

    let final_text = trailing_comma_re().replace_all(&repaired, "$1").to_string();
    final_text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_valid_json_untouched() {
        assert_eq!(repair_json(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn strips_trailing_comma() {
        assert_eq!(repair_json(r#"{"a":1,}"#), r#"{"a":1}"#);
    }

    #[test]
    fn closes_unterminated_string_and_object() {
        let out = repair_json(r#"{"a":"b"#);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["a"], "b");
    }

    #[test]
    fn closes_unbalanced_nested_brackets() {
        let out = repair_json(r#"{"a":[1,2,3"#);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["a"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let out = repair_json(r#"{"a":"{not a brace}"}"#);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["a"], "{not a brace}");
    }
}
