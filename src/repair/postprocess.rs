//! Stage 6 of the repair pipeline (spec §4.4): repairs applied to an
//! already-parsed argument object — double-Unicode repair on every string,
//! Windows-path over-escape repair on path-shaped fields, and a trailing
//! stray quote on `command`.

use std::sync::OnceLock;

use regex::Regex;

const PATH_FIELDS: &[&str] = &["file_path", "path", "directory", "folder"];

static UNICODE_ESCAPE: OnceLock<Regex> = OnceLock::new();
static TRAILING_QUOTES: OnceLock<Regex> = OnceLock::new();

fn unicode_escape_re() -> &'static Regex {
    UNICODE_ESCAPE.get_or_init(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("static pattern compiles"))
}

fn trailing_quotes_re() -> &'static Regex {
    TRAILING_QUOTES.get_or_init(|| Regex::new(r#"\\""+$"#).expect("static pattern compiles"))
}

/// Walk every string value in `value`, applying field-agnostic repairs
/// everywhere and field-named repairs (`PATH_FIELDS`, `command`) only on
/// matching object keys.
pub(super) fn post_process(value: &mut serde_json::Value) {
    walk(value, None);
}

fn walk(value: &mut serde_json::Value, field_name: Option<&str>) {
    match value {
        serde_json::Value::String(s) => {
            *s = fix_unicode_escaping(s);
            if let Some(name) = field_name {
                if PATH_FIELDS.contains(&name) {
                    *s = fix_path_escaping(s);
                }
                if name == "command" {
                    *s = fix_command_quotes(s);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk(item, field_name);
            }
        }
        serde_json::Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                walk(v, Some(key.as_str()));
            }
        }
        _ => {}
    }
}

/// A stream that double-JSON-encodes its payload leaves literal `\uXXXX`
/// sequences (one escaping layer survives the first decode) instead of the
/// intended character. Decode any such sequence back to the real codepoint.
fn fix_unicode_escaping(s: &str) -> String {
    if !s.contains(r"\u") {
        return s.to_string();
    }
    unicode_escape_re()
        .replace_all(s, |caps: &regex::Captures| {
            let code = u32::from_str_radix(&caps[1], 16).unwrap_or(0);
            char::from_u32(code)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

/// Split a `C:`-rooted path on `\`, drop the empty segments a doubled
/// separator leaves behind, and rejoin with a single `\`.
fn fix_path_escaping(s: &str) -> String {
    if !s.starts_with("C:") || !s.contains('\\') {
        return s.to_string();
    }
    s.split('\\')
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

/// Drop a stray trailing quote (or collapse a run of them to the single
/// escaped quote a shell command should end with).
fn fix_command_quotes(s: &str) -> String {
    if s.ends_with("\"\"") {
        return s[..s.len() - 1].to_string();
    }
    if trailing_quotes_re().is_match(s) {
        return trailing_quotes_re().replace(s, r#"\""#).to_string();
    }
    s.to_string()
}
