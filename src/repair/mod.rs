//! Tool-argument repair pipeline (spec §4.4): preprocess → generic JSON
//! repair → parse → synthesize missing fields → post-process → serialize.
//!
//! `repair` never fails: if every stage is exhausted and the text still
//! doesn't parse, it logs and returns `"{}"`, matching the source's
//! substitute-and-continue error handling (spec §7).

mod generic;
mod postprocess;
mod preprocess;
mod synthesize;

use crate::error::truncate_for_log;

/// Run the full repair pipeline over an accumulated, possibly-malformed
/// tool-argument string and return a canonical, parseable JSON string.
pub fn repair(raw: &str, tool_name: &str, user_message: &str) -> String {
    let trivial = match raw {
        "" | "{" | "{\"" => "{}",
        other => other,
    };

    let preprocessed = preprocess::preprocess(trivial);
    let repaired_text = generic::repair_json(&preprocessed);

    let mut value: serde_json::Value = match serde_json::from_str(&repaired_text) {
        Ok(v) => v,
        Err(e) => {
            log::error!(
                "argument repair failed: {e}, raw: {}",
                truncate_for_log(raw, 1024)
            );
            return "{}".to_string();
        }
    };

    synthesize::synthesize_missing_fields(&mut value, tool_name, user_message);
    postprocess::post_process(&mut value);

    match serde_json::to_string(&value) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to serialize repaired arguments: {e}");
            "{}".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_becomes_empty_object() {
        assert_eq!(repair("", "Bash", ""), "{}");
        assert_eq!(repair("{", "Bash", ""), "{}");
        assert_eq!(repair("{\"", "Bash", ""), "{}");
    }

    #[test]
    fn well_formed_args_round_trip() {
        let out = repair(r#"{"city":"Tokyo"}"#, "Bash", "");
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v, json!({"city": "Tokyo"}));
    }

    #[test]
    fn truncated_trailing_quote_is_repaired() {
        let out = repair(r#"{"url":"https://x.com\"}"#, "Bash", "");
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v, json!({"url": "https://x.com"}));
    }

    #[test]
    fn missing_opening_brace_is_restored() {
        let out = repair(r#""command":"ls -la"}"#, "Bash", "");
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v, json!({"command": "ls -la"}));
    }

    #[test]
    fn write_tool_without_file_path_infers_from_context() {
        let out = repair(
            r#"{"content":"<h1>Hi</h1>"}"#,
            "Write",
            "create a.html with <h1>Hi</h1>",
        );
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["content"], "<h1>Hi</h1>");
        assert_eq!(v["file_path"], "a.html");
    }

    #[test]
    fn write_tool_defaults_to_output_html_when_inference_fails() {
        let out = repair(r#"{"content":"hi"}"#, "Write", "no filename here");
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["file_path"], "output.html");
    }

    #[test]
    fn double_encoded_unicode_is_decoded() {
        let out = repair(r#"{"title":"\\u7528\\u6237"}"#, "Bash", "");
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["title"], "用户");
        assert!(out.contains('用'));
        assert!(!out.contains("\\u"));
    }

    #[test]
    fn windows_path_over_escape_is_repaired() {
        let out = repair(
            r#"{"file_path":"C:\\\\Users\\\\Me\\\\a.txt"}"#,
            "Bash",
            "",
        );
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["file_path"], "C:\\Users\\Me\\a.txt");
    }

    #[test]
    fn unparseable_garbage_falls_back_to_empty_object() {
        assert_eq!(repair("not json at all {{{", "Bash", ""), "{}");
    }
}
