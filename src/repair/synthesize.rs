//! Stage 5 of the repair pipeline (spec §4.4): filling in fields a
//! file-writing tool call needs but the upstream stream never supplied.
//! Which key gets synthesized depends on the tool: most tools use
//! `file_path`, `str_replace_based_edit_tool` uses `path`.

use crate::filename;

/// The destination key a given tool expects its path argument under, for
/// the tools this pipeline knows how to backfill.
fn path_key_for_tool(tool_name: &str) -> Option<&'static str> {
    match tool_name {
        "Write" | "write_file" | "create_file" | "str_replace_editor" => Some("file_path"),
        "str_replace_based_edit_tool" => Some("path"),
        _ => None,
    }
}

/// If `tool_name` is a file-writing tool and its arguments carry `content`
/// but no path field, infer one from `user_message` or fall back to
/// `output.html`.
pub(super) fn synthesize_missing_fields(
    value: &mut serde_json::Value,
    tool_name: &str,
    user_message: &str,
) {
    let Some(key) = path_key_for_tool(tool_name) else {
        return;
    };

    let Some(obj) = value.as_object_mut() else {
        return;
    };

    let has_content = obj.contains_key("content");
    let has_path = obj
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| !s.is_empty())
        .unwrap_or(false);

    if !has_content || has_path {
        return;
    }

    let inferred = filename::infer(user_message);
    let path_value = if inferred.is_empty() {
        log::warn!("filename inference empty, defaulting {key} to output.html");
        "output.html".to_string()
    } else {
        inferred
    };

    log::debug!("synthesized missing {key}: {path_value}");
    obj.insert(key.to_string(), serde_json::Value::String(path_value));
}
