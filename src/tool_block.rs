//! `<glm_block>` extraction from a `tool_call`-phase `edit_content` payload
//! (spec §4.2).
//!
//! A payload may be a bare argument-fragment continuation (no `<glm_block`
//! tag at all), or it may open one or more new tool blocks. The extractor
//! only ever returns *events*; it never mutates `Session` state directly,
//! since finalizing the previously active tool and emitting its frames is
//! the dispatcher's job (spec §4.1, §4.8).

use serde::Deserialize;

use crate::error::CoreError;

const GLM_BLOCK_OPEN: &str = "<glm_block ";
const GLM_BLOCK_CLOSE: &str = "</glm_block>";
/// Sentinel searched for in a bare continuation fragment (no `<glm_block`
/// tag in the payload at all): the end of the `arguments` string value
/// inside a paired `arguments`/`result` envelope.
const CONTINUATION_SENTINEL: &str = "\", \"result\"";
/// Sentinel searched for in the original payload when it does contain a
/// `<glm_block` tag and segment 0 is a continuation of the previously
/// active tool's arguments.
const SEGMENT0_SENTINEL: &str = "\"result\"";

#[derive(Debug, Deserialize)]
struct GlmBlockPayload {
    data: GlmBlockData,
}

#[derive(Debug, Deserialize)]
struct GlmBlockData {
    metadata: GlmBlockMetadata,
}

#[derive(Debug, Deserialize)]
struct GlmBlockMetadata {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// One new tool-call block parsed out of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTool {
    pub id: String,
    pub name: String,
    pub initial_args: String,
}

/// What processing an `edit_content` payload in phase `tool_call` yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEvent {
    /// Append this text to the currently active tool's accumulated
    /// arguments. Emitted only when a tool is already active.
    AppendArgs(String),
    /// The active tool (if any) must be finalized, then this new one
    /// becomes active.
    StartTool(NewTool),
}

/// Process one `edit_content` payload, given whether a tool is currently
/// active. Returns the ordered sequence of events the dispatcher must
/// apply — at most one `AppendArgs` followed by any number of
/// `StartTool`s, since later segments can only start tools, never append.
pub fn process(payload: &str, tool_active: bool) -> Vec<ToolEvent> {
    if !payload.contains(GLM_BLOCK_OPEN) {
        return process_continuation(payload, tool_active);
    }

    let mut events = Vec::new();
    let segments: Vec<&str> = payload.split(GLM_BLOCK_OPEN).collect();

    if tool_active {
        if let Some(r) = payload.find(SEGMENT0_SENTINEL) {
            if r > 0 {
                let end = r.saturating_sub(3);
                events.push(ToolEvent::AppendArgs(payload[..end].to_string()));
            }
        }
    }

    for segment in segments.into_iter().skip(1) {
        if !segment.contains(GLM_BLOCK_CLOSE) {
            continue;
        }
        match parse_segment(segment) {
            Ok(tool) => events.push(ToolEvent::StartTool(tool)),
            Err(e) => log::error!("{e}"),
        }
    }

    events
}

fn process_continuation(payload: &str, tool_active: bool) -> Vec<ToolEvent> {
    if !tool_active {
        return Vec::new();
    }
    match payload.find(CONTINUATION_SENTINEL) {
        Some(p) if p > 0 => vec![ToolEvent::AppendArgs(payload[..p].to_string())],
        _ => vec![ToolEvent::AppendArgs(payload.to_string())],
    }
}

/// Parse the JSON between the segment's first `>` (closing the opening
/// tag's attributes) and the final `</glm_block>`.
fn parse_segment(segment: &str) -> Result<NewTool, CoreError> {
    let gt = segment
        .find('>')
        .ok_or_else(|| CoreError::malformed_block(segment))?;
    let close = segment
        .rfind(GLM_BLOCK_CLOSE)
        .ok_or_else(|| CoreError::malformed_block(segment))?;
    if close <= gt + 1 {
        return Err(CoreError::malformed_block(segment));
    }

    let json_text = &segment[gt + 1..close];
    let payload: GlmBlockPayload =
        serde_json::from_str(json_text).map_err(|_| CoreError::malformed_block(json_text))?;

    let metadata = payload.data.metadata;
    if metadata.id.is_empty() {
        return Err(CoreError::malformed_block(json_text));
    }

    Ok(NewTool {
        id: metadata.id,
        name: metadata.name.unwrap_or_else(|| "unknown".to_string()),
        initial_args: metadata.arguments.unwrap_or_else(|| "{}".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, name: &str, args: &str) -> String {
        format!(
            r#"<glm_block type="tool_call">{{"data":{{"metadata":{{"id":"{id}","name":"{name}","arguments":"{args}"}}}}}}</glm_block>"#
        )
    }

    #[test]
    fn starts_a_new_tool_from_a_single_block() {
        let payload = block("call_1", "Write", "{\\\"content\\\":\\\"hi\\\"}");
        let events = process(&payload, false);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ToolEvent::StartTool(t) => {
                assert_eq!(t.id, "call_1");
                assert_eq!(t.name, "Write");
            }
            other => panic!("expected StartTool, got {other:?}"),
        }
    }

    #[test]
    fn continuation_without_sentinel_appends_whole_payload() {
        let events = process("more json here", true);
        assert_eq!(events, vec![ToolEvent::AppendArgs("more json here".to_string())]);
    }

    #[test]
    fn continuation_with_sentinel_truncates_at_match() {
        let payload = r#"hello world", "result""#;
        let events = process(payload, true);
        assert_eq!(
            events,
            vec![ToolEvent::AppendArgs("hello world".to_string())]
        );
    }

    #[test]
    fn continuation_ignored_without_active_tool() {
        assert_eq!(process("stray fragment", false), Vec::new());
    }

    #[test]
    fn segment_zero_with_active_tool_and_result_sentinel() {
        // The trailing `"` closes the previous tool's `arguments` string
        // value itself; the `-3` offset excludes it along with `, `.
        let payload = format!(
            r#"{{"content":"partial"}}", "result"{}"#,
            block("call_2", "Bash", "{{}}")
        );
        let events = process(&payload, true);
        assert!(matches!(events[0], ToolEvent::AppendArgs(ref s) if s == "{\"content\":\"partial\"}"));
        assert!(matches!(events[1], ToolEvent::StartTool(ref t) if t.id == "call_2"));
    }

    #[test]
    fn segment_zero_without_result_sentinel_is_skipped() {
        let payload = format!("no sentinel here{}", block("call_3", "Bash", "{{}}"));
        let events = process(&payload, true);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ToolEvent::StartTool(ref t) if t.id == "call_3"));
    }

    #[test]
    fn two_sequential_blocks_yield_two_start_events() {
        let payload = format!("{}{}", block("call_a", "A", "{{}}"), block("call_b", "B", "{{}}"));
        let events = process(&payload, false);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ToolEvent::StartTool(t) if t.id == "call_a"));
        assert!(matches!(&events[1], ToolEvent::StartTool(t) if t.id == "call_b"));
    }

    #[test]
    fn missing_id_is_malformed_and_skipped() {
        let payload =
            r#"<glm_block type="tool_call">{"data":{"metadata":{"name":"Write","arguments":"{}"}}}</glm_block>"#;
        assert_eq!(process(payload, false), Vec::new());
    }

    #[test]
    fn missing_name_defaults_to_unknown() {
        let payload = r#"<glm_block type="tool_call">{"data":{"metadata":{"id":"x"}}}</glm_block>"#;
        let events = process(payload, false);
        match &events[0] {
            ToolEvent::StartTool(t) => {
                assert_eq!(t.name, "unknown");
                assert_eq!(t.initial_args, "{}");
            }
            other => panic!("expected StartTool, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_logged_and_skipped() {
        let payload = "<glm_block type=\"x\">not json</glm_block>";
        assert_eq!(process(payload, false), Vec::new());
    }
}
