//! Downstream frame shaping (spec §4.8): the five OpenAI-compatible
//! `chat.completion.chunk` frame kinds this core ever emits, plus the
//! literal `[DONE]` terminator.

use serde_json::json;

pub const DONE: &str = "data: [DONE]\n\n";

const SYSTEM_FINGERPRINT: &str = "fp_zai_001";

fn envelope(
    model_id: &str,
    created: i64,
    delta: serde_json::Value,
    finish_reason: Option<&str>,
    usage: Option<&serde_json::Value>,
) -> String {
    let choice = json!({
        "index": 0,
        "delta": delta,
        "logprobs": null,
        "finish_reason": finish_reason,
    });
    let mut frame = json!({
        "id": format!("chatcmpl-{created}"),
        "object": "chat.completion.chunk",
        "created": created,
        "model": model_id,
        "system_fingerprint": SYSTEM_FINGERPRINT,
        "choices": [choice],
    });
    if let Some(u) = usage {
        frame["usage"] = u.clone();
    }
    format!("data: {frame}\n\n")
}

/// A plain content delta. `role` is attached once, on the very first frame
/// any session ever emits.
pub fn content_frame(model_id: &str, created: i64, text: &str, role_pending: bool) -> String {
    let mut delta = json!({ "content": text });
    if role_pending {
        delta["role"] = json!("assistant");
    }
    envelope(model_id, created, delta, None, None)
}

/// First frame of a tool call: carries `id`, `name`, and an empty
/// `arguments` string. `role` is attached if this is also the first frame
/// of the whole session.
pub fn tool_start_frame(
    model_id: &str,
    created: i64,
    index: usize,
    id: &str,
    name: &str,
    role_pending: bool,
) -> String {
    let mut delta = json!({
        "content": null,
        "tool_calls": [{
            "index": index,
            "id": id,
            "type": "function",
            "function": { "name": name, "arguments": "" },
        }],
    });
    if role_pending {
        delta["role"] = json!("assistant");
    }
    envelope(model_id, created, delta, None, None)
}

/// A tool-call argument fragment. No `id` on these — only the first frame
/// of a given tool-call index carries one.
pub fn tool_args_frame(model_id: &str, created: i64, index: usize, arguments: &str) -> String {
    let delta = json!({
        "tool_calls": [{
            "index": index,
            "function": { "arguments": arguments },
        }],
    });
    envelope(model_id, created, delta, None, None)
}

/// Finalizes a tool call: empty delta, `finish_reason: "tool_calls"`.
pub fn tool_finish_frame(
    model_id: &str,
    created: i64,
    usage: Option<&serde_json::Value>,
) -> String {
    envelope(model_id, created, json!({}), Some("tool_calls"), usage)
}

/// Finalizes a plain answer: empty delta, `finish_reason: "stop"`.
pub fn stop_finish_frame(
    model_id: &str,
    created: i64,
    usage: Option<&serde_json::Value>,
) -> String {
    envelope(model_id, created, json!({}), Some("stop"), usage)
}
