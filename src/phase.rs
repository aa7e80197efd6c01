use serde::Deserialize;

/// One parsed upstream SSE chunk, already JSON-decoded by the host.
///
/// `phase` is kept as the raw string the host observed rather than an
/// already-validated enum: an unrecognized or absent phase is a per-chunk
/// condition the dispatcher logs and drops (spec §4.1), not a parse error
/// for the whole chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamChunk {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub edit_content: String,
    #[serde(default)]
    pub delta_content: String,
    #[serde(default)]
    pub edit_index: Option<i64>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// Upstream's coarse state tag on each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Thinking,
    ToolCall,
    Other,
    Answer,
    Done,
}

impl Phase {
    pub fn parse(raw: &str) -> Option<Phase> {
        match raw {
            "thinking" => Some(Phase::Thinking),
            "tool_call" => Some(Phase::ToolCall),
            "other" => Some(Phase::Other),
            "answer" => Some(Phase::Answer),
            "done" => Some(Phase::Done),
            _ => None,
        }
    }
}
