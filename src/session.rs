//! Per-request translation state and phase dispatcher (spec §3, §4.1,
//! §4.6, §4.7).

use crate::error::truncate_for_log;
use crate::output;
use crate::phase::{Phase, UpstreamChunk};
use crate::repair;
use crate::tool_block::{self, ToolEvent};

const FLUSH_CHAR_THRESHOLD: usize = 100;
const FLUSH_MILLIS_THRESHOLD: u128 = 50;
const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？'];
const TOOL_END_SENTINEL: &str = "null,";

/// Redacted in debug logs since these fields frequently carry local
/// filesystem paths from the user's own machine.
const SENSITIVE_ARG_KEYS: &[&str] = &["file_path", "path", "directory"];

struct ToolState {
    id: String,
    name: String,
    accumulated_args: String,
    index: usize,
}

/// Per-request translation state. One instance per downstream response;
/// `consume` is called once per parsed upstream chunk and returns the SSE
/// frames it produced.
pub struct Session {
    model_id: String,
    stream_mode: bool,
    user_message: String,
    current_phase: Option<Phase>,
    stream_ended: bool,
    role_emitted: bool,
    tool: Option<ToolState>,
    usage: Option<serde_json::Value>,
    answer_buffer: String,
    buffer_chars: usize,
    last_flush_at: std::time::Instant,
    next_tool_index: usize,
    now: Box<dyn Fn() -> i64 + Send>,
}

impl Session {
    /// `model_id`, `stream_mode`, and `user_message` are the host-provided
    /// context this core requires at construction (spec §6). `now` supplies
    /// unix-second timestamps for frame ids, injected so tests don't depend
    /// on wall-clock time.
    pub fn new(
        model_id: impl Into<String>,
        stream_mode: bool,
        user_message: impl Into<String>,
        now: impl Fn() -> i64 + Send + 'static,
    ) -> Self {
        Session {
            model_id: model_id.into(),
            stream_mode,
            user_message: user_message.into(),
            current_phase: None,
            stream_ended: false,
            role_emitted: false,
            tool: None,
            usage: None,
            answer_buffer: String::new(),
            buffer_chars: 0,
            last_flush_at: std::time::Instant::now(),
            next_tool_index: 0,
            now: Box::new(now),
        }
    }

    fn created(&self) -> i64 {
        (self.now)()
    }

    /// Consume one parsed upstream chunk and return the SSE frames it
    /// produced, in emission order. Never panics: any internal error is
    /// logged and the chunk is dropped (spec §4.1, §7).
    pub fn consume(&mut self, chunk: &UpstreamChunk) -> Vec<String> {
        if self.stream_ended {
            return Vec::new();
        }

        let Some(phase_str) = chunk.phase.as_deref() else {
            log::warn!("upstream chunk missing phase field");
            return Vec::new();
        };
        let Some(phase) = Phase::parse(phase_str) else {
            log::warn!("unknown upstream phase: {phase_str}");
            return Vec::new();
        };

        let mut frames = Vec::new();

        if self.current_phase != Some(phase) {
            frames.extend(self.flush_answer_buffer());
            log::debug!(
                "phase change: {:?} -> {:?}",
                self.current_phase,
                phase
            );
            self.current_phase = Some(phase);
        }

        match phase {
            Phase::Thinking => self.handle_thinking(chunk, &mut frames),
            Phase::ToolCall => self.handle_tool_call(chunk, &mut frames),
            Phase::Other => self.handle_other(chunk, &mut frames),
            Phase::Answer => self.handle_answer(chunk, &mut frames),
            Phase::Done => self.handle_done(chunk, &mut frames),
        }

        frames
    }

    fn handle_thinking(&mut self, chunk: &UpstreamChunk, frames: &mut Vec<String>) {
        if !self.stream_mode || chunk.delta_content.is_empty() {
            return;
        }
        frames.push(self.content_frame(&chunk.delta_content));
    }

    fn handle_tool_call(&mut self, chunk: &UpstreamChunk, frames: &mut Vec<String>) {
        let events = tool_block::process(&chunk.edit_content, self.tool.is_some());
        for event in events {
            match event {
                ToolEvent::AppendArgs(text) => {
                    if let Some(tool) = self.tool.as_mut() {
                        tool.accumulated_args.push_str(&text);
                    }
                }
                ToolEvent::StartTool(new_tool) => {
                    if let Some(finished) = self.tool.take() {
                        frames.extend(self.finalize_tool(finished, None));
                    }
                    let index = self.next_tool_index;
                    self.next_tool_index += 1;
                    log::debug!(
                        "starting tool id={} name={} index={index}",
                        new_tool.id,
                        new_tool.name
                    );
                    frames.push(self.tool_start_frame(index, &new_tool.id, &new_tool.name));
                    self.tool = Some(ToolState {
                        id: new_tool.id,
                        name: new_tool.name,
                        accumulated_args: new_tool.initial_args,
                        index,
                    });
                }
            }
        }
    }

    fn handle_other(&mut self, chunk: &UpstreamChunk, frames: &mut Vec<String>) {
        if let Some(usage) = &chunk.usage {
            self.usage = Some(usage.clone());
        }

        if self.tool.is_some() && chunk.edit_content.starts_with(TOOL_END_SENTINEL) {
            if let Some(tool) = self.tool.take() {
                frames.extend(self.finalize_tool(tool, self.usage.clone()));
            }
            frames.push(output::DONE.to_string());
            self.stream_ended = true;
        }
    }

    fn handle_answer(&mut self, chunk: &UpstreamChunk, frames: &mut Vec<String>) {
        if chunk.delta_content.is_empty() {
            return;
        }
        self.answer_buffer.push_str(&chunk.delta_content);
        self.buffer_chars = self.answer_buffer.chars().count();

        let should_flush = self.buffer_chars >= FLUSH_CHAR_THRESHOLD
            || self.last_flush_at.elapsed().as_millis() >= FLUSH_MILLIS_THRESHOLD
            || chunk.delta_content.contains('\n')
            || chunk.delta_content.contains(SENTENCE_TERMINATORS);

        if should_flush {
            frames.extend(self.flush_answer_buffer());
        }
    }

    fn handle_done(&mut self, chunk: &UpstreamChunk, frames: &mut Vec<String>) {
        frames.extend(self.flush_answer_buffer());

        if let Some(tool) = self.tool.take() {
            frames.extend(self.finalize_tool(tool, chunk.usage.clone().or_else(|| self.usage.clone())));
        }

        let usage = chunk.usage.clone().or_else(|| self.usage.clone());
        frames.push(output::stop_finish_frame(&self.model_id, self.created(), usage.as_ref()));
        frames.push(output::DONE.to_string());

        self.reset();
    }

    fn finalize_tool(&mut self, tool: ToolState, usage: Option<serde_json::Value>) -> Vec<String> {
        let repaired = repair::repair(&tool.accumulated_args, &tool.name, &self.user_message);
        log_redacted_args(&tool.name, &repaired);
        vec![
            output::tool_args_frame(&self.model_id, self.created(), tool.index, &repaired),
            output::tool_finish_frame(&self.model_id, self.created(), usage.as_ref()),
        ]
    }

    fn content_frame(&mut self, text: &str) -> String {
        let role_pending = !self.role_emitted;
        self.role_emitted = true;
        output::content_frame(&self.model_id, self.created(), text, role_pending)
    }

    fn tool_start_frame(&mut self, index: usize, id: &str, name: &str) -> String {
        let role_pending = !self.role_emitted;
        self.role_emitted = true;
        output::tool_start_frame(&self.model_id, self.created(), index, id, name, role_pending)
    }

    fn flush_answer_buffer(&mut self) -> Vec<String> {
        if self.answer_buffer.is_empty() {
            return Vec::new();
        }
        let text = std::mem::take(&mut self.answer_buffer);
        self.buffer_chars = 0;
        self.last_flush_at = std::time::Instant::now();
        vec![self.content_frame(&text)]
    }

    fn reset(&mut self) {
        self.current_phase = None;
        self.stream_ended = false;
        self.role_emitted = false;
        self.tool = None;
        self.usage = None;
        self.answer_buffer.clear();
        self.buffer_chars = 0;
        self.last_flush_at = std::time::Instant::now();
        self.next_tool_index = 0;
    }
}

fn log_redacted_args(tool_name: &str, repaired_args: &str) {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(repaired_args) else {
        return;
    };
    if let Some(obj) = value.as_object_mut() {
        for key in SENSITIVE_ARG_KEYS {
            if let Some(v) = obj.get_mut(*key) {
                *v = serde_json::Value::String("<redacted>".to_string());
            }
        }
    }
    log::debug!(
        "tool {tool_name} finalized args: {}",
        truncate_for_log(&value.to_string(), 500)
    );
}
