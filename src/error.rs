/// Truncate a string at a safe char boundary no later than `max` bytes.
///
/// Used when logging offending upstream payloads so a malformed multi-byte
/// sequence never gets logged mid-character.
pub(crate) fn truncate_for_log(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Errors the core can raise while handling a single upstream chunk.
///
/// Every variant is caught and logged at the dispatcher boundary
/// (`Session::consume`); none of them ever abort a session or propagate to
/// the downstream client as an HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A `<glm_block>` segment's JSON payload failed to parse, or its
    /// `data.metadata` object was missing required fields.
    #[error("malformed glm_block payload: {0}")]
    MalformedToolBlock(String),
}

impl CoreError {
    pub(crate) fn malformed_block(payload: &str) -> Self {
        CoreError::MalformedToolBlock(truncate_for_log(payload, 1024).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_for_log("hello", 10), "hello");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "a".repeat(5) + "用户" + &"b".repeat(5);
        let truncated = truncate_for_log(&s, 6);
        assert!(s.is_char_boundary(truncated.len()));
        assert!(truncated.len() <= 6);
    }
}
