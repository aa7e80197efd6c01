//! Heuristic filename extraction from the user's prior message, used to
//! synthesize a missing `file_path`/`path` argument for file-writing tools
//! (spec §4.5).

use regex::Regex;
use std::sync::OnceLock;

const INTERRUPT_MARKERS: &[&str] = &[
    "[Request interrupted by user]",
    "[CANCELLED]",
    "[STOPPED]",
];

const EXT_ALTERNATION: &str =
    "html|js|css|txt|md|json|xml|py|java|cpp|c|h|go|rs|php|rb|sh|bat|sql|yaml|yml";

struct Patterns {
    intent_verb: Regex,
    bare_name: Regex,
    named_called: Regex,
    general_fallback: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        intent_verb: Regex::new(&format!(
            r#"(?i)(?:create|new|generate|write|save|file name:\s*)\s*([a-zA-Z0-9_\-]+\.(?:{EXT_ALTERNATION}))"#
        ))
        .expect("static pattern compiles"),
        bare_name: Regex::new(&format!(
            r#"(?i)\b([a-zA-Z0-9_\-]+\.(?:{EXT_ALTERNATION}))\b(?:\s*file)?"#
        ))
        .expect("static pattern compiles"),
        named_called: Regex::new(&format!(
            r#"(?i)(?:named|called)\s+([a-zA-Z0-9_\-]+\.(?:{EXT_ALTERNATION}))"#
        ))
        .expect("static pattern compiles"),
        general_fallback: Regex::new(r"\b([a-zA-Z0-9_\-]+\.[a-zA-Z0-9]{1,4})\b")
            .expect("static pattern compiles"),
    })
}

const KEYWORD_MAP: &[(&str, &str)] = &[
    ("login", "login.html"),
    ("signup", "register.html"),
    ("register", "register.html"),
    ("home", "index.html"),
    ("index", "index.html"),
    ("about", "about.html"),
    ("contact", "contact.html"),
];

/// Extract a plausible filename from `user_message`, or `""` if none found.
///
/// Ordering matters: a user saying "create test.html for my login page"
/// must yield `test.html`, not `login.html` — the explicit-name patterns
/// are tried before the keyword fallback.
pub fn infer(user_message: &str) -> String {
    if user_message.is_empty() {
        return String::new();
    }

    let mut cleaned = user_message.to_string();
    for marker in INTERRUPT_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return String::new();
    }

    let p = patterns();

    for re in [&p.intent_verb, &p.bare_name, &p.named_called] {
        if let Some(caps) = re.captures(cleaned) {
            if let Some(m) = caps.get(1) {
                log::debug!("filename inference matched: {}", m.as_str());
                return m.as_str().to_string();
            }
        }
    }

    if let Some(caps) = p.general_fallback.captures(cleaned) {
        if let Some(m) = caps.get(1) {
            log::debug!("filename inference fallback matched: {}", m.as_str());
            return m.as_str().to_string();
        }
    }

    let lower = cleaned.to_lowercase();
    for (keyword, filename) in KEYWORD_MAP {
        if lower.contains(keyword) {
            log::debug!("filename inference keyword match: {keyword} -> {filename}");
            return filename.to_string();
        }
    }

    log::debug!("filename inference found nothing in: {}", crate::error::truncate_for_log(cleaned, 100));
    String::new()
}
