//! Stage 2 of the repair pipeline (spec'd ahead of a generic JSON repair
//! pass): textual fixes for malformations a general-purpose repairer
//! mishandles.

use std::sync::OnceLock;

use regex::Regex;

static STRAY_ESCAPED_QUOTE: OnceLock<Regex> = OnceLock::new();

fn stray_escaped_quote_re() -> &'static Regex {
    STRAY_ESCAPED_QUOTE.get_or_init(|| {
        Regex::new(r#"([^\\])\\"([},\s])"#).expect("static pattern compiles")
    })
}

pub(super) fn preprocess(raw: &str) -> String {
    let s = raw.trim();

    let with_opening_brace = if !s.starts_with('{') && s.ends_with('}') {
        format!("{{{s}")
    } else {
        s.to_string()
    };

    stray_escaped_quote_re()
        .replace_all(&with_opening_brace, "$1\"$2")
        .to_string()
}
