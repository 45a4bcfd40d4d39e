//! Post-injection placeholder repair.

use once_cell::sync::Lazy;
use regex::Regex;

static OPEN_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{{3,}").unwrap());
static CLOSE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\}{3,}").unwrap());
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// Repair brace runs (`{{{` → `{{`, `}}}` → `}}`) and collapse immediate
/// repeats of the same token (`{{a}}{{a}}` → `{{a}}`). Idempotent.
pub fn cleanup_placeholders(xml: &str) -> String {
    let repaired = OPEN_RUN_RE.replace_all(xml, "{{");
    let repaired = CLOSE_RUN_RE.replace_all(&repaired, "}}");
    collapse_repeats(&repaired)
}

fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut previous: Option<(usize, &str)> = None;

    for cap in TOKEN_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let name = name.as_str();
        if let Some((prev_end, prev_name)) = previous {
            if prev_end == whole.start() && prev_name == name {
                out.push_str(&text[copied_to..whole.start()]);
                copied_to = whole.end();
            }
        }
        previous = Some((whole.end(), name));
    }

    out.push_str(&text[copied_to..]);
    out
}
