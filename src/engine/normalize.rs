//! Cleans raw feed text before it is learned from or replied to.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dropped outright, before any pattern pass runs.
const STRIPPED_CHARS: [char; 10] = ['#', '(', ')', '|', '♥', '"', '“', '”', '[', ']'];

static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

static RE_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\S+").unwrap());

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[^;]*;").unwrap());

/// Normalize raw post text.
///
/// Newlines become spaces, the stripped character set is removed, then URLs,
/// @-mentions and `&...;` entities are cut out. Finally leading and trailing
/// plain spaces are trimmed (tabs and other whitespace survive).
///
/// The pattern passes repeat until nothing changes, so a removal that splices
/// two fragments into a new URL or mention is caught too. This keeps
/// `normalize(normalize(s)) == normalize(s)` for every input.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.replace('\n', " ");
    text.retain(|c| !STRIPPED_CHARS.contains(&c));

    loop {
        let next = strip_patterns(&text);
        if next == text {
            break;
        }
        text = next;
    }

    text.trim_matches(' ').to_string()
}

/// Remove every `@`-prefixed run up to the next whitespace.
pub fn strip_mentions(text: &str) -> String {
    RE_MENTION.replace_all(text, "").into_owned()
}

fn strip_patterns(text: &str) -> String {
    let text = RE_URL.replace_all(text, "");
    let text = RE_MENTION.replace_all(&text, "");
    RE_ENTITY.replace_all(&text, "").into_owned()
}
