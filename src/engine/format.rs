//! Post-processing for generated replies before they are published.

use super::normalize::strip_mentions;
use crate::config::ResponseConfig;

/// Hashtags the configured topics in generated text and strips mentions.
#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    topic: String,
    secondary_topic: Option<String>,
}

impl ResponseFormatter {
    pub fn new(topic: impl Into<String>, secondary_topic: Option<String>) -> Self {
        Self {
            topic: topic.into(),
            secondary_topic: secondary_topic.filter(|t| !t.is_empty()),
        }
    }

    pub fn from_config(config: &ResponseConfig) -> Self {
        Self::new(config.topic.clone(), config.secondary_topic.clone())
    }

    /// Format a generated reply.
    ///
    /// The required topic is always present afterwards: existing occurrences
    /// are turned into hashtags, otherwise ` #topic` is appended. The secondary
    /// topic is only hashtagged where it already occurs. Mentions are removed
    /// last. The result may exceed the platform length limit.
    pub fn format(&self, generated: &str) -> String {
        let mut text = if generated.contains(self.topic.as_str()) {
            hashtag_occurrences(generated, &self.topic)
        } else {
            format!("{} #{}", generated, self.topic)
        };

        if let Some(secondary) = &self.secondary_topic {
            if text.contains(secondary.as_str()) {
                text = hashtag_occurrences(&text, secondary);
            }
        }

        strip_mentions(&text)
    }
}

/// Prefix every occurrence of `token` with `#`, skipping ones already tagged.
///
/// Deliberately never produces `##token`: an occurrence already tagged is
/// kept as is. Learned text has `#` stripped, so the bundled learner never
/// hits this case.
fn hashtag_occurrences(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for (idx, _) in text.match_indices(token) {
        out.push_str(&text[last..idx]);
        if !text[..idx].ends_with('#') {
            out.push('#');
        }
        out.push_str(token);
        last = idx + token.len();
    }
    out.push_str(&text[last..]);
    out
}
