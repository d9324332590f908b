use serde::{Deserialize, Serialize};

/// Rich text shown to the learner: question bodies, feedback, hints and
/// solution explanations.
///
/// `content_id` identifies the piece of content for translation/voiceover
/// lookups; it may be empty for synthesized content such as default feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub content_id: String,
    pub html: String,
}

impl Content {
    pub fn new(content_id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            html: html.into(),
        }
    }

    /// Content without an id, e.g. feedback built on the fly.
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            content_id: String::new(),
            html: html.into(),
        }
    }

    /// Empty content, used when no feedback applies.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}
