//! Card and topic types shared across the pipeline.
//!
//! A flashcard is one of exactly two shapes, and everything downstream of the
//! parser matches on the enum exhaustively. Modelling this as a sum type
//! (rather than optional fields on one struct) makes "a cloze card has no
//! front" unrepresentable instead of merely unvalidated.
//!
//! The serde representation uses an internal `"type"` tag with lowercase
//! variant names, which is the same shape well-behaved model replies use:
//!
//! ```json
//! {"type": "basic", "front": "…", "back": "…"}
//! {"type": "cloze", "text": "… {{c1::…}} …"}
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Anki cloze marker: `{{c1::hidden term}}` (optionally `{{c2::…}}` etc.).
///
/// The capture group is the marker's inner content, including any
/// `answer::hint` suffix Anki allows.
pub(crate) static CLOZE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c\d+::(.+?)\}\}").unwrap());

/// A single flashcard.
///
/// Produced by the card parser, validated and deduplicated by the quality
/// engine, and consumed by a [`crate::export::DeckWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Card {
    /// Question/answer card: a prompt on the front, the answer on the back.
    Basic {
        front: String,
        back: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
    /// Fill-in-the-blank card: one sentence with `{{cN::…}}` markers hiding
    /// the terms under review.
    Cloze {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
}

impl Card {
    /// The topic this card was assigned during topic-aware generation, if any.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Card::Basic { topic, .. } | Card::Cloze { topic, .. } => topic.as_deref(),
        }
    }

    /// True for [`Card::Basic`].
    pub fn is_basic(&self) -> bool {
        matches!(self, Card::Basic { .. })
    }

    /// True for [`Card::Cloze`].
    pub fn is_cloze(&self) -> bool {
        matches!(self, Card::Cloze { .. })
    }
}

/// Whether `text` contains at least one well-formed cloze marker.
pub fn has_cloze_marker(text: &str) -> bool {
    CLOZE_MARKER.is_match(text)
}

/// Replace each cloze marker with its inner content.
///
/// `"{{c1::ATP}} fuels the cell"` becomes `"ATP fuels the cell"`, so two
/// clozes testing the same fact with different marker wrapping compare equal.
pub fn strip_cloze_markers(text: &str) -> String {
    CLOZE_MARKER.replace_all(text, "$1").into_owned()
}

/// A document topic used to constrain topic-aware generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Remove near-duplicate topics by Jaccard similarity on lowercased names.
///
/// The first occurrence wins; later similar names are dropped. 0.45 is a
/// looser threshold than card dedup uses because topic names are short and
/// a single shared word ("Monetary Policy" / "Fiscal Policy" share one of
/// three tokens = 0.33) should not collide.
pub fn dedup_topics(topics: Vec<Topic>, threshold: f64) -> Vec<Topic> {
    let mut seen: Vec<String> = Vec::new();
    let mut unique = Vec::new();
    for topic in topics {
        let key = topic.name.to_lowercase();
        if !seen
            .iter()
            .any(|s| crate::pipeline::similarity::jaccard(&key, s) >= threshold)
        {
            seen.push(key);
            unique.push(topic);
        }
    }
    unique
}
