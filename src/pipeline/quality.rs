//! Quality control: validate card structure and drop near-duplicates.
//!
//! Generation over overlapping material produces two kinds of junk: cards
//! that are structurally fine but too thin to be worth reviewing ("What is
//! X?" → "X."), and rewordings of a card an earlier chunk already produced.
//! The first is handled by minimum-length validation, the second by a
//! token-set similarity scan against everything already kept — earlier
//! cards win, because chunk order follows page order and the first
//! occurrence of a fact is usually its definition.
//!
//! The scan is O(n²) in kept cards per variant. Realistic decks hold tens
//! to low hundreds of cards, where the quadratic cost is microseconds; a
//! bucketed similarity index would only pay off at orders of magnitude more
//! cards.

use crate::card::{has_cloze_marker, strip_cloze_markers, Card};
use crate::pipeline::similarity::jaccard;
use tracing::debug;

/// Minimum character count for a question front.
const MIN_FRONT_CHARS: usize = 12;
/// Minimum character count for an answer back.
const MIN_BACK_CHARS: usize = 10;
/// Minimum character count for a cloze sentence.
const MIN_CLOZE_CHARS: usize = 20;

/// Validate, normalise, and near-duplicate-filter a card batch.
///
/// The two variants are processed independently and concatenated:
/// question/answer cards first, then cloze cards (a fixed convention, not a
/// ranking). Within each variant the original order is preserved, and when
/// two cards are near-duplicates the earlier one is kept.
///
/// Character counts are Unicode scalar counts. Cards are rebuilt with
/// trimmed fields rather than mutated. Total: invalid cards are dropped
/// silently and the result may be empty.
pub fn filter_and_deduplicate(cards: Vec<Card>, threshold: f64) -> Vec<Card> {
    let mut basic: Vec<(String, Card)> = Vec::new();
    let mut cloze: Vec<(String, Card)> = Vec::new();

    for card in cards {
        match card {
            Card::Basic { front, back, topic } => {
                let front = front.trim().to_string();
                let back = back.trim().to_string();
                if front.chars().count() >= MIN_FRONT_CHARS
                    && back.chars().count() >= MIN_BACK_CHARS
                {
                    let key = front.to_lowercase();
                    basic.push((key, Card::Basic { front, back, topic: trim_topic(topic) }));
                } else {
                    debug!("Dropping under-length basic card: {:?}", front);
                }
            }
            Card::Cloze { text, topic } => {
                let text = text.trim().to_string();
                if text.chars().count() >= MIN_CLOZE_CHARS && has_cloze_marker(&text) {
                    // The key strips markers down to their answer terms, so
                    // two clozes testing the same fact with different
                    // marker wrapping still collide.
                    let key = strip_cloze_markers(&text).to_lowercase();
                    cloze.push((key, Card::Cloze { text, topic: trim_topic(topic) }));
                } else {
                    debug!("Dropping malformed cloze card: {:?}", text);
                }
            }
        }
    }

    let mut kept = dedup_by_key(basic, threshold);
    kept.extend(dedup_by_key(cloze, threshold));
    kept
}

fn trim_topic(topic: Option<String>) -> Option<String> {
    topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Keep each card whose key is not Jaccard-similar to any earlier kept key.
fn dedup_by_key(cards: Vec<(String, Card)>, threshold: f64) -> Vec<Card> {
    let mut seen: Vec<String> = Vec::new();
    let mut unique: Vec<Card> = Vec::new();

    for (key, card) in cards {
        if seen.iter().any(|s| jaccard(&key, s) >= threshold) {
            debug!("Dropping near-duplicate card: {:?}", key);
        } else {
            seen.push(key);
            unique.push(card);
        }
    }

    unique
}
