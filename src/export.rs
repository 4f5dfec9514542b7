//! Deck export seam: topic grouping plus the package-writer trait.
//!
//! `.apkg` serialisation is a format of its own (an SQLite database in a
//! zip) and lives outside this crate. The pipeline's responsibility ends at
//! a clean card list and, for topic-aware builds, its grouping into
//! per-topic sub-decks; a [`DeckWriter`] implementation turns either into
//! opaque deck bytes.

use crate::card::Card;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The cards destined for one topic sub-deck.
///
/// Writers name sub-decks `base::topic` — the `::` hierarchy notation deck
/// applications use for nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDeck {
    pub topic: String,
    pub cards: Vec<Card>,
}

/// Result of splitting a card list along the allowed-topic list.
#[derive(Debug, Clone, Default)]
pub struct TopicGrouping {
    /// One entry per allowed topic that received at least one card, in the
    /// allowed list's order.
    pub decks: Vec<TopicDeck>,
    /// Cards whose topic tag matched no allowed topic (or was missing).
    /// Reported to the user, not exported.
    pub unassigned: Vec<Card>,
}

/// Split cards into per-topic decks along the allowed-topic list.
///
/// Matching is exact first, then case-insensitive; a card that matches
/// neither way lands in `unassigned`. Topics keep the caller's order, and
/// topics that received no card are omitted entirely (the caller decides
/// whether an empty topic is worth a warning).
pub fn group_by_topic(cards: Vec<Card>, allowed: &[String]) -> TopicGrouping {
    let mut buckets: Vec<Vec<Card>> = allowed.iter().map(|_| Vec::new()).collect();
    let mut unassigned: Vec<Card> = Vec::new();

    for card in cards {
        let slot = card.topic().and_then(|topic| {
            allowed
                .iter()
                .position(|a| a == topic)
                .or_else(|| allowed.iter().position(|a| a.eq_ignore_ascii_case(topic)))
        });
        match slot {
            Some(i) => buckets[i].push(card),
            None => unassigned.push(card),
        }
    }

    let decks = allowed
        .iter()
        .zip(buckets)
        .filter(|(_, cards)| !cards.is_empty())
        .map(|(topic, cards)| TopicDeck { topic: topic.clone(), cards })
        .collect();

    TopicGrouping { decks, unassigned }
}

/// Failure while producing deck bytes.
#[derive(Debug, Error)]
#[error("deck packaging failed: {0}")]
pub struct DeckWriteError(pub String);

/// Produces importable deck packages from filtered cards.
///
/// Implementations own the package format entirely (note models, styling,
/// stable deck identifiers); this crate only hands over content. Both
/// methods return the raw bytes of one package file.
pub trait DeckWriter: Send + Sync {
    /// Package a flat card list as a single deck named `deck_name`.
    fn write_deck(&self, cards: &[Card], deck_name: &str) -> Result<Vec<u8>, DeckWriteError>;

    /// Package per-topic decks as sub-decks of `base_name`
    /// (`base_name::topic`), all in one file.
    fn write_topic_decks(
        &self,
        decks: &[TopicDeck],
        base_name: &str,
    ) -> Result<Vec<u8>, DeckWriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, topic: Option<&str>) -> Card {
        Card::Basic {
            front: front.into(),
            back: "An adequate answer.".into(),
            topic: topic.map(String::from),
        }
    }

    #[test]
    fn groups_follow_allowed_topic_order() {
        let allowed = vec!["Metabolism".to_string(), "Genetics".to_string()];
        let cards = vec![
            card("Q1?", Some("Genetics")),
            card("Q2?", Some("Metabolism")),
            card("Q3?", Some("Genetics")),
        ];
        let grouping = group_by_topic(cards, &allowed);
        let names: Vec<_> = grouping.decks.iter().map(|d| d.topic.as_str()).collect();
        assert_eq!(names, vec!["Metabolism", "Genetics"]);
        assert_eq!(grouping.decks[1].cards.len(), 2);
        assert!(grouping.unassigned.is_empty());
    }

    #[test]
    fn case_insensitive_match_recovers_miscased_tags() {
        let allowed = vec!["Monetary Policy".to_string()];
        let cards = vec![card("Q1?", Some("monetary policy"))];
        let grouping = group_by_topic(cards, &allowed);
        assert_eq!(grouping.decks.len(), 1);
        assert_eq!(grouping.decks[0].topic, "Monetary Policy");
    }

    #[test]
    fn unknown_or_missing_topics_go_to_unassigned() {
        let allowed = vec!["Metabolism".to_string()];
        let cards = vec![
            card("Q1?", Some("Astrology")),
            card("Q2?", None),
            card("Q3?", Some("Metabolism")),
        ];
        let grouping = group_by_topic(cards, &allowed);
        assert_eq!(grouping.decks.len(), 1);
        assert_eq!(grouping.unassigned.len(), 2);
    }

    #[test]
    fn empty_topics_are_omitted() {
        let allowed = vec!["Covered".to_string(), "Uncovered".to_string()];
        let cards = vec![card("Q1?", Some("Covered"))];
        let grouping = group_by_topic(cards, &allowed);
        assert_eq!(grouping.decks.len(), 1);
        assert_eq!(grouping.decks[0].topic, "Covered");
    }
}
