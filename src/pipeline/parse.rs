//! Card parsing: recover a card list from a free-form model reply.
//!
//! Model output is untrusted input. Even when asked for a bare JSON object,
//! replies arrive wrapped in code fences, with the card array under
//! different key names (models answering in another language localise the
//! key), nested one level deep, or as a bare top-level array. Parsing is
//! therefore defensive in layers: strip the fence noise, parse, then try a
//! fixed sequence of extraction strategies until one yields an array.
//!
//! A reply that defeats every layer yields an empty list, never an error —
//! one malformed reply costs its chunk, not the deck.

use crate::card::Card;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Code-fence openings/closings, with or without a language tag.
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\s*").unwrap());

/// Wrapper keys a card array is expected under, in trust order. The
/// non-English entries cover models that localise the key when prompted to
/// answer in another language.
const WRAPPER_KEYS: [&str; 6] = ["cards", "flashcards", "karten", "anki_cards", "data", "items"];

/// Parse the model reply into cards.
///
/// When `topic_aware` is set, a non-empty `"topic"` field is carried onto
/// each card; otherwise topic fields are ignored entirely. Items that fit
/// neither card shape are discarded. Total: any input yields a (possibly
/// empty) list.
pub fn parse_cards(raw: &str, topic_aware: bool) -> Vec<Card> {
    let Some(value) = parse_json_payload(raw) else {
        debug!("Model reply was not parseable JSON; dropping batch");
        return Vec::new();
    };

    let Some(items) = extract_card_array(&value) else {
        debug!("Model reply contained no card array; dropping batch");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| classify_item(item, topic_aware))
        .collect()
}

/// Strip fence noise and parse the reply as JSON, with a brace-window
/// retry: many replies are valid JSON surrounded by prose, so the span
/// from the first `{` to the last `}` gets a second chance.
fn parse_json_payload(raw: &str) -> Option<Value> {
    let cleaned = RE_FENCE.replace_all(raw, "");
    let cleaned = cleaned.trim().trim_end_matches('`').trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&cleaned[start..=end]).ok()
}

/// Extraction strategies, tried in order until one matches.
fn extract_card_array(value: &Value) -> Option<&Vec<Value>> {
    const STRATEGIES: [fn(&Value) -> Option<&Vec<Value>>; 3] =
        [top_level_array, known_wrapper_key, first_array_value];
    STRATEGIES.iter().find_map(|strategy| strategy(value))
}

/// The payload is directly the card array.
fn top_level_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

/// The payload is a wrapper object with the array under a recognised key.
fn known_wrapper_key(value: &Value) -> Option<&Vec<Value>> {
    WRAPPER_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_array))
}

/// Last resort: the first array-valued entry of a wrapper object.
fn first_array_value(value: &Value) -> Option<&Vec<Value>> {
    value.as_object()?.values().find_map(Value::as_array)
}

/// Classify one reply item as a card, or discard it.
///
/// An item is a cloze card when it declares `"type": "cloze"` or has a
/// `"text"` field without a `"front"` field — provided the text actually
/// contains a cloze marker. Otherwise a non-empty front/back pair makes a
/// question/answer card. Everything else is dropped.
fn classify_item(item: &Value, topic_aware: bool) -> Option<Card> {
    let obj = item.as_object()?;

    let topic = if topic_aware {
        obj.get("topic")
            .and_then(coerce_str)
            .filter(|t| !t.is_empty())
    } else {
        None
    };

    let declares_cloze = obj.get("type").and_then(Value::as_str) == Some("cloze");
    if declares_cloze || (obj.contains_key("text") && !obj.contains_key("front")) {
        let text = obj.get("text").and_then(coerce_str)?;
        if !text.is_empty() && text.contains("{{c") {
            return Some(Card::Cloze { text, topic });
        }
        return None;
    }

    let front = obj.get("front").and_then(coerce_str)?;
    let back = obj.get("back").and_then(coerce_str)?;
    if front.is_empty() || back.is_empty() {
        return None;
    }
    Some(Card::Basic { front, back, topic })
}

/// Trimmed string form of a scalar JSON value; composites are rejected.
fn coerce_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
