//! Text normalisation: deterministic cleanup of raw page text.
//!
//! Raw text from a PDF text layer (or assembled from OCR detections) carries
//! artefacts that hurt both chunking and generation: page-number lines break
//! word counts, hyphenated line wraps split words the model then treats as
//! two tokens, and runaway whitespace inflates chunks. This module applies a
//! fixed sequence of cheap regex/string rules that fix those artefacts
//! without touching content. Each rule is independently testable.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order: line endings are unified before
//! the line-anchored page-number rule, blank-line collapsing runs before
//! horizontal-whitespace collapsing so indentation of surviving lines is
//! handled uniformly, and de-hyphenation runs after whitespace cleanup so
//! the `-\n` pattern is not masked by trailing spaces.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines consisting solely of 1–4 digits: page-number artefacts.
static RE_PAGE_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d{1,4}[ \t]*$").unwrap());

/// Three or more consecutive newlines.
static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Runs of two or more horizontal whitespace characters (newlines untouched).
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// A hyphen at line end followed by a lowercase letter: a word split by the
/// typesetter. `\p{Ll}` covers extended Latin (ä, é, ß, …), not just ASCII.
static RE_LINE_BREAK_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\n(\p{Ll})").unwrap());

/// Clean raw extracted text.
///
/// Total and deterministic: never fails, and the worst case (input that is
/// all artefacts) returns an empty string. Applied to every page before it
/// reaches the chunker, so downstream stages can assume whitespace-clean,
/// de-hyphenated text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Delete lines that are just 1–4 digits (page numbers)
/// 3. Collapse 3+ consecutive newlines down to 2
/// 4. Collapse runs of spaces/tabs to a single space
/// 5. Rejoin words split by a line-break hyphen before a lowercase letter
/// 6. Trim leading/trailing whitespace
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = RE_PAGE_NUMBER_LINE.replace_all(&text, "");
    let text = RE_EXCESS_NEWLINES.replace_all(&text, "\n\n");
    let text = RE_HORIZONTAL_WS.replace_all(&text, " ");
    let text = RE_LINE_BREAK_HYPHEN.replace_all(&text, "$1");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn removes_page_number_lines() {
        let input = "Chapter One\n42\nThe text continues.";
        let result = normalize(input);
        assert!(!result.contains("42"));
        assert!(result.contains("Chapter One"));
        assert!(result.contains("The text continues."));
    }

    #[test]
    fn keeps_digit_runs_inside_sentences() {
        let input = "The year 1848 saw 42 revolutions.";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn keeps_five_digit_lines() {
        // Five digits are more likely a ZIP code or a figure than page 10000.
        let input = "before\n12345\nafter";
        assert_eq!(normalize(input), "before\n12345\nafter");
    }

    #[test]
    fn collapses_excess_newlines_to_two() {
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn collapses_horizontal_whitespace_only() {
        assert_eq!(normalize("a   b\t\tc\nd"), "a b c\nd");
    }

    #[test]
    fn rejoins_hyphenated_line_breaks() {
        assert_eq!(normalize("experi-\nment"), "experiment");
        // Extended Latin lowercase after the hyphen
        assert_eq!(normalize("Zusammen-\nhänge"), "Zusammenhänge");
    }

    #[test]
    fn keeps_hyphen_before_uppercase() {
        // "Maxwell-\nBoltzmann" is a compound name, not a split word.
        assert_eq!(normalize("Maxwell-\nBoltzmann"), "Maxwell-\nBoltzmann");
    }

    #[test]
    fn trims_and_tolerates_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n \t \n "), "");
        assert_eq!(normalize("  text  "), "text");
    }

    #[test]
    fn page_number_line_leaves_no_triple_blank() {
        // Deleting the digits leaves an empty line, which the newline
        // collapse then caps at one blank line.
        let input = "end of section.\n\n17\n\nstart of section.";
        let result = normalize(input);
        assert_eq!(result, "end of section.\n\nstart of section.");
    }
}
