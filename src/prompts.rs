//! Prompt text for flashcard generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing generation behaviour (e.g.
//!    tightening the atomicity rule or adding a forbidden pattern) requires
//!    editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect assembled prompts directly
//!    without a live provider, so prompt regressions (a dropped block, a
//!    mangled format instruction) are caught cheaply.
//!
//! The system prompt is assembled from independent blocks so the three card
//! modes share their quality rules verbatim instead of drifting apart in
//! three near-copies. The language instruction is appended last, where it
//! overrides any default tendency of the model.

use crate::config::{AnswerFormat, CardKind};

/// Role framing shared by every generation call.
const ROLE: &str = "You are an expert in learning materials and exam preparation. \
Your sole task: create high-quality Anki flashcards from academic texts.";

const QUALITY: &str = "\
━━━ QUALITY PRINCIPLES ━━━
• Only exam-relevant content — no trivial facts
• Each card tests EXACTLY ONE specific, atomic concept — never a list, never multiple aspects
• ONE question → ONE precise answer, not an enumeration of items
• Questions: specific and action-oriented (Why? How exactly? What is the difference between X and Y?)
• Prefer conceptual understanding over pure fact recall
• For formulas/algorithms: state the meaning of variables and the use case
• For comparisons: name ONE concrete difference per card, not all differences at once";

const SELF_CONTAINED: &str = "\
━━━ SELF-CONTAINED CARDS (HARD RULE — applies to EVERY card) ━━━
Every question must be 100% understandable WITHOUT reading the source document.
A student who has NEVER seen this PDF must be able to fully understand and answer the question.
ALL necessary context must be inside the question itself — never assume the reader has any background.

STRICTLY FORBIDDEN in questions AND answers:
✗ \"the method\", \"the algorithm\", \"the institution\", \"the model\", \"the formula\" — always name it explicitly
✗ \"in this text\", \"according to the author\", \"as described above\", \"in the document\"
✗ \"this approach\", \"the process\", \"the concept\" without stating what it is
✗ Any unnamed pronoun or reference that requires reading the source to decode

REQUIRED: Every concept, person, institution, algorithm, formula, and mechanism must be NAMED.

Self-check before writing each question: \"Could someone answer this without the PDF?\"
  NO  → Add the missing name/context to the question itself, then ask again
  YES → Proceed

BAD:  \"What is the advantage of the method over the baseline?\"
GOOD: \"What is the key advantage of Transformer self-attention over LSTM recurrent connections for long sequences?\"
BAD:  \"What are the conditions for the theorem to hold?\"
GOOD: \"What are the two conditions required for the Central Limit Theorem (CLT) to apply?\"
BAD:  \"How does the institution regulate the market?\"
GOOD: \"How does the European Central Bank (ECB) regulate the money supply through open market operations?\"";

const FORBIDDEN: &str = "\
━━━ FORBIDDEN ━━━
✗ Chapter headings, author names, page numbers
✗ Yes/no questions or trivial definitions (\"What is X?\" → \"X is a …\")
✗ Pure facts without learning value (dates without context)
✗ Redundant or very similar cards
✗ OVERVIEW / LIST questions — these are the most common mistake, strictly forbidden:
  - \"What are the main X and their functions?\"
  - \"Name all Y of Z.\"
  - \"What are the key components/institutions/elements of X?\"
  - \"What are the central X and what do they do?\"
  - Any question where the answer would require listing 3+ separate items
  → INSTEAD: create one dedicated card per item/concept.";

const ATOMICITY: &str = "\
━━━ ATOMICITY RULE (strictly enforced) ━━━
A card is atomic when its answer contains EXACTLY ONE independent, indivisible fact.
Every independent fact must become its own card — no exceptions.

VIOLATION — do NOT create this:
  Q: \"How is the European Parliament elected?\"
  A: \"• Directly by citizens  • Every five years  • By proportional representation\"
  WHY: Three independent facts. Remove any one bullet → answer is still complete → NOT atomic.

CORRECT — create three separate cards instead:
  Q: \"Who elects the European Parliament?\"                     A: \"Directly by EU citizens.\"
  Q: \"How often are European Parliament elections held?\"       A: \"Every five years.\"
  Q: \"What electoral system applies to the European Parliament?\"  A: \"Proportional representation.\"

ATOMICITY TEST (apply before finalising every card):
  Remove one sentence or bullet from the answer.
  • If the remaining answer is still complete → card is NOT atomic → split it.
  • If the remaining answer is incomplete/broken → card IS atomic → keep it.";

const EXHAUSTIVE: &str = "\
━━━ CARD VOLUME: BE EXHAUSTIVE ━━━
Your goal is MAXIMUM COVERAGE — extract as many high-quality cards as possible from the text.
Systematically work through every paragraph and cover every concept, definition, mechanism,
formula, comparison, cause/effect relationship, condition, exception, and exam-relevant fact.
Do NOT skip a concept because it seems minor — if it appears in the text, it deserves a card.
A thorough pass over 4–5 pages should produce at least 15–25 cards.";

// ── Answer-format blocks (basic cards) ───────────────────────────────────

const ANSWERS_SENTENCES: &str = "Answers: 1–2 concise sentences maximum — straight to the point, \
no filler text. If an answer needs more than 2 sentences, split it into multiple cards.";

const ANSWERS_BULLETS: &str = "\
━━━ ANSWER FORMAT: BULLET POINTS — MANDATORY, NO EXCEPTIONS ━━━
EVERY answer field MUST consist exclusively of bullet points starting with \"• \".
Prose sentences in the answer are strictly forbidden — even for a single fact.

Rules:
• 1–3 bullets per card — if you need more than 3, the question is too broad → split it
• Each bullet: one tight fact, mechanism, or term — no filler words
• Even a one-fact answer must be a single bullet: \"• [the fact]\"

CORRECT:
  Q: \"Who elects the members of the European Parliament?\"
  A: \"• Directly by EU citizens in each member state.\"
  Q: \"What does the softmax function output?\"
  A: \"• A probability distribution over all output classes that sums to 1.\"

WRONG (forbidden prose):
  A: \"The European Parliament is elected directly by EU citizens.\"
  A: \"Softmax converts raw logits into a normalized probability distribution.\"";

// ── Card-format blocks ───────────────────────────────────────────────────

const FORMAT_BASIC: &str = "\
━━━ CARD FORMAT: Basic (Question–Answer) ━━━
Each card: a clear question as \"front\" and a concise answer as \"back\".

GOOD  \"Why is X preferred over Y in scenario Z?\"  → \"X is preferred because …\"
GOOD  \"What is the role of the X in process Y?\"   → \"The X is responsible for …\"
GOOD  \"How does mechanism X achieve Y?\"            → \"X achieves Y by …\"

BAD   \"What are the main institutions of X and their functions?\"
      → Too broad. Create one card per institution instead.
BAD   \"What are the key features of X?\"
      → Too vague. Ask about one specific feature per card.

OUTPUT: {\"cards\": [{\"front\": \"Question\", \"back\": \"Answer\"}, …]}";

const FORMAT_CLOZE: &str = "\
━━━ CARD FORMAT: Cloze (Fill-in-the-blank) ━━━
Complete, informative sentences — mark the key term with {{c1::term}}.
Rules:
• Mark only the core term, never whole phrases
• Optional additional blanks in the same sentence: {{c2::term}}, {{c3::term}}
• The sentence must still be informative without the blank
Good:  \"{{c1::Oxidative phosphorylation}} produces approximately {{c2::30}} ATP per glucose.\"
Bad:   \"{{c1::Mitochondria are the powerhouse of the cell.}}\" (too much marked)
Bad:   \"X is {{c1::important}}.\" (too trivial)
OUTPUT: {\"cards\": [{\"text\": \"Sentence with {{c1::blank}}\"}, …]}";

const FORMAT_BOTH: &str = "\
━━━ CARD FORMAT: Mixed (auto-select) ━━━
Choose the optimal type per piece of content:
• Basic  → concepts, processes, comparisons, explanations
  {\"type\": \"basic\", \"front\": \"Question\", \"back\": \"Answer\"}
• Cloze  → key terms, definitions, formulas to memorize
  {\"type\": \"cloze\", \"text\": \"Sentence with {{c1::blank}}\"}
Cloze rules: mark only the core term, never whole phrases.
Target ratio: ~55% Basic, ~45% Cloze.
OUTPUT: {\"cards\": [{\"type\": \"basic\", \"front\": \"…\", \"back\": \"…\"}, {\"type\": \"cloze\", \"text\": \"…{{c1::…}}…\"}, …]}";

// ── Assembly ─────────────────────────────────────────────────────────────

/// Assemble the system prompt for one generation call.
///
/// Block order matters: the format block comes after the quality rules it
/// must satisfy, and the language instruction is always last.
pub fn build_system_prompt(kind: CardKind, answer_format: AnswerFormat, language: &str) -> String {
    let answers = match answer_format {
        AnswerFormat::Sentences => ANSWERS_SENTENCES,
        AnswerFormat::Bullets => ANSWERS_BULLETS,
    };

    let mut parts: Vec<String> = match kind {
        CardKind::Basic => vec![
            ROLE.into(),
            SELF_CONTAINED.into(),
            QUALITY.into(),
            FORBIDDEN.into(),
            ATOMICITY.into(),
            EXHAUSTIVE.into(),
            FORMAT_BASIC.into(),
            answers.into(),
        ],
        // Cloze cards are inherently atomic (one blank = one fact), so the
        // atomicity block is omitted.
        CardKind::Cloze => vec![
            ROLE.into(),
            SELF_CONTAINED.into(),
            QUALITY.into(),
            FORBIDDEN.into(),
            EXHAUSTIVE.into(),
            FORMAT_CLOZE.into(),
        ],
        CardKind::Both => vec![
            ROLE.into(),
            SELF_CONTAINED.into(),
            QUALITY.into(),
            FORBIDDEN.into(),
            ATOMICITY.into(),
            EXHAUSTIVE.into(),
            FORMAT_BOTH.into(),
            format!("For Basic cards: {answers}"),
        ],
    };

    parts.push(format!(
        "Respond exclusively in {language}. All flashcard content must be written in {language}."
    ));

    parts.join("\n\n")
}

/// User message for an unconstrained generation call.
pub fn user_prompt(page_label: &str, text: &str) -> String {
    format!(
        "Create Anki flashcards from the following text ({page_label}).\n\
         Be EXHAUSTIVE — go through every paragraph and extract every concept, definition, \
         mechanism, formula, comparison, cause/effect, condition, and exam-relevant fact. \
         Omit nothing important, skip only the truly trivial.\n\n\
         <text>\n{text}\n</text>\n\n\
         Reply ONLY with the JSON object."
    )
}

/// User message for a topic-constrained generation call.
///
/// Every card must be tagged with exactly one topic from `topics`, verbatim;
/// content outside the listed topics is skipped rather than forced.
pub fn user_prompt_with_topics(page_label: &str, text: &str, topics: &[String]) -> String {
    let topic_list: String = topics
        .iter()
        .map(|t| format!("  • {t}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create Anki flashcards from the following text ({page_label}).\n\
         Be EXHAUSTIVE — extract every concept, definition, mechanism, formula, comparison, \
         cause/effect, condition, and exam-relevant fact that belongs to one of these topics:\n\
         {topic_list}\n\n\
         Rules:\n\
         • Work through every paragraph — maximum coverage is required.\n\
         • Assign EXACTLY one topic from the list above to each card — add a \"topic\" field with the verbatim topic name.\n\
         • Only create a card if the content is genuinely about one of the listed topics.\n\
         • If the text contains no content about any of these topics, return {{\"cards\": []}}.\n\
         • Do NOT fabricate or invent information not present in the text.\n\n\
         Expected output keys per card:\n\
         \x20 Basic:  \"front\", \"back\", \"topic\"\n\
         \x20 Cloze:  \"text\", \"topic\"\n\n\
         <text>\n{text}\n</text>\n\n\
         Reply ONLY with the JSON object."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_prompt_contains_format_and_answer_blocks() {
        let prompt = build_system_prompt(CardKind::Basic, AnswerFormat::Sentences, "English");
        assert!(prompt.contains("CARD FORMAT: Basic"));
        assert!(prompt.contains("1–2 concise sentences"));
        assert!(prompt.contains("ATOMICITY RULE"));
        assert!(!prompt.contains("CARD FORMAT: Cloze"));
    }

    #[test]
    fn cloze_prompt_skips_atomicity() {
        let prompt = build_system_prompt(CardKind::Cloze, AnswerFormat::Sentences, "English");
        assert!(prompt.contains("CARD FORMAT: Cloze"));
        assert!(!prompt.contains("ATOMICITY RULE"));
    }

    #[test]
    fn both_prompt_scopes_answer_format_to_basic_cards() {
        let prompt = build_system_prompt(CardKind::Both, AnswerFormat::Bullets, "English");
        assert!(prompt.contains("CARD FORMAT: Mixed"));
        assert!(prompt.contains("For Basic cards:"));
        assert!(prompt.contains("BULLET POINTS"));
    }

    #[test]
    fn language_instruction_is_last() {
        let prompt = build_system_prompt(CardKind::Basic, AnswerFormat::Sentences, "German");
        let tail = prompt.rsplit("\n\n").next().unwrap();
        assert!(tail.contains("Respond exclusively in German"));
    }

    #[test]
    fn user_prompt_embeds_label_and_text() {
        let prompt = user_prompt("pp.4–7", "the chunk text");
        assert!(prompt.contains("(pp.4–7)"));
        assert!(prompt.contains("<text>\nthe chunk text\n</text>"));
    }

    #[test]
    fn topic_prompt_lists_topics_verbatim() {
        let topics = vec!["Monetary Policy".to_string(), "EU Institutions".to_string()];
        let prompt = user_prompt_with_topics("p.2", "text", &topics);
        assert!(prompt.contains("  • Monetary Policy\n  • EU Institutions"));
        assert!(prompt.contains(r#"return {"cards": []}"#));
    }
}
