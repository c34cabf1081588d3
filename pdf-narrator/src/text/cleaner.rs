//! Reference-artifact cleanup for text extracted from academic PDFs.
//!
//! Cleaning is an ordered list of named [`CleanRule`]s. Each rule targets one
//! kind of stray citation marker left behind by PDF text extraction or OCR,
//! e.g. `[12]`, superscript reference numbers that end up as `word 3.`, or
//! reference runs after a year such as `(2024) 17 23`.
//!
//! These are heuristics. Some citation styles slip through and some genuine
//! numbers get removed (e.g. the `10` in `pages 10-20`). Both are accepted
//! behavior, not defects.
//!
//! Rules that write captured context back cannot see text produced by the
//! previous match, so back-to-back artifacts such as `x 1). 2).` only lose
//! the first marker in one pass. Running `clean_text` again removes the next.
//!
//! Line breaks survive cleaning (blank lines collapse to one `\n`) so that a
//! reference heading still starts its own line for
//! [`strip_trailing_references`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// A single pattern → replacement transformation.
#[derive(Debug)]
pub struct CleanRule {
    /// Stable identifier, reported in debug logs
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CleanRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("clean rule pattern should compile"),
            replacement,
        }
    }

    /// Apply this rule to every non-overlapping match in `text`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

// The regex crate has no lookaround, so context that must survive a
// replacement is captured and written back.
static RULES: Lazy<Vec<CleanRule>> = Lazy::new(|| {
    vec![
        CleanRule::new("invisible_chars", r"[\u{200B}\u{200C}\u{200D}\u{FEFF}]", ""),
        // [1], [12], [1][2][3]
        CleanRule::new("bracketed_citations", r"(?:\[\d+\])+", ""),
        // "word 1 . Next" / "word 2 , next"
        CleanRule::new("number_before_punctuation", r"\b\d{1,3}\s+[.,](\s)", ".${1}"),
        // "was observed 4. The" -> "was observed, The"
        CleanRule::new("number_after_word", r"([a-z])\s\d{1,2}\.(\s|$)", "${1},${2}"),
        // "25% 15 )." -> "25%."
        CleanRule::new("number_before_paren", r"(\S)\s\d{1,3}\s*\)\.", "${1}."),
        // "2024) 17 23 " -> "2024 "
        CleanRule::new(
            "year_then_refs",
            r"((?:19|20)\d{2})\)\s+(?:\d{1,3}\s+)+",
            "${1} ",
        ),
        // "2023 9 –" -> "2023  –"
        CleanRule::new("number_before_dash", r"\b\d{1,3}(\s*[–-])", "${1}"),
        // " 1 2 ." / " 4\n5 ."
        CleanRule::new("number_runs", r"(\s)(?:\d{1,3}\s+)+([.,\n])", "${1}.${2}"),
        // "end. \n\n  Next" -> "end.\nNext"
        CleanRule::new("line_breaks", r"[^\S\n]*\n\s*", "\n"),
        CleanRule::new("whitespace", r"[^\S\n]{2,}", " "),
    ]
});

// Heading at the start of a line, optionally numbered ("7. References"),
// not followed by a lowercase continuation ("Sources close to ...").
static REFERENCE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:\d+\.?[ \t]*)?(?:references|sources|bibliography)\b[ \t]*(?-i:[^a-z \t\r\n]|\r?$)",
    )
    .expect("reference heading pattern should compile")
});

/// All cleaning rules, in application order.
pub fn rules() -> &'static [CleanRule] {
    &RULES
}

/// Look up a rule by name.
#[cfg(test)]
fn rule(name: &str) -> Option<&'static CleanRule> {
    rules().iter().find(|r| r.name == name)
}

/// Clean the text of a single page.
pub fn clean_text(text: &str) -> String {
    let mut result = text.to_string();

    for rule in rules() {
        if let Cow::Owned(replaced) = rule.apply(&result) {
            if replaced != result {
                log::debug!("Rule {} changed the text", rule.name);
            }
            result = replaced;
        }
    }

    result.trim().to_string()
}

/// Drop the trailing references/sources/bibliography section.
///
/// Everything from the first matching heading onwards is discarded. Applied
/// once to the assembled document, never per page.
pub fn strip_trailing_references(text: &str) -> String {
    match REFERENCE_HEADING.find(text) {
        Some(m) => {
            log::debug!("Dropping reference section at byte {}", m.start());
            text[..m.start()].trim_end().to_string()
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, text: &str) -> String {
        rule(name).expect("rule exists").apply(text).into_owned()
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = rules().iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"invisible_chars"));
        assert_eq!(names.last(), Some(&"whitespace"));
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_bracketed_citations() {
        assert_eq!(apply("bracketed_citations", "shown [12] here"), "shown  here");
        assert_eq!(apply("bracketed_citations", "runs [1][2][3]."), "runs .");
        assert_eq!(apply("bracketed_citations", "keep [a] and [1a]"), "keep [a] and [1a]");
    }

    #[test]
    fn test_number_before_punctuation() {
        assert_eq!(apply("number_before_punctuation", "effect 12 . Next"), "effect . Next");
        assert_eq!(apply("number_before_punctuation", "dose 5 , then"), "dose . then");
        // Needs whitespace after the punctuation
        assert_eq!(apply("number_before_punctuation", "version 3 .5"), "version 3 .5");
    }

    #[test]
    fn test_number_after_word() {
        assert_eq!(
            apply("number_after_word", "was observed 4. The"),
            "was observed, The"
        );
        assert_eq!(apply("number_after_word", "the end 12."), "the end,");
        // Only a lowercase letter before the number qualifies
        assert_eq!(
            apply("number_after_word", "see Appendix B 4. Next"),
            "see Appendix B 4. Next"
        );
    }

    #[test]
    fn test_number_before_paren() {
        assert_eq!(apply("number_before_paren", "rose 25% 15 )."), "rose 25%.");
        assert_eq!(apply("number_before_paren", "rates 3)."), "rates.");
        // Adjacent markers: the second one needs another pass
        let once = apply("number_before_paren", "x 1). 2).");
        assert_eq!(once, "x. 2).");
        assert_eq!(apply("number_before_paren", &once), "x..");
    }

    #[test]
    fn test_year_then_refs() {
        assert_eq!(
            apply("year_then_refs", "improved 2024) 17 23 significantly"),
            "improved 2024 significantly"
        );
        assert_eq!(apply("year_then_refs", "(2020) found"), "(2020) found");
    }

    #[test]
    fn test_number_before_dash() {
        assert_eq!(apply("number_before_dash", "from 2023 9 – 2024"), "from 2023  – 2024");
        assert_eq!(apply("number_before_dash", "pages 10-20"), "pages -20");
        assert_eq!(apply("number_before_dash", "COVID-19 cases"), "COVID-19 cases");
    }

    #[test]
    fn test_number_runs() {
        assert_eq!(apply("number_runs", "shown 4 5 ."), "shown ..");
        assert_eq!(apply("number_runs", "shown 4\n5 ,"), "shown .,");
        assert_eq!(apply("number_runs", "value 2024 was"), "value 2024 was");
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(apply("whitespace", "a   b\t\tc d"), "a b c d");
        assert_eq!(apply("whitespace", "line one\nline two"), "line one\nline two");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(apply("line_breaks", "para one.\n\nReferences"), "para one.\nReferences");
        assert_eq!(apply("line_breaks", "end. \n  next"), "end.\nnext");
        assert_eq!(apply("line_breaks", "a\r\n\r\nb"), "a\nb");
        assert_eq!(apply("line_breaks", "no breaks here"), "no breaks here");
    }

    #[test]
    fn test_clean_keeps_heading_on_its_own_line() {
        let cleaned = clean_text("Conclusion text.\n\nReferences\n1. Doe J. A study.");
        assert!(cleaned.starts_with("Conclusion text.\nReferences"));
        assert_eq!(strip_trailing_references(&cleaned), "Conclusion text.");

        let cleaned = clean_text("Conclusion text. \nReferences\n1. Doe J. A study.");
        assert_eq!(strip_trailing_references(&cleaned), "Conclusion text.");
    }

    #[test]
    fn test_clean_citation_example() {
        let text = "Smith et al. (2020) found that [1][2] efficacy improved 2024) 17 23 significantly.";
        assert_eq!(
            clean_text(text),
            "Smith et al. (2020) found that efficacy improved 2024 significantly."
        );
    }

    #[test]
    fn test_clean_simple_citation() {
        assert_eq!(clean_text("Prior work [12] showed this."), "Prior work showed this.");
    }

    #[test]
    fn test_clean_trims_and_strips_invisible() {
        assert_eq!(clean_text("\u{feff}  Hello\u{200b} world  \n"), "Hello world");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let inputs = [
            "Smith et al. (2020) found that [1][2] efficacy improved 2024) 17 23 significantly.",
            "Prior work [12] showed this.",
            "Growth in 2023 9 – 2024 was strong [1][2].",
            "The rate rose 25% 15 ). Later studies agreed [4].",
            "Results were significant [3]. Further work [4][5] is needed.",
            "Plain prose with no citations at all.",
            "First paragraph [1].\n\n  Second paragraph.",
        ];

        for input in inputs {
            let once = clean_text(input);
            let twice = clean_text(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_strip_references_heading() {
        let text = "Body text here.\nMore body.\nReferences\n1. Smith J. A study. 2020.";
        assert_eq!(strip_trailing_references(text), "Body text here.\nMore body.");
    }

    #[test]
    fn test_strip_references_case_and_variants() {
        assert_eq!(
            strip_trailing_references("Intro.\nBIBLIOGRAPHY\nDoe, 1999."),
            "Intro."
        );
        assert_eq!(
            strip_trailing_references("Intro.\nSources: Reuters, AP"),
            "Intro."
        );
        assert_eq!(
            strip_trailing_references("Intro.\n7. References\nDoe 2001"),
            "Intro."
        );
        // Numbered list entries whose brackets were already cleaned away
        assert_eq!(
            strip_trailing_references("Intro.\nReferences Smith J. 2020."),
            "Intro."
        );
    }

    #[test]
    fn test_strip_references_first_heading_wins() {
        let text = "A.\nReferences\nx\nSources\ny";
        assert_eq!(strip_trailing_references(text), "A.");
    }

    #[test]
    fn test_strip_references_ignores_prose() {
        let text = "We compared energy sources in detail.\nSources close to the team agreed.";
        assert_eq!(strip_trailing_references(text), text);

        let text = "See the references below for details.";
        assert_eq!(strip_trailing_references(text), text);
    }

    #[test]
    fn test_strip_references_none() {
        assert_eq!(strip_trailing_references("Nothing to strip."), "Nothing to strip.");
        assert_eq!(strip_trailing_references(""), "");
    }
}
