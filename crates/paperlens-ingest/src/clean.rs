//! Text cleaning for PDF-extracted academic prose.
//!
//! Six stages run strictly in order: whitespace collapse, punctuation spacing,
//! PDF-artifact repair, figure/table/equation references, academic
//! abbreviations, stray section-number lines. Line and paragraph breaks are
//! kept so segmentation can still see paragraphs after cleaning.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([,.!?;:])").unwrap());
static MISSING_SPACE_AFTER_SEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,;])([A-Za-z])").unwrap());
static MISSING_SPACE_AFTER_STOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]{3}[.!?])([A-Z])").unwrap());

static BRACKET_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*(\d+(?:\s*[,–-]\s*\d+)*)\s*\]").unwrap());
static AUTHOR_YEAR_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*([^()]+?)\s*,\s*(\d{4}[a-z]?)\s*\)").unwrap());
static HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L}+)-\s+(\p{Ll}+)").unwrap());
static BROKEN_TRANS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(trans)\s+(formers?|formations?|mit)\b").unwrap());
static BROKEN_MULTI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(multi)\s+(head|layer|task|modal)\b").unwrap());
static BROKEN_SELF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(self)\s+(attention|supervised)\b").unwrap());
static SPACED_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)[^\S\n]+%").unwrap());
static LONG_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static REPEATED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",(?:\s*,)+").unwrap());

static FIGURE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(Figure|Fig|Table|Equation|Eq)\s*\.?\s*(\(?\d+)").unwrap()
});

static EG_IE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([eE]\.g|[iI]\.e)\.,?[^\S\n]*").unwrap());
static VERSUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvs\b\.?").unwrap());
static ETCETERA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\betc\b\.?").unwrap());
static ET_AL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bet\s+al\b\.?").unwrap());

static SECTION_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*\d+(?:\.\d+)*\.?[^\S\n]*$").unwrap());

/// Words that legitimately follow a dangling hyphen ("pre- and post-").
const HYPHEN_CONNECTIVES: &[&str] = &["and", "or", "to"];

/// Run every stage in order until the text stops changing.
pub fn clean_text(text: &str) -> String {
    let mut current = clean_pass(text);
    // Each stage reaches its own fixed point, so repeat passes only settle
    // edits a later stage exposes to an earlier one. Each of those joins or
    // drops input, which the input length bounds.
    for _ in 0..=text.len() {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_pass(text: &str) -> String {
    let text = collapse_whitespace(text);
    let text = normalize_punctuation(&text);
    let text = repair_pdf_artifacts(&text);
    let text = normalize_references(&text);
    let text = normalize_abbreviations(&text);
    remove_section_numbers(&text)
}

/// Stage (a): single spaces, trimmed lines, at most one blank line in a row.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    tidy_lines(&text)
}

/// Stage (b): no space before punctuation, one space after separators.
pub fn normalize_punctuation(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
    let text = MISSING_SPACE_AFTER_SEP.replace_all(&text, "$1 $2");
    MISSING_SPACE_AFTER_STOP
        .replace_all(&text, "$1 $2")
        .into_owned()
}

/// Stage (c): citation spacing, hyphenation, known broken compounds.
pub fn repair_pdf_artifacts(text: &str) -> String {
    let text = REPEATED_COMMAS.replace_all(text, ",");
    let text = BRACKET_CITATION.replace_all(&text, |caps: &Captures| {
        let inner: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
        format!("[{}]", inner.replace(',', ", "))
    });
    let text = AUTHOR_YEAR_CITATION.replace_all(&text, "(${1}, ${2})");
    let text = rejoin_hyphenation(&text);
    let text = BROKEN_TRANS.replace_all(&text, "${1}${2}");
    let text = BROKEN_MULTI.replace_all(&text, "${1}-${2}");
    let text = BROKEN_SELF.replace_all(&text, "${1}-${2}");
    let text = SPACED_PERCENT.replace_all(&text, "${1}%");
    LONG_DOTS.replace_all(&text, "...").into_owned()
}

/// Join "hyphen- ation" until none is left. Matches cannot overlap, so a
/// chain like "a- b- c" needs more than one sweep; every join shortens the
/// text, which bounds the loop.
fn rejoin_hyphenation(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = HYPHEN_BREAK
            .replace_all(&current, |caps: &Captures| {
                if HYPHEN_CONNECTIVES.contains(&&caps[2]) {
                    caps[0].to_string()
                } else {
                    format!("{}{}", &caps[1], &caps[2])
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Stage (d): "Fig. 1", "Eq. (3)", "Figure 1", "Table 2".
pub fn normalize_references(text: &str) -> String {
    FIGURE_REF
        .replace_all(text, |caps: &Captures| {
            let label = &caps[1];
            let number = &caps[2];
            match label {
                "Fig" | "Eq" => format!("{}. {}", label, number),
                _ => format!("{} {}", label, number),
            }
        })
        .into_owned()
}

/// Stage (e): "e.g., ", "i.e., ", "vs.", "etc.", "et al.".
pub fn normalize_abbreviations(text: &str) -> String {
    let text = EG_IE.replace_all(text, "${1}., ");
    let text = VERSUS.replace_all(&text, "vs.");
    let text = ETCETERA.replace_all(&text, "etc.");
    ET_AL.replace_all(&text, "et al.").into_owned()
}

/// Stage (f): drop lines holding nothing but a section number.
pub fn remove_section_numbers(text: &str) -> String {
    let text = SECTION_NUMBER_LINE.replace_all(text, "");
    tidy_lines(&text)
}

fn tidy_lines(text: &str) -> String {
    let trimmed = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_RUNS
        .replace_all(&trimmed, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_SAMPLE: &str = "Recurrent neural networks, long short-term memory  [ 1 ] and gated \
        recurrent units ( Cho et al. , 2014 ) have been used for trans former architecture. \
        The multi head attention mechanism in Figure1 shows h t variables.\n\n\n\n3\n\
        This is simi-\nlar to previous work.... The self attention mechanism performs \
        better than tra- ditional approaches , e.g.LSTMs vs RNNs etc";

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  a \t b  \r\n\n\n\n c "),
            "a b\n\nc"
        );
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(
            normalize_punctuation("Hello , world ;foo.Bar"),
            "Hello, world; foo. Bar"
        );
    }

    #[test]
    fn test_repair_pdf_artifacts() {
        let input = "memory [ 1 , 2 ] and units ( Cho et al., 2014 ) use trans former and \
                     multi head self attention. This is simi- lar at 95 %.";
        assert_eq!(
            repair_pdf_artifacts(input),
            "memory [1, 2] and units (Cho et al., 2014) use transformer and \
             multi-head self-attention. This is similar at 95%."
        );
    }

    #[test]
    fn test_hyphen_chain_joins_in_one_application() {
        assert_eq!(repair_pdf_artifacts("a- b- c"), "abc");
        assert_eq!(repair_pdf_artifacts("x- y- and z"), "xy- and z");
        assert_eq!(repair_pdf_artifacts("(Smith , , 2020)"), "(Smith, 2020)");
    }

    #[test]
    fn test_hyphen_before_connective_is_kept() {
        assert_eq!(
            repair_pdf_artifacts("pre- and post-processing"),
            "pre- and post-processing"
        );
    }

    #[test]
    fn test_normalize_references() {
        assert_eq!(
            normalize_references("see Figure3 and Fig .2 and Eq.(4) and Table 1"),
            "see Figure 3 and Fig. 2 and Eq. (4) and Table 1"
        );
    }

    #[test]
    fn test_normalize_abbreviations() {
        assert_eq!(
            normalize_abbreviations("e.g.the model vs baseline etc and Smith et  al found i.e. more"),
            "e.g., the model vs. baseline etc. and Smith et al. found i.e., more"
        );
    }

    #[test]
    fn test_remove_section_numbers() {
        assert_eq!(
            remove_section_numbers("Intro text\n3\n2.1\nMore text"),
            "Intro text\n\nMore text"
        );
    }

    #[test]
    fn test_clean_text_sample() {
        let cleaned = clean_text(PDF_SAMPLE);
        assert!(cleaned.contains("[1]"));
        assert!(cleaned.contains("(Cho et al., 2014)"));
        assert!(cleaned.contains("transformer"));
        assert!(cleaned.contains("multi-head"));
        assert!(cleaned.contains("self-attention"));
        assert!(cleaned.contains("Figure 1"));
        assert!(cleaned.contains("similar"));
        assert!(cleaned.contains("traditional approaches, e.g., LSTMs vs. RNNs etc."));
        assert!(!cleaned.contains("...."));
        assert!(!cleaned.lines().any(|l| l.trim() == "3"));
    }

    fn idempotence_samples() -> Vec<String> {
        let long_chain = (0..300usize)
            .map(|i| char::from(b'a' + (i % 26) as u8).to_string())
            .collect::<Vec<_>>()
            .join("- ");
        let mut samples: Vec<String> = [
            "",
            "   ",
            " \n\t\n ",
            PDF_SAMPLE,
            "1\n\n2.3\n\n",
            "a- b- c- d",
            "a- and- b",
            "(Smith , , 2020) and [1,,2]",
            "Results ,, , were good ; see Fig . 3 ( Smith , 2020a ).Next",
            "e.g.\ni.e.",
            "word -\n\n and more",
            "ab- c.Dd",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        samples.push(long_chain);
        samples
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        for sample in idempotence_samples() {
            let once = clean_text(&sample);
            let twice = clean_text(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_each_stage_is_idempotent() {
        let stages: [(&str, fn(&str) -> String); 6] = [
            ("collapse_whitespace", collapse_whitespace),
            ("normalize_punctuation", normalize_punctuation),
            ("repair_pdf_artifacts", repair_pdf_artifacts),
            ("normalize_references", normalize_references),
            ("normalize_abbreviations", normalize_abbreviations),
            ("remove_section_numbers", remove_section_numbers),
        ];
        for sample in idempotence_samples() {
            for (name, stage) in stages {
                let once = stage(&sample);
                let twice = stage(&once);
                assert_eq!(once, twice, "{} not idempotent for {:?}", name, sample);
            }
        }
    }

    #[test]
    fn test_long_hyphen_chain_fully_joined() {
        let chain = vec!["q"; 300].join("- ");
        let cleaned = clean_text(&chain);
        assert_eq!(cleaned, "q".repeat(300));
    }

    #[test]
    fn test_whitespace_only_cleans_to_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
    }
}
