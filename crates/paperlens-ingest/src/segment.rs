//! Best-effort section segmentation of unstructured page text.
//!
//! A paragraph is a header when it is short and mentions one of a fixed set
//! of section keywords. The heuristic is deterministic but fuzzy: it only
//! promises what the tests below exercise.

use paperlens_core::{Document, Error, Result, SectionMap, DEFAULT_SECTION, UNKNOWN_TITLE};
use tracing::debug;

use crate::clean::clean_text;

/// Paragraphs at or above this many characters are never headers.
const HEADER_MAX_CHARS: usize = 100;
const SECTION_KEYWORDS: &[&str] = &[
    "abstract",
    "introduction",
    "methodology",
    "methods",
    "results",
    "discussion",
    "conclusion",
    "references",
];
const ABSTRACT_MAX_CHARS: usize = 500;

/// Output of the heuristic segmenter.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedText {
    pub title: String,
    pub abstract_text: String,
    pub sections: SectionMap,
    /// Characters of cleaned text the segmentation ran over.
    pub total_characters: usize,
}

fn is_header(paragraph: &str) -> bool {
    if paragraph.chars().count() >= HEADER_MAX_CHARS {
        return false;
    }
    let lower = paragraph.to_lowercase();
    SECTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn find_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| {
            let len = line.chars().count();
            len > 10 && len < 200
        })
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// Clean raw extracted text and split it into titled sections.
pub fn segment_text(raw: &str) -> Result<SegmentedText> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Err(Error::Extraction("No extractable text".into()));
    }

    let mut sections = SectionMap::new();
    let mut current_header = DEFAULT_SECTION.to_string();
    let mut current: Vec<String> = Vec::new();

    let paragraphs = cleaned
        .split("\n\n")
        .map(|p| p.lines().map(str::trim).collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty());

    for paragraph in paragraphs {
        if is_header(&paragraph) {
            Document::push_section(&mut sections, &current_header, &current.join(" "));
            current.clear();
            current_header = paragraph;
        } else {
            current.push(paragraph);
        }
    }
    Document::push_section(&mut sections, &current_header, &current.join(" "));

    let abstract_text = sections
        .iter()
        .find(|(name, _)| name.to_lowercase().contains("abstract"))
        .map(|(_, content)| content.chars().take(ABSTRACT_MAX_CHARS).collect())
        .unwrap_or_default();

    debug!(
        "Segmented {} chars into {} sections",
        cleaned.len(),
        sections.len()
    );

    Ok(SegmentedText {
        title: find_title(&cleaned),
        abstract_text,
        total_characters: cleaned.chars().count(),
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "Deep Learning for Paper Segmentation\n\nJane Doe\n\n\
        Abstract\n\nWe propose a way to split papers into parts using keyword headers.\n\n\
        1 Introduction\n\nPapers are long. Readers are busy.\n\n\
        Methods\n\nWe split on blank lines.\n\n\
        Results\n\nIt works well.\n\nResults\n\nAnd it is fast.";

    #[test]
    fn test_segment_detects_headers_in_order() {
        let seg = segment_text(PAPER).unwrap();
        let keys: Vec<&str> = seg.sections.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["Content", "Abstract", "1 Introduction", "Methods", "Results"]
        );
        assert_eq!(seg.sections["Content"], "Deep Learning for Paper Segmentation Jane Doe");
        assert_eq!(seg.sections["Results"], "It works well. And it is fast.");
        assert_eq!(seg.title, "Deep Learning for Paper Segmentation");
        assert_eq!(
            seg.abstract_text,
            "We propose a way to split papers into parts using keyword headers."
        );
    }

    #[test]
    fn test_no_keywords_files_everything_under_default() {
        let seg = segment_text("Just some plain text without headers.\n\nAnother paragraph.").unwrap();
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(
            seg.sections[DEFAULT_SECTION],
            "Just some plain text without headers. Another paragraph."
        );
        assert_eq!(seg.title, "Just some plain text without headers.");
        assert!(seg.abstract_text.is_empty());
    }

    #[test]
    fn test_abstract_is_truncated() {
        let body = "word ".repeat(150);
        let seg = segment_text(&format!("A Long Enough Title\n\nAbstract\n\n{}", body)).unwrap();
        assert_eq!(seg.abstract_text.chars().count(), 500);
    }

    #[test]
    fn test_header_without_content_is_dropped() {
        let seg = segment_text("Abstract\n\nIntroduction\n\nSome opening words.").unwrap();
        let keys: Vec<&str> = seg.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Introduction"]);
        assert!(seg.abstract_text.is_empty());
    }

    #[test]
    fn test_short_lines_give_unknown_title() {
        let seg = segment_text("Short\n\nok").unwrap();
        assert_eq!(seg.title, UNKNOWN_TITLE);
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(segment_text(" \n "), Err(Error::Extraction(_))));
    }
}
