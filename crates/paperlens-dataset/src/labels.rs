//! Heuristic classification labels.

use once_cell::sync::Lazy;
use paperlens_core::Document;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainLabel {
    ArtificialIntelligence,
    NaturalLanguageProcessing,
    ComputerVision,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    HighQuality,
    MediumQuality,
    LowQuality,
}

fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternatives = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})s?\b", alternatives)).unwrap()
}

// Checked in order; the first domain with a match wins.
static DOMAINS: Lazy<Vec<(DomainLabel, Regex)>> = Lazy::new(|| {
    vec![
        (
            DomainLabel::ArtificialIntelligence,
            keyword_pattern(&[
                "neural",
                "deep learning",
                "machine learning",
                "artificial intelligence",
                "ai",
            ]),
        ),
        (
            DomainLabel::NaturalLanguageProcessing,
            keyword_pattern(&["natural language", "nlp", "text", "language model", "linguistic"]),
        ),
        (
            DomainLabel::ComputerVision,
            keyword_pattern(&["computer vision", "image", "visual", "cnn", "convolutional"]),
        ),
    ]
});

/// Keyword domain label for a title-plus-abstract text.
pub fn classify_domain(text: &str) -> DomainLabel {
    DOMAINS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(label, _)| *label)
        .unwrap_or(DomainLabel::Other)
}

/// Structural quality: one point each for a substantial abstract, at least
/// four sections, and more than 5000 characters of section text.
pub fn assess_quality(doc: &Document) -> QualityLabel {
    let total_content: usize = doc.sections.values().map(|s| s.chars().count()).sum();
    let score = [
        doc.abstract_text.chars().count() > 100,
        doc.sections.len() >= 4,
        total_content > 5000,
    ]
    .iter()
    .filter(|hit| **hit)
    .count();

    match score {
        3 => QualityLabel::HighQuality,
        2 => QualityLabel::MediumQuality,
        _ => QualityLabel::LowQuality,
    }
}
