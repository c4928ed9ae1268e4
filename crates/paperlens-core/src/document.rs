//! Paper and document records shared by every stage of the pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Title used when no title could be recovered.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Section name for text seen before any recognised header.
pub const DEFAULT_SECTION: &str = "Content";

/// Section name → section text, in document order. Keys are unique.
pub type SectionMap = IndexMap<String, String>;

/// Which path produced a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// External structuring service (TEI response).
    Structured,
    /// Local page text + heuristic segmentation.
    Fallback,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Size and shape figures reported by the extraction path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_characters: Option<usize>,
    pub sections_found: usize,
    pub authors_found: usize,
    pub has_abstract: bool,
}

/// One parsed paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub sections: SectionMap,
    pub method: ExtractionMethod,
    #[serde(default)]
    pub details: ExtractionDetails,
}

impl Document {
    /// Build a document and derive its details from the content.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        authors: Vec<String>,
        abstract_text: impl Into<String>,
        sections: SectionMap,
        method: ExtractionMethod,
    ) -> Self {
        let abstract_text = abstract_text.into();
        let details = ExtractionDetails {
            sections_found: sections.len(),
            authors_found: authors.len(),
            has_abstract: !abstract_text.is_empty(),
            ..Default::default()
        };
        Self {
            id: id.into(),
            title: title.into(),
            authors,
            abstract_text,
            sections,
            method,
            details,
        }
    }

    /// First section whose name contains `needle` (case-insensitive).
    pub fn find_section(&self, needle: &str) -> Option<(&str, &str)> {
        let needle = needle.to_lowercase();
        self.sections
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    /// Insert section text, appending to an existing section of the same name.
    pub fn push_section(sections: &mut SectionMap, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        match sections.get_mut(name) {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => {
                sections.insert(name.to_string(), text.to_string());
            }
        }
    }
}

/// Paper metadata returned by the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub paper_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub category: String,
    pub pdf_url: Option<String>,
    pub source: String,
}

/// Downstream consumer a chunk is sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    /// Short-input summarization models.
    ShortForm,
    /// Long-context models.
    LongForm,
}

impl std::fmt::Display for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortForm => write!(f, "short_form"),
            Self::LongForm => write!(f, "long_form"),
        }
    }
}
