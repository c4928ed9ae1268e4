//! Training example builders.

use paperlens_core::{Consumer, Document};
use paperlens_ingest::{clean_text, split_sentences, Chunker};
use serde::{Deserialize, Serialize};

use crate::labels::{assess_quality, classify_domain, DomainLabel, QualityLabel};

/// Sections fed to abstract generation, in input order.
const ABSTRACT_SOURCES: &[&str] = &["Introduction", "Conclusion", "Results"];
/// Sections quoted as key points in deep-analysis targets: label and match needle.
const KEY_SECTIONS: &[(&str, &str)] = &[
    ("Introduction", "introduction"),
    ("Methods", "method"),
    ("Results", "result"),
    ("Conclusion", "conclusion"),
];

const MIN_SOURCE_CHARS: usize = 50;
const MIN_LONG_SECTION_CHARS: usize = 100;
const KEY_POINT_CHARS: usize = 200;
const MIN_DEEP_INPUT_CHARS: usize = 2000;
const MIN_DEEP_TARGET_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    AbstractGeneration,
    OneLineSummary,
    DeepAnalysis,
}

/// Input/target pair for a summarization model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub input_text: String,
    pub target_text: String,
    pub paper_id: String,
    pub task: GenerationTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", content = "label", rename_all = "snake_case")]
pub enum ClassificationTask {
    DomainClassification(DomainLabel),
    QualityAssessment(QualityLabel),
}

/// Labelled text for a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationExample {
    pub text: String,
    pub paper_id: String,
    #[serde(flatten)]
    pub task: ClassificationTask,
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn abstract_generation(doc: &Document, chunker: &Chunker, out: &mut Vec<TrainingExample>) {
    if doc.abstract_text.is_empty() {
        return;
    }
    let inputs: Vec<String> = ABSTRACT_SOURCES
        .iter()
        .filter_map(|name| {
            let (_, text) = doc.find_section(name)?;
            let cleaned = clean_text(text);
            (cleaned.chars().count() > MIN_SOURCE_CHARS).then(|| format!("{}: {}", name, cleaned))
        })
        .collect();
    if inputs.is_empty() {
        return;
    }

    let input = inputs.join("\n\n");
    let target = clean_text(&doc.abstract_text);
    for chunk in &chunker.chunks(&input, Consumer::ShortForm) {
        out.push(TrainingExample {
            input_text: chunk.text,
            target_text: target.clone(),
            paper_id: doc.id.clone(),
            task: GenerationTask::AbstractGeneration,
        });
    }
}

fn one_line_summary(doc: &Document, chunker: &Chunker, out: &mut Vec<TrainingExample>) {
    let abstract_text = clean_text(&doc.abstract_text);
    let Some(first_sentence) = split_sentences(&abstract_text).first().copied() else {
        return;
    };
    let Some((_, intro)) = doc.find_section("introduction") else {
        return;
    };
    let intro = clean_text(intro);
    let Some(first_chunk) = chunker.chunks(&intro, Consumer::ShortForm).iter().next() else {
        return;
    };

    out.push(TrainingExample {
        input_text: format!("Title: {}\n\n{}", doc.title, first_chunk.text),
        target_text: first_sentence.to_string(),
        paper_id: doc.id.clone(),
        task: GenerationTask::OneLineSummary,
    });
}

/// Abstract-generation and one-line-summary examples sized for short-form
/// models.
pub fn short_form_examples(docs: &[Document], chunker: &Chunker) -> Vec<TrainingExample> {
    let mut out = Vec::new();
    for doc in docs {
        abstract_generation(doc, chunker, &mut out);
        one_line_summary(doc, chunker, &mut out);
    }
    out
}

fn deep_analysis(doc: &Document) -> Option<TrainingExample> {
    let mut input = format!("Title: {}\n\n", doc.title);
    if !doc.abstract_text.is_empty() {
        input.push_str(&format!("Abstract: {}\n\n", doc.abstract_text));
    }
    for (name, content) in &doc.sections {
        if content.trim().chars().count() > MIN_LONG_SECTION_CHARS {
            input.push_str(&format!("{}:\n{}\n\n", name, clean_text(content)));
        }
    }

    let mut target = String::new();
    if !doc.abstract_text.is_empty() {
        target.push_str(&format!("Summary: {}\n\n", doc.abstract_text));
    }
    for (label, needle) in KEY_SECTIONS {
        let Some((_, text)) = doc.find_section(needle) else {
            continue;
        };
        if text.chars().count() > MIN_LONG_SECTION_CHARS {
            let point = truncate_chars(text, KEY_POINT_CHARS);
            target.push_str(&format!("{} Key Point: {}...\n\n", label, point));
        }
    }

    let input = input.trim().to_string();
    let target = target.trim().to_string();
    if input.chars().count() <= MIN_DEEP_INPUT_CHARS || target.chars().count() <= MIN_DEEP_TARGET_CHARS {
        return None;
    }
    Some(TrainingExample {
        input_text: input,
        target_text: target,
        paper_id: doc.id.clone(),
        task: GenerationTask::DeepAnalysis,
    })
}

/// Whole-paper deep-analysis examples for long-form models. Papers without
/// substantial content are left out.
pub fn long_form_examples(docs: &[Document]) -> Vec<TrainingExample> {
    docs.iter().filter_map(deep_analysis).collect()
}

/// Domain and quality labels over title plus abstract.
pub fn classification_examples(docs: &[Document]) -> Vec<ClassificationExample> {
    let mut out = Vec::with_capacity(docs.len() * 2);
    for doc in docs {
        let text = if doc.abstract_text.is_empty() {
            doc.title.clone()
        } else {
            format!("{} {}", doc.title, doc.abstract_text)
        };
        out.push(ClassificationExample {
            text: text.clone(),
            paper_id: doc.id.clone(),
            task: ClassificationTask::DomainClassification(classify_domain(&text)),
        });
        out.push(ClassificationExample {
            text,
            paper_id: doc.id.clone(),
            task: ClassificationTask::QualityAssessment(assess_quality(doc)),
        });
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use paperlens_core::{ChunkBudget, ChunkBudgets, ExtractionMethod, SectionMap};

    use super::*;

    pub(crate) fn paper(id: &str, abstract_text: &str, sections: &[(&str, String)]) -> Document {
        let mut map = SectionMap::new();
        for (name, text) in sections {
            map.insert(name.to_string(), text.clone());
        }
        Document::new(id, "Sparse Attention", vec![], abstract_text, map, ExtractionMethod::Structured)
    }

    fn sentences(word: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("The {} result number {} holds here.", word, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn small_chunker() -> Chunker {
        Chunker::new(ChunkBudgets {
            short_form: ChunkBudget::new(20, 30, 10),
            long_form: ChunkBudget::new(60, 80, 20),
        })
    }

    #[test]
    fn test_abstract_generation_chunks_key_sections() {
        let doc = paper(
            "p1",
            "We make attention sparse. It is faster.",
            &[
                ("1. Introduction", sentences("intro", 4)),
                ("Related Work", sentences("related", 4)),
                ("Conclusion", sentences("final", 4)),
            ],
        );
        let examples = short_form_examples(&[doc], &small_chunker());

        let generation: Vec<_> = examples
            .iter()
            .filter(|e| e.task == GenerationTask::AbstractGeneration)
            .collect();
        assert!(generation.len() >= 2);
        assert!(generation[0].input_text.starts_with("Introduction: The intro result"));
        assert!(generation.iter().all(|e| !e.input_text.contains("related")));
        assert!(generation.iter().all(|e| e.target_text == "We make attention sparse. It is faster."));
        assert!(generation.iter().any(|e| e.input_text.contains("final")));
    }

    #[test]
    fn test_one_line_summary_uses_first_abstract_sentence() {
        let doc = paper(
            "p1",
            "We make attention sparse. It is faster.",
            &[("Introduction", sentences("intro", 8))],
        );
        let examples = short_form_examples(&[doc], &small_chunker());
        let one_line: Vec<_> = examples
            .iter()
            .filter(|e| e.task == GenerationTask::OneLineSummary)
            .collect();

        assert_eq!(one_line.len(), 1);
        assert_eq!(one_line[0].target_text, "We make attention sparse.");
        assert!(one_line[0]
            .input_text
            .starts_with("Title: Sparse Attention\n\nThe intro result number 0"));
    }

    #[test]
    fn test_no_abstract_means_no_short_form_examples() {
        let doc = paper("p1", "", &[("Introduction", sentences("intro", 8))]);
        assert!(short_form_examples(&[doc], &small_chunker()).is_empty());
    }

    #[test]
    fn test_deep_analysis_requires_substantial_content() {
        let rich = paper(
            "rich",
            &sentences("abstract", 3),
            &[
                ("Introduction", sentences("intro", 25)),
                ("Methods", sentences("method", 25)),
                ("Results", sentences("numbers", 25)),
            ],
        );
        let thin = paper("thin", "Short.", &[("Introduction", sentences("intro", 2))]);

        let examples = long_form_examples(&[rich, thin]);
        assert_eq!(examples.len(), 1);
        let example = &examples[0];
        assert_eq!(example.paper_id, "rich");
        assert!(example.input_text.starts_with("Title: Sparse Attention\n\nAbstract: "));
        assert!(example.input_text.contains("Methods:\nThe method result"));
        assert!(example.target_text.contains("Methods Key Point: "));
        assert!(example.target_text.contains("Results Key Point: "));
        assert!(!example.target_text.contains("Conclusion Key Point"));
    }

    #[test]
    fn test_classification_pairs() {
        let doc = paper("p1", "A neural approach to parsing.", &[]);
        let examples = classification_examples(&[doc]);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].text, "Sparse Attention A neural approach to parsing.");
        assert_eq!(
            examples[0].task,
            ClassificationTask::DomainClassification(DomainLabel::ArtificialIntelligence)
        );
        assert_eq!(
            examples[1].task,
            ClassificationTask::QualityAssessment(QualityLabel::LowQuality)
        );

        let json = serde_json::to_value(&examples[0]).unwrap();
        assert_eq!(json["task"], "domain_classification");
        assert_eq!(json["label"], "artificial_intelligence");
        assert_eq!(json["paper_id"], "p1");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
