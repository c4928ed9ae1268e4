//! PaperLens Dataset — turns structured papers into JSONL training sets for
//! short-form and long-form summarization models and for classifiers.

pub mod examples;
pub mod labels;
pub mod writer;

pub use examples::{
    classification_examples, long_form_examples, short_form_examples, ClassificationExample,
    ClassificationTask, GenerationTask, TrainingExample,
};
pub use labels::{assess_quality, classify_domain, DomainLabel, QualityLabel};
pub use writer::{DatasetFile, DatasetReport, DatasetWriter};
