//! PaperLens Ingest — text cleaning, sentence-aligned chunking, local PDF text
//! extraction, heuristic section segmentation.

pub mod chunking;
pub mod clean;
pub mod file;
pub mod segment;

pub use chunking::{split_sentences, Chunk, Chunker, Chunks, ChunkIter};
pub use clean::clean_text;
pub use file::{validate_document_path, validate_upload, LopdfExtractor, PageTextExtractor};
pub use segment::{segment_text, SegmentedText};
