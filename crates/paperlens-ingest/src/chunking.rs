//! Sentence-aligned chunking for two downstream consumers.
//!
//! Chunks never split a sentence. A chunk closes when the next sentence
//! would push it past the consumer's maximum, or as soon as it reaches the
//! target. An undersized chunk is folded into its predecessor when the
//! result stays within the maximum; an undersized final chunk that does not
//! fit is re-split with its predecessor instead.

use std::collections::VecDeque;
use std::iter::Peekable;

use paperlens_core::{ChunkBudget, ChunkBudgets, Consumer, Document};
use serde::{Deserialize, Serialize};

use crate::clean::clean_text;

/// Words that end with a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "fig", "figs", "eq", "eqs", "al", "vs", "e.g", "i.e", "etc", "dr", "mr", "mrs", "ms", "no",
    "sec", "ref", "approx", "cf",
];

const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

/// A bounded, sentence-aligned span of cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub word_count: usize,
    pub sentence_count: usize,
    /// Originating section, when chunked from a document.
    pub section: Option<String>,
    pub consumer: Consumer,
}

/// Split text into trimmed sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    Sentences::new(text).collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lazy sentence iterator.
#[derive(Debug, Clone)]
struct Sentences<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Sentences<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset just past the sentence starting at `self.pos`.
    fn sentence_end(&self) -> usize {
        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if CLOSERS.contains(&next) || matches!(next, '.' | '!' | '?') {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let after = &rest[end..];
            let Some(first) = after.chars().next() else {
                return self.pos + end;
            };
            if !first.is_whitespace() {
                continue;
            }
            let Some(next_word_start) = after.trim_start().chars().next() else {
                return self.pos + end;
            };
            if next_word_start.is_lowercase() || next_word_start.is_ascii_digit() {
                continue;
            }
            if c == '.' && is_abbreviation(&rest[..i]) {
                continue;
            }
            return self.pos + end;
        }
        self.text.len()
    }
}

/// Whether the word right before a period is a known abbreviation or an initial.
fn is_abbreviation(before_period: &str) -> bool {
    let word = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| c == '(' || c == '[');
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return true;
    }
    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while self.pos < self.text.len() {
            let end = self.sentence_end();
            let sentence = self.text[self.pos..end].trim();
            self.pos = end;
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
        None
    }
}

/// Chunker with independently tunable budgets per consumer.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    budgets: ChunkBudgets,
}

impl Chunker {
    pub fn new(budgets: ChunkBudgets) -> Self {
        Self { budgets }
    }

    pub fn budgets(&self) -> &ChunkBudgets {
        &self.budgets
    }

    /// Restartable lazy chunk sequence over already-cleaned text.
    pub fn chunks<'a>(&self, text: &'a str, consumer: Consumer) -> Chunks<'a> {
        Chunks {
            text,
            budget: self.budgets.for_consumer(consumer),
            consumer,
        }
    }

    /// Clean and chunk every section, tagging chunks with the section name.
    pub fn chunk_document(&self, doc: &Document, consumer: Consumer) -> Vec<Chunk> {
        let mut all = Vec::new();
        for (name, text) in &doc.sections {
            let cleaned = clean_text(text);
            all.extend(self.chunks(&cleaned, consumer).iter().map(|mut chunk| {
                chunk.section = Some(name.clone());
                chunk
            }));
        }
        all
    }
}

/// A chunk sequence that can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Chunks<'a> {
    text: &'a str,
    budget: ChunkBudget,
    consumer: Consumer,
}

impl<'a> Chunks<'a> {
    pub fn iter(&self) -> ChunkIter<'a> {
        ChunkIter {
            sentences: Sentences::new(self.text).peekable(),
            budget: self.budget,
            consumer: self.consumer,
            lookahead: None,
            ready: VecDeque::new(),
        }
    }
}

impl<'a> IntoIterator for &Chunks<'a> {
    type Item = Chunk;
    type IntoIter = ChunkIter<'a>;

    fn into_iter(self) -> ChunkIter<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for Chunks<'a> {
    type Item = Chunk;
    type IntoIter = ChunkIter<'a>;

    fn into_iter(self) -> ChunkIter<'a> {
        self.iter()
    }
}

/// Lazy chunk iterator; holds at most one chunk of lookahead.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    sentences: Peekable<Sentences<'a>>,
    budget: ChunkBudget,
    consumer: Consumer,
    lookahead: Option<Vec<&'a str>>,
    ready: VecDeque<Vec<&'a str>>,
}

impl<'a> ChunkIter<'a> {
    /// Greedily gather the next group of sentences.
    fn next_group(&mut self) -> Option<Vec<&'a str>> {
        let mut group = Vec::new();
        let mut words = 0;
        while let Some(&sentence) = self.sentences.peek() {
            let w = word_count(sentence);
            if !group.is_empty() && words + w > self.budget.max {
                break;
            }
            self.sentences.next();
            group.push(sentence);
            words += w;
            if words >= self.budget.target {
                break;
            }
        }
        (!group.is_empty()).then_some(group)
    }

    fn emit(&self, sentences: Vec<&'a str>) -> Chunk {
        let text = sentences.join(" ");
        Chunk {
            word_count: word_count(&text),
            sentence_count: sentences.len(),
            text,
            section: None,
            consumer: self.consumer,
        }
    }

    /// Fold an undersized final group into its predecessor, re-splitting if
    /// the merge would exceed the maximum.
    fn merge_tail(&self, previous: Vec<&'a str>, last: Vec<&'a str>) -> Vec<Vec<&'a str>> {
        let mut combined = previous;
        combined.extend(last);
        let counts: Vec<usize> = combined.iter().map(|s| word_count(s)).collect();
        let total: usize = counts.iter().sum();
        if total <= self.budget.max {
            return vec![combined];
        }

        let ChunkBudget { min, max, .. } = self.budget;
        let mut head = total;
        for split in (1..combined.len()).rev() {
            head -= counts[split];
            let tail = total - head;
            if tail > max {
                break;
            }
            if tail >= min && (min..=max).contains(&head) {
                let rest = combined.split_off(split);
                return vec![combined, rest];
            }
        }
        vec![combined]
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if let Some(group) = self.ready.pop_front() {
            return Some(self.emit(group));
        }
        let mut current = match self.lookahead.take() {
            Some(group) => group,
            None => self.next_group()?,
        };
        loop {
            let Some(following) = self.next_group() else {
                return Some(self.emit(current));
            };
            let words = group_words(&following);
            if words >= self.budget.min {
                self.lookahead = Some(following);
                return Some(self.emit(current));
            }
            if group_words(&current) + words <= self.budget.max {
                current.extend(following);
                continue;
            }
            if self.sentences.peek().is_none() {
                let merged = self.merge_tail(current, following);
                self.ready.extend(merged);
                let group = self.ready.pop_front()?;
                return Some(self.emit(group));
            }
            // Too big to fold back, and its first successor already overflowed
            // it: emitted undersized.
            self.lookahead = Some(following);
            return Some(self.emit(current));
        }
    }
}

fn group_words(group: &[&str]) -> usize {
    group.iter().map(|s| word_count(s)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlens_core::{ExtractionMethod, SectionMap};

    fn sentence(words: usize, tag: usize) -> String {
        let mut parts = vec![format!("Sentence{}", tag)];
        parts.extend((1..words).map(|i| format!("w{}", i)));
        format!("{}.", parts.join(" "))
    }

    fn text_of(lengths: &[usize]) -> String {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &w)| sentence(w, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn small_chunker() -> Chunker {
        Chunker::new(ChunkBudgets {
            short_form: ChunkBudget::new(20, 30, 10),
            long_form: ChunkBudget::new(60, 80, 30),
        })
    }

    #[test]
    fn test_split_sentences_respects_abbreviations() {
        let text = "See Fig. 2 for details. Smith et al. Showed this. It works! Does it? yes. J. Doe agreed.";
        assert_eq!(
            split_sentences(text),
            vec![
                "See Fig. 2 for details.",
                "Smith et al. Showed this.",
                "It works!",
                "Does it? yes.",
                "J. Doe agreed.",
            ]
        );
    }

    #[test]
    fn test_split_sentences_keeps_closers() {
        let text = "He said \"stop.\" Then (it ended.) Done";
        assert_eq!(
            split_sentences(text),
            vec!["He said \"stop.\"", "Then (it ended.)", "Done"]
        );
    }

    #[test]
    fn test_chunk_reconstruction() {
        let chunker = small_chunker();
        let text = text_of(&[5, 7, 9, 4, 12, 6, 8, 3, 11, 5, 2]);
        let expected = split_sentences(&text);

        for consumer in [Consumer::ShortForm, Consumer::LongForm] {
            let chunks: Vec<Chunk> = chunker.chunks(&text, consumer).iter().collect();
            let rebuilt: Vec<&str> = chunks.iter().flat_map(|c| split_sentences(&c.text)).collect();
            assert_eq!(rebuilt, expected);
            let sentence_total: usize = chunks.iter().map(|c| c.sentence_count).sum();
            assert_eq!(sentence_total, expected.len());
        }
    }

    #[test]
    fn test_chunk_size_bounds() {
        let chunker = small_chunker();
        let cases: Vec<Vec<usize>> = vec![
            vec![5, 7, 9, 4, 12, 6, 8, 3, 11, 5, 2],
            vec![8; 20],
            vec![3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 2],
            vec![9, 9, 9, 9, 9, 9, 9, 1],
            vec![12, 12, 12, 12, 12, 4],
            vec![20, 5, 28, 9, 9],
            vec![18, 4, 25, 6, 22],
        ];
        for lengths in cases {
            let text = text_of(&lengths);
            for consumer in [Consumer::ShortForm, Consumer::LongForm] {
                let budget = chunker.budgets().for_consumer(consumer);
                let chunks: Vec<Chunk> = chunker.chunks(&text, consumer).iter().collect();
                if chunks.len() == 1 {
                    continue;
                }
                for chunk in &chunks {
                    assert!(
                        (budget.min..=budget.max).contains(&chunk.word_count),
                        "{:?} chunk of {} words outside {:?} for {:?}",
                        consumer,
                        chunk.word_count,
                        budget,
                        lengths
                    );
                }
            }
        }
    }

    #[test]
    fn test_sole_small_chunk_is_emitted() {
        let chunker = Chunker::default();
        let chunks: Vec<Chunk> = chunker
            .chunks("Tiny text. Only two sentences.", Consumer::ShortForm)
            .iter()
            .collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count, 5);
        assert_eq!(chunks[0].sentence_count, 2);
    }

    #[test]
    fn test_tail_merge_resplits_when_over_max() {
        // 27 closes at target, the trailing 5 is undersized and 32 > max.
        let chunker = small_chunker();
        let text = text_of(&[9, 9, 9, 5]);
        let chunks: Vec<Chunk> = chunker.chunks(&text, Consumer::ShortForm).iter().collect();
        let words: Vec<usize> = chunks.iter().map(|c| c.word_count).collect();
        assert_eq!(words, vec![18, 14]);
        assert_eq!(chunks[1].sentence_count, 2);
    }

    #[test]
    fn test_undersized_group_folds_into_predecessor() {
        // The 5 closes early because 5 + 28 > max, then fits behind the 20.
        let chunker = small_chunker();
        let text = text_of(&[20, 5, 28]);
        let chunks: Vec<Chunk> = chunker.chunks(&text, Consumer::ShortForm).iter().collect();
        let words: Vec<usize> = chunks.iter().map(|c| c.word_count).collect();
        assert_eq!(words, vec![25, 28]);
        assert_eq!(chunks[0].sentence_count, 2);
    }

    #[test]
    fn test_undersized_group_without_room_is_kept() {
        // No neighbour can absorb the short group within max.
        let chunker = small_chunker();
        for (lengths, expected) in [
            (vec![5, 28, 28], vec![5, 28, 28]),
            (vec![25, 8, 28], vec![25, 8, 28]),
        ] {
            let text = text_of(&lengths);
            let words: Vec<usize> = chunker
                .chunks(&text, Consumer::ShortForm)
                .iter()
                .map(|c| c.word_count)
                .collect();
            assert_eq!(words, expected);
        }
    }

    #[test]
    fn test_chunks_are_restartable() {
        let chunker = small_chunker();
        let text = text_of(&[8; 10]);
        let chunks = chunker.chunks(&text, Consumer::ShortForm);
        let first: Vec<Chunk> = chunks.iter().collect();
        let second: Vec<Chunk> = (&chunks).into_iter().collect();
        assert_eq!(first, second);
        assert!(first.len() > 1);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunks("", Consumer::LongForm).iter().count(), 0);
        assert_eq!(chunker.chunks("   ", Consumer::LongForm).iter().count(), 0);
    }

    #[test]
    fn test_chunk_document_tags_sections() {
        let mut sections = SectionMap::new();
        sections.insert("Introduction".into(), "We study chunking. It is useful.".into());
        sections.insert("Results".into(), "It  works .".into());
        let doc = Document::new("p", "T", vec![], "", sections, ExtractionMethod::Fallback);

        let chunks = Chunker::default().chunk_document(&doc, Consumer::LongForm);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section.as_deref(), Some("Introduction"));
        assert_eq!(chunks[1].section.as_deref(), Some("Results"));
        assert_eq!(chunks[1].text, "It works.");
        assert!(chunks.iter().all(|c| c.consumer == Consumer::LongForm));
    }
}
