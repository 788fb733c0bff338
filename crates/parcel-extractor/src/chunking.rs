//! Sentence-respecting document chunking
//!
//! Page text is split into sentences, sentences are packed into chunks up to
//! `chunk_size` characters, and each new chunk is seeded with trailing whole
//! sentences of the previous one. All lengths and offsets are counted in
//! characters of the untrimmed page text.

use crate::config::ChunkConfig;
use crate::error::ExtractorError;
use parcel_domain::Chunk;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

/// Splits page text into overlapping, positioned chunks
#[derive(Debug, Clone)]
pub struct DocumentChunker {
    config: ChunkConfig,
    boundary: Regex,
}

/// Half-open character range `[start, end)` of one sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sentence {
    start: usize,
    end: usize,
}

impl Sentence {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Byte offsets of every character, for converting between the two
struct PageText<'a> {
    text: &'a str,
    offsets: Vec<usize>,
}

impl<'a> PageText<'a> {
    fn new(text: &'a str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { text, offsets }
    }

    /// Character index of a byte offset on a char boundary
    fn char_at(&self, byte: usize) -> usize {
        self.offsets.partition_point(|&b| b < byte)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }
}

/// Collects chunks for a single call and hands out their ids
struct ChunkSink<'a> {
    page: &'a PageText<'a>,
    doc_id: &'a str,
    page_number: u32,
    tag: String,
    chunks: Vec<Chunk>,
}

impl ChunkSink<'_> {
    fn emit(&mut self, start: usize, end: usize) {
        let id = format!("{}_chunk_{}_{}", self.doc_id, self.chunks.len(), self.tag);
        self.chunks.push(Chunk::new(
            id,
            self.doc_id,
            self.page_number,
            self.page.slice(start, end),
            start,
            end,
        ));
    }
}

fn sentence_boundary(terminators: &str) -> Result<Regex, ExtractorError> {
    let class: String = terminators
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    Regex::new(&format!(r"[{}](\s+)\p{{Lu}}", class))
        .map_err(|e| ExtractorError::Config(format!("Invalid sentence terminators: {}", e)))
}

/// Per-call id suffix; a fresh uuid keeps ids from repeating across calls
fn call_tag() -> String {
    let simple = Uuid::now_v7().simple().to_string();
    simple[simple.len() - 8..].to_string()
}

impl DocumentChunker {
    /// Create a chunker, rejecting an invalid configuration
    pub fn new(config: ChunkConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let boundary = sentence_boundary(&config.sentence_terminators)?;
        Ok(Self { config, boundary })
    }

    /// A new chunker with different settings; `self` is left as is
    pub fn with_config(&self, config: ChunkConfig) -> Result<Self, ExtractorError> {
        Self::new(config)
    }

    /// The chunking settings
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk one page of a document
    ///
    /// Chunks come back in left-to-right order, and
    /// `chunk.text()` is exactly the characters `start_pos..end_pos` of `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_extractor::{ChunkConfig, DocumentChunker};
    ///
    /// let chunker = DocumentChunker::new(ChunkConfig {
    ///     chunk_size: 40,
    ///     chunk_overlap: 10,
    ///     min_chunk_size: 10,
    ///     ..ChunkConfig::default()
    /// })
    /// .unwrap();
    ///
    /// let chunks = chunker.chunk_document(
    ///     "Owner: John Smith. Property at 123 Main St. Built in 1990.",
    ///     "deed_1",
    ///     1,
    /// );
    /// assert_eq!(chunks.len(), 2);
    /// assert_eq!(chunks[0].text(), "Owner: John Smith.");
    /// ```
    pub fn chunk_document(&self, text: &str, doc_id: &str, page_number: u32) -> Vec<Chunk> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let page = PageText::new(text);
        let lead = text.len() - text.trim_start().len();
        let mut sink = ChunkSink {
            page: &page,
            doc_id,
            page_number,
            tag: call_tag(),
            chunks: Vec::new(),
        };

        let start = page.char_at(lead);
        let end = page.char_at(lead + trimmed.len());
        if end - start < self.config.min_chunk_size {
            sink.emit(start, end);
            return sink.chunks;
        }

        let sentences = self.sentences(&page, trimmed, lead);
        self.pack(&sentences, &mut sink);

        debug!(
            doc_id,
            page_number,
            sentences = sentences.len(),
            chunks = sink.chunks.len(),
            "Chunked page"
        );
        sink.chunks
    }

    fn sentences(&self, page: &PageText<'_>, trimmed: &str, lead: usize) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut sentence_start = lead;

        for caps in self.boundary.captures_iter(trimmed) {
            if let Some(gap) = caps.get(1) {
                sentences.push(Sentence {
                    start: page.char_at(sentence_start),
                    end: page.char_at(lead + gap.start()),
                });
                sentence_start = lead + gap.end();
            }
        }

        sentences.push(Sentence {
            start: page.char_at(sentence_start),
            end: page.char_at(lead + trimmed.len()),
        });
        sentences
    }

    fn pack(&self, sentences: &[Sentence], sink: &mut ChunkSink<'_>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        // Sentence index range [lo, hi) of the open chunk
        let mut window: Option<(usize, usize)> = None;

        for (i, sentence) in sentences.iter().enumerate() {
            if sentence.len() > size {
                if let Some((lo, hi)) = window.take() {
                    sink.emit(sentences[lo].start, sentences[hi - 1].end);
                }
                self.split_oversized(*sentence, sink);
                continue;
            }

            window = match window {
                None => Some((i, i + 1)),
                Some((lo, _)) if sentence.end - sentences[lo].start <= size => Some((lo, i + 1)),
                Some((lo, hi)) => {
                    let closed_end = sentences[hi - 1].end;
                    sink.emit(sentences[lo].start, closed_end);

                    let mut seed = hi;
                    while seed > lo && closed_end - sentences[seed - 1].start <= overlap {
                        seed -= 1;
                    }
                    // Drop the oldest seeded sentences until the next one fits
                    while seed < hi && sentence.end - sentences[seed].start > size {
                        seed += 1;
                    }
                    Some((seed.min(i), i + 1))
                }
            };
        }

        if let Some((lo, hi)) = window {
            sink.emit(sentences[lo].start, sentences[hi - 1].end);
        }
    }

    /// Character-window fallback for a sentence longer than `chunk_size`
    fn split_oversized(&self, sentence: Sentence, sink: &mut ChunkSink<'_>) {
        let size = self.config.chunk_size;
        let step = size - self.config.chunk_overlap;
        let mut start = sentence.start;

        loop {
            let end = (start + size).min(sentence.end);
            sink.emit(start, end);
            if end == sentence.end {
                break;
            }
            start += step;
        }
    }
}
