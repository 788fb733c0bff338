//! Chunk module - the retrieval unit produced by the document chunker

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounded, positioned span of page text
///
/// `start_pos` and `end_pos` are character offsets (Unicode scalar values, not
/// bytes) into the page text the chunk was cut from, so
/// `page.chars().skip(start_pos).take(end_pos - start_pos)` equals `text`.
///
/// Fields are read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    doc_id: String,
    page_number: u32,
    text: String,
    start_pos: usize,
    end_pos: usize,
}

impl Chunk {
    /// Create a new chunk
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_domain::Chunk;
    ///
    /// let chunk = Chunk::new("doc_1_chunk_0", "doc_1", 1, "Owner: John Smith", 0, 17);
    /// assert_eq!(chunk.len(), 17);
    /// assert_eq!(chunk.page_number(), 1);
    /// ```
    pub fn new(
        id: impl Into<String>,
        doc_id: impl Into<String>,
        page_number: u32,
        text: impl Into<String>,
        start_pos: usize,
        end_pos: usize,
    ) -> Self {
        Self {
            id: id.into(),
            doc_id: doc_id.into(),
            page_number,
            text: text.into(),
            start_pos,
            end_pos,
        }
    }

    /// Unique chunk identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the document the chunk belongs to
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Page the chunk was cut from
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Chunk text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character offset of the first character
    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    /// Character offset one past the last character
    pub fn end_pos(&self) -> usize {
        self.end_pos
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end_pos.saturating_sub(self.start_pos)
    }

    /// True if the chunk spans no characters
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (page {}, {}..{})",
            self.id, self.page_number, self.start_pos, self.end_pos
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_accessors() {
        let chunk = Chunk::new("c1", "doc", 3, "Built in 1990.", 44, 58);
        assert_eq!(chunk.id(), "c1");
        assert_eq!(chunk.doc_id(), "doc");
        assert_eq!(chunk.page_number(), 3);
        assert_eq!(chunk.text(), "Built in 1990.");
        assert_eq!(chunk.len(), 14);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_chunk_display() {
        let chunk = Chunk::new("c1", "doc", 2, "text", 10, 14);
        assert_eq!(chunk.to_string(), "c1 (page 2, 10..14)");
    }

    #[test]
    fn test_chunk_serializes_positions() {
        let chunk = Chunk::new("c1", "doc", 1, "abc", 0, 3);
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["start_pos"], 0);
        assert_eq!(json["end_pos"], 3);
        assert_eq!(json["page_number"], 1);
    }
}
