//! Byte offset to line/column mapping

use crate::types::{Pos, SourceRange};
use std::ops::Range;

/// Maps byte offsets in one file to 1-based line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    filename: String,
    content: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(filename: impl Into<String>, content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            filename: filename.into(),
            content: content.to_string(),
            line_starts,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Converts a byte offset into a position
    ///
    /// Offsets past the end of the file clamp to the end.
    pub fn position(&self, byte: usize) -> Pos {
        let byte = byte.min(self.content.len());
        let line_idx = match self.line_starts.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self
            .content
            .get(line_start..byte)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(byte - line_start);

        Pos::new(line_idx as u32 + 1, column as u32 + 1, byte)
    }

    /// Converts a byte span into a source range
    pub fn range(&self, span: &Range<usize>) -> SourceRange {
        SourceRange::new(
            self.filename.clone(),
            self.position(span.start),
            self.position(span.end),
        )
    }

    /// Converts an optional span, falling back to the start of the file
    pub fn optional_range(&self, span: Option<Range<usize>>) -> SourceRange {
        match span {
            Some(span) => self.range(&span),
            None => SourceRange::file_start(self.filename.clone()),
        }
    }
}
