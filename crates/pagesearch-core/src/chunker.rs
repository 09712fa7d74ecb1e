//! Paragraph chunking of extracted page text.
//!
//! A paragraph is a maximal run of non-blank lines; blank (whitespace-only)
//! lines separate paragraphs. Every passage records the byte range of its
//! trimmed text so highlighting can be mapped back onto the page.

use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::types::Passage;

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Splits one page into passages, in page order. The `url` of each
    /// passage is left empty for the caller to fill in.
    pub fn chunk(&self, doc_id: &str, page_number: u32, page_text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut ordinal = 0u32;
        for span in paragraph_spans(page_text) {
            let text = &page_text[span.clone()];
            if text.chars().count() < self.config.min_chars {
                continue;
            }
            passages.push(Passage {
                id: Passage::make_id(doc_id, page_number, ordinal),
                doc_id: doc_id.to_string(),
                page_number,
                ordinal,
                start: span.start,
                end: span.end,
                text: text.to_string(),
                url: String::new(),
            });
            ordinal += 1;
        }
        passages
    }
}

/// Byte ranges of the trimmed, non-empty paragraphs of `text`.
pub fn paragraph_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(span) = current.take() {
                spans.extend(trim_span(text, span));
            }
            continue;
        }
        match current.as_mut() {
            Some(span) => span.end = offset,
            None => current = Some(line_start..offset),
        }
    }
    if let Some(span) = current {
        spans.extend(trim_span(text, span));
    }
    spans
}

fn trim_span(text: &str, span: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[span.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    let trimmed = span.start + leading..span.end - trailing;
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines_and_keeps_offsets() {
        let page = "  First paragraph\nstill first.\n\n\t \nSecond one.\r\n\r\nThird\n";
        let chunker = Chunker::default();
        let passages = chunker.chunk("doc", 2, page);
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].text, "First paragraph\nstill first.");
        assert_eq!(passages[1].text, "Second one.");
        assert_eq!(passages[2].text, "Third");
        for p in &passages {
            assert_eq!(&page[p.span()], p.text);
            assert_eq!(p.page_number, 2);
        }
        assert_eq!(passages[1].id, "doc:00002:0001");
    }

    #[test]
    fn whitespace_only_page_yields_nothing() {
        assert!(Chunker::default().chunk("doc", 1, " \n\n\t\n").is_empty());
        assert!(Chunker::default().chunk("doc", 1, "").is_empty());
    }

    #[test]
    fn min_chars_drops_short_fragments_without_gaps_in_ordinals() {
        let chunker = Chunker::new(ChunkingConfig { min_chars: 10 });
        let passages = chunker.chunk("d", 1, "Header\n\nA much longer paragraph.\n\n7\n\nAnother long paragraph.");
        let ordinals: Vec<u32> = passages.iter().map(|p| p.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
        assert_eq!(passages[1].text, "Another long paragraph.");
    }

    #[test]
    fn multibyte_text_offsets_are_char_boundaries() {
        let page = "Über die Daten\n\n«Schutz» für alle";
        let passages = Chunker::default().chunk("d", 1, page);
        assert_eq!(passages.len(), 2);
        assert_eq!(&page[passages[1].span()], "«Schutz» für alle");
    }
}
