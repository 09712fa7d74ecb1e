//! Query-term highlighting.
//!
//! Terms come from the same analyzer as the lexical index but keep stop
//! words. Every case-insensitive literal occurrence of a term is marked, so
//! "data" also marks the front of "database" while "protection" never marks
//! "protected". Overlapping or touching matches are merged into one run.

use std::ops::Range;

use pagesearch_core::config::HighlightConfig;

use crate::analyzer::Analyzer;

#[derive(Debug, Clone)]
pub struct Highlighter {
    analyzer: Analyzer,
    pre_tag: String,
    post_tag: String,
    min_term_chars: usize,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(&HighlightConfig::default())
    }
}

impl Highlighter {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            analyzer: Analyzer::plain(),
            pre_tag: config.pre_tag.clone(),
            post_tag: config.post_tag.clone(),
            min_term_chars: config.min_term_chars,
        }
    }

    /// Distinct query terms eligible for highlighting, in query order.
    pub fn query_terms(&self, query: &str) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for term in self.analyzer.terms(query) {
            if term.chars().count() >= self.min_term_chars.max(1) && !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }

    /// Merged byte ranges of `text` matched by the query terms.
    pub fn spans(&self, text: &str, query: &str) -> Vec<Range<usize>> {
        let terms = self.query_terms(query);
        if terms.is_empty() || text.is_empty() {
            return Vec::new();
        }
        let folded = FoldedText::new(text);
        let mut spans: Vec<Range<usize>> = terms.iter().flat_map(|term| folded.find_all(term)).collect();
        merge_spans(&mut spans);
        spans
    }

    pub fn highlight(&self, text: &str, query: &str) -> String {
        let spans = self.spans(text, query);
        if spans.is_empty() {
            return text.to_string();
        }
        let extra = spans.len() * (self.pre_tag.len() + self.post_tag.len());
        let mut out = String::with_capacity(text.len() + extra);
        let mut cursor = 0;
        for span in spans {
            out.push_str(&text[cursor..span.start]);
            out.push_str(&self.pre_tag);
            out.push_str(&text[span.clone()]);
            out.push_str(&self.post_tag);
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

/// Lower-cased copy of a text with a map from every folded byte back to the
/// original character it came from. Lower-casing can change byte lengths
/// ("İ" becomes two chars), so offsets cannot be shared directly.
struct FoldedText {
    folded: String,
    origin_start: Vec<usize>,
    origin_end: Vec<usize>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin_start = Vec::with_capacity(text.len());
        let mut origin_end = Vec::with_capacity(text.len());
        for (idx, ch) in text.char_indices() {
            let before = folded.len();
            folded.extend(ch.to_lowercase());
            for _ in before..folded.len() {
                origin_start.push(idx);
                origin_end.push(idx + ch.len_utf8());
            }
        }
        Self { folded, origin_start, origin_end }
    }

    /// All occurrences of `term`, overlapping ones included, as original
    /// byte ranges.
    fn find_all(&self, term: &str) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(pos) = self.folded[from..].find(term) {
            let start = from + pos;
            let end = start + term.len();
            found.push(self.origin_start[start]..self.origin_end[end - 1]);
            let step = self.folded[start..].chars().next().map_or(1, char::len_utf8);
            from = start + step;
            if from >= self.folded.len() {
                break;
            }
        }
        found
    }
}

fn merge_spans(spans: &mut Vec<Range<usize>>) {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans.drain(..) {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    *spans = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matching_does_not_stem() {
        let h = Highlighter::default();
        assert_eq!(
            h.highlight("Personal data must be protected.", "data protection"),
            "Personal <mark>data</mark> must be protected."
        );
    }

    #[test]
    fn preserves_original_casing() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("GDPR and gdpr and Gdpr", "gdpr"), "<mark>GDPR</mark> and <mark>gdpr</mark> and <mark>Gdpr</mark>");
    }

    #[test]
    fn partial_matches_inside_words() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("Databases hold data.", "data"), "<mark>Data</mark>bases hold <mark>data</mark>.");
    }

    #[test]
    fn overlapping_terms_merge_into_one_run() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("breach notification", "breach notif notification"), "<mark>breach</mark> <mark>notification</mark>");
        assert_eq!(h.highlight("dataprotection", "data protection"), "<mark>dataprotection</mark>");
        assert_eq!(h.spans("aaaa", "aaa"), vec![0..4]);
    }

    #[test]
    fn stop_words_typed_by_the_user_are_highlighted() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("Rights of the data subject", "the rights"), "<mark>Rights</mark> of <mark>the</mark> data subject");
    }

    #[test]
    fn short_terms_below_minimum_are_ignored() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("An EU regulation", "an eu"), "An EU regulation");
        let all = Highlighter::new(&HighlightConfig { min_term_chars: 1, ..HighlightConfig::default() });
        assert_eq!(all.highlight("An EU regulation", "eu"), "An <mark>EU</mark> regulation");
    }

    #[test]
    fn lowering_the_minimum_marks_two_letter_stop_words() {
        let query = "right of access";
        let text = "Right of access to personal data";
        assert_eq!(Highlighter::default().highlight(text, query), "<mark>Right</mark> of <mark>access</mark> to personal data");
        let two = Highlighter::new(&HighlightConfig { min_term_chars: 2, ..HighlightConfig::default() });
        assert_eq!(two.highlight(text, query), "<mark>Right</mark> <mark>of</mark> <mark>access</mark> to personal data");
    }

    #[test]
    fn no_match_returns_text_unchanged() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("Nothing relevant here.", "gdpr"), "Nothing relevant here.");
        assert_eq!(h.highlight("Nothing relevant here.", ""), "Nothing relevant here.");
    }

    #[test]
    fn multibyte_case_folding_maps_back_to_original_bytes() {
        let h = Highlighter::default();
        assert_eq!(h.highlight("ÜBER Daten", "über"), "<mark>ÜBER</mark> Daten");
    }

    #[test]
    fn custom_markers() {
        let h = Highlighter::new(&HighlightConfig { pre_tag: "**".to_string(), post_tag: "**".to_string(), min_term_chars: 3 });
        assert_eq!(h.highlight("Right to object", "object"), "Right to **object**");
    }
}
