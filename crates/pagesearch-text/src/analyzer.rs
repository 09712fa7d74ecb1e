use std::fmt;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Lower-cases and splits on non-alphanumeric boundaries, optionally
/// dropping stop words. The same analyzer feeds the vocabulary build, query
/// vectors and (without stop words) highlighting.
#[derive(Clone)]
pub struct Analyzer {
    inner: TextAnalyzer,
    drops_stop_words: bool,
}

impl Analyzer {
    pub fn with_stop_words(stop_words: &[String]) -> Self {
        if stop_words.is_empty() {
            return Self::plain();
        }
        let inner = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(StopWordFilter::remove(stop_words.iter().map(|s| s.to_lowercase())))
            .build();
        Self { inner, drops_stop_words: true }
    }

    pub fn plain() -> Self {
        let inner = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build();
        Self { inner, drops_stop_words: false }
    }

    /// Terms of `text` in order of appearance, duplicates included.
    pub fn terms(&self, text: &str) -> Vec<String> {
        // token_stream needs &mut self
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        terms
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("drops_stop_words", &self.drops_stop_words).finish()
    }
}
