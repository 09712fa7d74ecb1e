//! Configuration loader and path helpers.
//!
//! Uses Figment to merge serde defaults, `pagesearch.toml`,
//! `pagesearch.<env>.toml` (from `RUST_ENV`) and `PAGESEARCH_*` env vars
//! (nested keys separated by `__`, e.g. `PAGESEARCH_SEARCH__HYBRID_WEIGHT`).
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not", "this",
    "these", "they", "them", "their", "there", "then", "than", "so", "if", "when", "where", "why",
    "how", "what", "which", "who", "whom", "whose", "can", "could", "should", "would", "may",
    "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub lexical: LexicalConfig,
    pub semantic: SemanticConfig,
    pub search: SearchConfig,
    pub highlight: HighlightConfig,
    pub links: LinkConfig,
}

/// What the service serves when the stored artifact cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    #[default]
    Empty,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub corpus_dir: String,
    pub artifact_path: String,
    pub fallback: Fallback,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_dir: "data/corpus".to_string(),
            artifact_path: "data/pagesearch-index.json".to_string(),
            fallback: Fallback::Empty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Paragraphs with fewer characters than this are dropped.
    pub min_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    /// Keep only the N most frequent corpus terms.
    pub max_vocabulary: Option<usize>,
    pub stop_words: Vec<String>,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            max_vocabulary: None,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    #[default]
    Hashing,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub embedder: EmbedderKind,
    pub batch_size: usize,
    pub hashing_dim: usize,
    pub model_dir: Option<String>,
    pub max_tokens: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self { embedder: EmbedderKind::Hashing, batch_size: 32, hashing_dim: 384, model_dir: None, max_tokens: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Weight of the semantic side in fusion, in [0, 1].
    pub hybrid_weight: f32,
    pub default_results: usize,
    pub max_results_cap: usize,
    /// Semantic candidates requested per wanted result.
    pub candidate_multiplier: usize,
    pub max_candidates: usize,
    pub min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hybrid_weight: 0.7,
            default_results: 5,
            max_results_cap: 20,
            candidate_multiplier: 4,
            max_candidates: 200,
            min_score: 0.0,
        }
    }
}

impl SearchConfig {
    /// Number of semantic neighbours to request for `max_results` results.
    pub fn candidate_count(&self, max_results: usize) -> usize {
        max_results
            .saturating_mul(self.candidate_multiplier.max(1))
            .min(self.max_candidates.max(max_results))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub pre_tag: String,
    pub post_tag: String,
    /// Query terms shorter than this (in characters) are not highlighted.
    /// The default of 3 leaves two-letter words like "of" and "to" unmarked.
    pub min_term_chars: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self { pre_tag: "<mark>".to_string(), post_tag: "</mark>".to_string(), min_term_chars: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// When set, links point at `<base_url>/<file name>#page=N` instead of
    /// local `file://` URLs.
    pub base_url: Option<String>,
}

impl Settings {
    /// Loads `pagesearch.toml` and the `RUST_ENV` overlay from the working
    /// directory.
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment(None))
    }

    /// Loads a single explicit config file instead of the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::extract(Self::figment(Some(path)))
    }

    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        match config_file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
                figment = figment.merge(Toml::file("pagesearch.toml"));
                match env_name.as_str() {
                    "dev" | "development" => figment = figment.merge(Toml::file("pagesearch.dev.toml")),
                    "prod" | "production" => figment = figment.merge(Toml::file("pagesearch.prod.toml")),
                    "test" | "testing" => figment = figment.merge(Toml::file("pagesearch.test.toml")),
                    _ => {}
                }
            }
        }
        figment.merge(Env::prefixed("PAGESEARCH_").split("__"))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let weight = self.search.hybrid_weight;
        if !(0.0..=1.0).contains(&weight) {
            return Err(Error::InvalidConfig(format!("search.hybrid_weight must be in [0, 1], got {weight}")));
        }
        if !self.search.min_score.is_finite() || self.search.min_score < 0.0 {
            return Err(Error::InvalidConfig("search.min_score must be a non-negative number".to_string()));
        }
        if self.search.default_results == 0 || self.search.max_results_cap == 0 {
            return Err(Error::InvalidConfig("search result counts must be at least 1".to_string()));
        }
        if self.lexical.max_vocabulary == Some(0) {
            return Err(Error::InvalidConfig("lexical.max_vocabulary must be positive when set".to_string()));
        }
        if self.semantic.batch_size == 0 || self.semantic.hashing_dim == 0 {
            return Err(Error::InvalidConfig("semantic.batch_size and semantic.hashing_dim must be positive".to_string()));
        }
        Ok(())
    }

    /// Rewrites relative data paths so they resolve against `base` (usually
    /// the directory holding the config file).
    pub fn resolve_paths(&mut self, base: &Path) {
        self.data.corpus_dir = resolve_with_base(base, &self.data.corpus_dir).to_string_lossy().into_owned();
        self.data.artifact_path = resolve_with_base(base, &self.data.artifact_path).to_string_lossy().into_owned();
        if let Some(dir) = self.semantic.model_dir.as_mut() {
            *dir = resolve_with_base(base, dir.as_str()).to_string_lossy().into_owned();
        }
    }

    pub fn corpus_dir(&self) -> PathBuf {
        expand_path(&self.data.corpus_dir)
    }

    pub fn artifact_path(&self) -> PathBuf {
        expand_path(&self.data.artifact_path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
