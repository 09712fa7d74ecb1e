//! Persistence of the index artifact as a single JSON file.
//!
//! The file is an envelope `{format_version, checksum, payload}` where
//! `checksum` is the BLAKE3 hex digest of the exact payload bytes. Saving
//! writes a temporary file next to the target and renames it into place, so
//! readers only ever see a complete artifact.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use pagesearch_core::{ArtifactLoadError, IndexBuildError};

use crate::artifact::{IndexArtifact, FORMAT_VERSION};

pub trait ArtifactStore: Send + Sync {
    fn save(&self, artifact: &IndexArtifact, path: &Path) -> Result<(), IndexBuildError>;
    fn load(&self, path: &Path) -> Result<IndexArtifact, ArtifactLoadError>;
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    format_version: u32,
    checksum: String,
    payload: &'a RawValue,
}

#[derive(Deserialize)]
struct EnvelopeIn<'a> {
    format_version: u32,
    checksum: String,
    #[serde(borrow)]
    payload: &'a RawValue,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArtifactStore;

impl JsonArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

fn checksum(payload: &RawValue) -> String {
    blake3::hash(payload.get().as_bytes()).to_hex().to_string()
}

impl ArtifactStore for JsonArtifactStore {
    fn save(&self, artifact: &IndexArtifact, path: &Path) -> Result<(), IndexBuildError> {
        let persist_err = |reason: String| IndexBuildError::Persist { path: path.to_path_buf(), reason };

        let payload = serde_json::value::to_raw_value(artifact).map_err(|e| persist_err(e.to_string()))?;
        let envelope = EnvelopeOut { format_version: FORMAT_VERSION, checksum: checksum(&payload), payload: &payload };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| persist_err(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().map_err(|e| persist_err(e.to_string()))?,
        };
        fs::create_dir_all(&dir).map_err(|e| persist_err(e.to_string()))?;

        // Atomic write: temp file in the same directory, then rename
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| persist_err(e.to_string()))?;
        tmp.write_all(&bytes).map_err(|e| persist_err(e.to_string()))?;
        tmp.as_file().sync_all().map_err(|e| persist_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| persist_err(e.error.to_string()))?;

        tracing::info!(
            path = %path.display(),
            passages = artifact.passages.len(),
            bytes = bytes.len(),
            "saved index artifact"
        );
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<IndexArtifact, ArtifactLoadError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactLoadError::Missing(path.to_path_buf()));
            }
            Err(source) => return Err(ArtifactLoadError::Io { path: path.to_path_buf(), source }),
        };
        let corrupt = |reason: String| ArtifactLoadError::Corrupt { path: path.to_path_buf(), reason };

        let envelope: EnvelopeIn<'_> = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(ArtifactLoadError::Incompatible {
                path: path.to_path_buf(),
                found: envelope.format_version,
                expected: FORMAT_VERSION,
            });
        }
        if checksum(envelope.payload) != envelope.checksum {
            return Err(corrupt("checksum mismatch".to_string()));
        }
        let artifact: IndexArtifact =
            serde_json::from_str(envelope.payload.get()).map_err(|e| corrupt(e.to_string()))?;
        artifact.validate().map_err(corrupt)?;

        tracing::info!(
            path = %path.display(),
            documents = artifact.documents.len(),
            passages = artifact.passages.len(),
            "loaded index artifact"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesearch_core::config::LexicalConfig;

    #[test]
    fn missing_file_is_reported_as_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = JsonArtifactStore.load(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Missing(_)));
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        let artifact = IndexArtifact::empty("hashing:xxh64:d4", 4, &LexicalConfig::default());
        JsonArtifactStore.save(&artifact, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("\"dimension\":4", "\"dimension\":5")).unwrap();
        let err = JsonArtifactStore.load(&path).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Corrupt { ref reason, .. } if reason.contains("checksum")), "{err}");
    }

    #[test]
    fn other_format_versions_are_incompatible() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        fs::write(&path, r#"{"format_version":99,"checksum":"","payload":{}}"#).unwrap();
        let err = JsonArtifactStore.load(&path).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Incompatible { found: 99, expected: FORMAT_VERSION, .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(JsonArtifactStore.load(&path), Err(ArtifactLoadError::Corrupt { .. })));
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/index.json");
        let artifact = IndexArtifact::empty("e", 2, &LexicalConfig::default());
        JsonArtifactStore.save(&artifact, &path).unwrap();
        assert_eq!(JsonArtifactStore.load(&path).unwrap(), artifact);
    }

    #[test]
    fn resealed_artifact_with_inconsistent_idf_is_corrupt() {
        use crate::pipeline::ArtifactBuilder;
        use pagesearch_core::config::Settings;
        use pagesearch_core::corpus::InMemoryCorpus;
        use pagesearch_embed::HashingEmbedder;

        let mut corpus = InMemoryCorpus::new();
        corpus.add("a", "a.pdf", "a.pdf", vec!["Breach notification within seventy-two hours.".to_string()]);
        let settings = Settings::default();
        let embedder = HashingEmbedder::new(16);
        let link = |doc: &pagesearch_core::types::Document, page: u32| format!("{}#page={page}", doc.locator);
        let (artifact, _) = ArtifactBuilder::new(&settings, &embedder, &link)
            .build(corpus.documents(), &corpus, Vec::new())
            .unwrap();

        let mut value = serde_json::to_value(&artifact).unwrap();
        value["lexical"]["idf"] = serde_json::json!([]);
        let tampered: IndexArtifact = serde_json::from_value(value).unwrap();

        // save computes a fresh checksum over the tampered payload
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        JsonArtifactStore.save(&tampered, &path).unwrap();
        let err = JsonArtifactStore.load(&path).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Corrupt { ref reason, .. } if reason.contains("idf")), "{err}");
    }

    #[test]
    fn resealed_artifact_with_extra_semantic_vector_is_corrupt() {
        let mut artifact = IndexArtifact::empty("e", 2, &LexicalConfig::default());
        let mut value = serde_json::to_value(&artifact).unwrap();
        value["semantic"]["passage_ids"] = serde_json::json!([]);
        value["semantic"]["vectors"] = serde_json::json!([[1.0]]);
        artifact = serde_json::from_value(value).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        JsonArtifactStore.save(&artifact, &path).unwrap();
        assert!(matches!(JsonArtifactStore.load(&path), Err(ArtifactLoadError::Corrupt { .. })));
    }
}
