//! Corpus discovery and the default extraction/link collaborators.
//!
//! `PagedTextExtractor` reads text that was already pulled out of PDFs by an
//! external tool. Pages are separated by form feeds (`\x0c`), the convention
//! `pdftotext` follows. A `report.txt` next to `report.pdf` is treated as the
//! text of that PDF and links point at the PDF.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IngestionError;
use crate::traits::{ExtractedPage, TextExtractor, UrlLocator};
use crate::types::Document;

const PAGE_BREAK: u8 = 0x0c;

pub struct PagedTextExtractor {
    root: PathBuf,
}

impl PagedTextExtractor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every `.txt` file under the root as a document, sorted by id.
    /// Files that cannot be read are returned as errors alongside the
    /// documents that could.
    pub fn discover(&self) -> (Vec<Document>, Vec<IngestionError>) {
        let mut documents = Vec::new();
        let mut errors = Vec::new();
        for path in list_txt_files(&self.root) {
            match self.describe(&path) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable corpus file");
                    errors.push(e);
                }
            }
        }
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(root = %self.root.display(), documents = documents.len(), "discovered documents");
        (documents, errors)
    }

    fn describe(&self, txt_path: &Path) -> Result<Document, IngestionError> {
        let bytes = fs::read(txt_path).map_err(|source| IngestionError::Read { path: txt_path.to_path_buf(), source })?;
        let pdf_path = txt_path.with_extension("pdf");
        let source_path = if pdf_path.exists() { pdf_path } else { txt_path.to_path_buf() };
        let name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Document {
            id: self.doc_id(txt_path),
            name,
            locator: source_path.to_string_lossy().into_owned(),
            page_count: split_pages(&bytes).len() as u32,
        })
    }

    fn doc_id(&self, txt_path: &Path) -> String {
        let relative = txt_path.strip_prefix(&self.root).unwrap_or(txt_path);
        relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn text_path(&self, document: &Document) -> PathBuf {
        self.root.join(format!("{}.txt", document.id))
    }
}

impl TextExtractor for PagedTextExtractor {
    fn extract(&self, document: &Document) -> Result<Vec<ExtractedPage>, IngestionError> {
        let path = self.text_path(document);
        let bytes = fs::read(&path).map_err(|source| IngestionError::Read { path: path.clone(), source })?;
        let pages = split_pages(&bytes)
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let page_number = i as u32 + 1;
                let text = std::str::from_utf8(raw)
                    .map(str::to_string)
                    .map_err(|e| IngestionError::UnreadablePage {
                        doc_id: document.id.clone(),
                        page_number,
                        reason: e.to_string(),
                    });
                ExtractedPage { page_number, text }
            })
            .collect();
        Ok(pages)
    }
}

/// Splits raw extractor output into pages. A trailing form feed (as written
/// by `pdftotext`) does not start an extra page.
fn split_pages(bytes: &[u8]) -> Vec<&[u8]> {
    let mut pages: Vec<&[u8]> = bytes.split(|b| *b == PAGE_BREAK).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.iter().all(u8::is_ascii_whitespace)) {
        pages.pop();
    }
    pages
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("txt") {
            txt_files.push(path.to_path_buf());
        }
    }
    txt_files.sort();
    txt_files
}

/// Builds links that open the source document at a given page.
#[derive(Debug, Clone, Default)]
pub struct FileUrlLocator {
    base_url: Option<String>,
}

impl FileUrlLocator {
    pub fn new(base_url: Option<String>) -> Self {
        Self { base_url }
    }
}

impl UrlLocator for FileUrlLocator {
    fn locate(&self, document: &Document, page_number: u32) -> String {
        match &self.base_url {
            Some(base) => format!("{}/{}#page={}", base.trim_end_matches('/'), document.name.replace(' ', "%20"), page_number),
            None => {
                let path = Path::new(&document.locator);
                let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                let mut location = absolute.to_string_lossy().replace('\\', "/");
                if !location.starts_with('/') {
                    location.insert(0, '/');
                }
                format!("file://{}#page={}", location.replace(' ', "%20"), page_number)
            }
        }
    }
}

/// Page texts held in memory, keyed by document id. Used for demo corpora
/// and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    documents: Vec<Document>,
    pages: BTreeMap<String, Vec<String>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document; `page_count` is taken from `pages`.
    pub fn add(&mut self, id: &str, name: &str, locator: &str, pages: Vec<String>) -> &mut Self {
        self.documents.push(Document {
            id: id.to_string(),
            name: name.to_string(),
            locator: locator.to_string(),
            page_count: pages.len() as u32,
        });
        self.pages.insert(id.to_string(), pages);
        self
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl TextExtractor for InMemoryCorpus {
    fn extract(&self, document: &Document) -> Result<Vec<ExtractedPage>, IngestionError> {
        let pages = self
            .pages
            .get(&document.id)
            .ok_or_else(|| IngestionError::UnknownDocument(document.id.clone()))?;
        Ok(pages
            .iter()
            .enumerate()
            .map(|(i, text)| ExtractedPage { page_number: i as u32 + 1, text: Ok(text.clone()) })
            .collect())
    }
}
