use std::fs;
use tempfile::TempDir;

use pagesearch_core::config::{Fallback, Settings};
use pagesearch_core::corpus::{FileUrlLocator, InMemoryCorpus, PagedTextExtractor};
use pagesearch_core::traits::{TextExtractor, UrlLocator};
use pagesearch_core::{Chunker, IngestionError};

#[test]
fn discover_counts_form_feed_pages_and_prefers_pdf_names() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("policies")).unwrap();
    fs::write(dir.join("policies/gdpr.txt"), "Page one text.\x0cPage two text.\x0c").unwrap();
    fs::write(dir.join("policies/gdpr.pdf"), b"%PDF-1.4").unwrap();
    fs::write(dir.join("notes.txt"), "Only page").unwrap();

    let extractor = PagedTextExtractor::new(dir);
    let (docs, errors) = extractor.discover();
    assert!(errors.is_empty());
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "notes");
    assert_eq!(docs[0].name, "notes.txt");
    assert_eq!(docs[0].page_count, 1);
    assert_eq!(docs[1].id, "policies/gdpr");
    assert_eq!(docs[1].name, "gdpr.pdf");
    assert_eq!(docs[1].page_count, 2, "trailing form feed does not add a page");

    let pages = extractor.extract(&docs[1]).expect("extract");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].page_number, 2);
    assert_eq!(pages[1].text.as_deref().unwrap(), "Page two text.");
}

#[test]
fn invalid_utf8_page_fails_alone() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = b"Good page.\x0c".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, 0x41]);
    bytes.extend_from_slice(b"\x0cAnother good page.");
    fs::write(tmp.path().join("mixed.txt"), bytes).unwrap();

    let extractor = PagedTextExtractor::new(tmp.path());
    let (docs, _) = extractor.discover();
    let pages = extractor.extract(&docs[0]).expect("extract");
    assert_eq!(pages.len(), 3);
    assert!(pages[0].text.is_ok());
    assert!(matches!(pages[1].text, Err(IngestionError::UnreadablePage { page_number: 2, .. })));
    assert!(pages[2].text.is_ok());
}

#[test]
fn chunked_pages_stay_within_document_range() {
    let mut corpus = InMemoryCorpus::new();
    corpus.add("a", "a.pdf", "/docs/a.pdf", vec!["One.\n\nTwo.".to_string(), "Three.".to_string()]);
    let chunker = Chunker::default();
    let doc = &corpus.documents()[0];
    for page in corpus.extract(doc).unwrap() {
        let text = page.text.unwrap();
        for passage in chunker.chunk(&doc.id, page.page_number, &text) {
            assert!(doc.contains_page(passage.page_number));
        }
    }
}

#[test]
fn url_locator_uses_base_url_when_configured() {
    let mut corpus = InMemoryCorpus::new();
    corpus.add("gdpr", "GDPR Manual.pdf", "/srv/pdfs/GDPR Manual.pdf", vec![String::new()]);
    let doc = &corpus.documents()[0];

    let remote = FileUrlLocator::new(Some("https://docs.example.com/pdfs/".to_string()));
    assert_eq!(remote.locate(doc, 3), "https://docs.example.com/pdfs/GDPR%20Manual.pdf#page=3");

    let local = FileUrlLocator::default();
    let url = local.locate(doc, 7);
    assert!(url.starts_with("file:///"), "{url}");
    assert!(url.ends_with("#page=7"), "{url}");
}

#[test]
fn settings_file_overrides_defaults_and_is_validated() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("pagesearch.toml");
    fs::write(
        &path,
        "[search]\nhybrid_weight = 0.5\n\n[data]\nfallback = \"demo\"\nartifact_path = \"idx/index.json\"\n",
    )
    .unwrap();
    let mut settings = Settings::load_from(&path).expect("settings");
    assert_eq!(settings.search.hybrid_weight, 0.5);
    assert_eq!(settings.search.max_results_cap, 20, "untouched keys keep defaults");
    assert_eq!(settings.data.fallback, Fallback::Demo);

    settings.resolve_paths(tmp.path());
    assert_eq!(settings.artifact_path(), tmp.path().join("idx/index.json"));

    fs::write(&path, "[search]\nhybrid_weight = 1.5\n").unwrap();
    assert!(Settings::load_from(&path).is_err());
}
