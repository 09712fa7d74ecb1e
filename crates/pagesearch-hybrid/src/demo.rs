//! Built-in GDPR sample corpus served when no artifact is available and
//! `data.fallback = "demo"`.

use pagesearch_core::corpus::InMemoryCorpus;
use pagesearch_core::traits::Embedder;
use pagesearch_core::types::Document;
use pagesearch_core::{IndexBuildError, Settings};

use crate::artifact::IndexArtifact;
use crate::pipeline::ArtifactBuilder;

const DEMO_DOCUMENTS: &[(&str, &str, &str, u32, &str)] = &[
    (
        "gdpr-compliance-manual",
        "GDPR-Compliance-Manual.pdf",
        "https://example.com/gdpr-manual.pdf",
        1,
        "General Data Protection Regulation (GDPR) Compliance Manual. This document provides comprehensive guidance on GDPR compliance requirements, data protection principles, and individual rights under the regulation.",
    ),
    (
        "data-protection-rights",
        "Data-Protection-Rights.pdf",
        "https://example.com/data-rights.pdf",
        1,
        "Rights of Individuals under the General Data Protection Regulation. Data subjects have various rights including the right to access, rectify, erase, restrict processing, data portability, and object to processing of their personal data.",
    ),
    (
        "gdpr-principles",
        "GDPR-Principles.pdf",
        "https://example.com/gdpr-principles.pdf",
        2,
        "Key principles under GDPR include lawfulness, fairness and transparency, purpose limitation, data minimisation, accuracy, storage limitation, integrity and confidentiality, and accountability. Organizations must demonstrate compliance with these principles.",
    ),
    (
        "data-processing-agreement",
        "Data-Processing-Agreement.pdf",
        "https://example.com/dpa-template.pdf",
        3,
        "Data Processing Agreement template for GDPR compliance. This agreement establishes the relationship between data controllers and data processors, defining responsibilities, security measures, and breach notification procedures.",
    ),
    (
        "breach-notification-procedures",
        "Breach-Notification-Procedures.pdf",
        "https://example.com/breach-notification.pdf",
        1,
        "Personal data breach notification requirements under GDPR. Organizations must notify supervisory authorities within 72 hours of becoming aware of a breach, and inform data subjects when the breach poses high risks to their rights and freedoms.",
    ),
    (
        "individual-rights-gdpr",
        "Individual-Rights-GDPR.pdf",
        "https://example.com/individual-rights.pdf",
        1,
        "Individual rights under GDPR include the right of access, right to rectification, right to erasure (right to be forgotten), right to restrict processing, right to data portability, right to object, and rights related to automated decision making and profiling.",
    ),
];

/// The sample documents, each with its text on the listed page and blank
/// pages before it.
pub fn demo_corpus() -> InMemoryCorpus {
    let mut corpus = InMemoryCorpus::new();
    for &(id, name, locator, page, text) in DEMO_DOCUMENTS {
        let mut pages = vec![String::new(); page as usize - 1];
        pages.push(text.to_string());
        corpus.add(id, name, locator, pages);
    }
    corpus
}

fn demo_link(document: &Document, page_number: u32) -> String {
    format!("{}#page={}", document.locator, page_number)
}

pub fn demo_artifact(settings: &Settings, embedder: &dyn Embedder) -> Result<IndexArtifact, IndexBuildError> {
    let corpus = demo_corpus();
    let builder = ArtifactBuilder::new(settings, embedder, &demo_link);
    let (artifact, _) = builder.build(corpus.documents(), &corpus, Vec::new())?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesearch_embed::HashingEmbedder;

    #[test]
    fn demo_artifact_has_six_linked_passages() {
        let artifact = demo_artifact(&Settings::default(), &HashingEmbedder::new(64)).unwrap();
        assert_eq!(artifact.documents.len(), 6);
        assert_eq!(artifact.passages.len(), 6);
        let dpa = artifact.passage("data-processing-agreement:00003:0000").unwrap();
        assert_eq!(dpa.url, "https://example.com/dpa-template.pdf#page=3");
    }
}
