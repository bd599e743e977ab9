//! End-to-end tests for the book analysis pipeline.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use common::{book, BookSpec, SyntheticBook};
use toc_oxide::{
    fingerprint_pages, AnalyzerConfig, BookAnalyzer, Error, JsonDirCache, MemoryCache, PageIndex,
    QuestionAnswer, StructureCache, TocStructure,
};

/// Structurer that hands back the known structure and counts its calls.
fn known_structurer(
    book: &SyntheticBook,
    calls: Arc<AtomicUsize>,
) -> impl Fn(&str) -> toc_oxide::Result<TocStructure> + Send + Sync {
    let structure = book.structure.clone();
    move |text: &str| {
        calls.fetch_add(1, Ordering::SeqCst);
        assert!(text.starts_with("--- Page 3 ---\nContents"));
        Ok(structure.clone())
    }
}

fn analyzer(book: &SyntheticBook, calls: Arc<AtomicUsize>) -> BookAnalyzer {
    BookAnalyzer::new(AnalyzerConfig::default(), Box::new(known_structurer(book, calls))).unwrap()
}

#[test]
fn test_analyze_book() {
    common::init_logging();
    let book = book(&BookSpec::default());
    let resolved = analyzer(&book, Arc::default()).analyze(&book.doc).unwrap();

    assert_eq!(resolved.toc_pages, book.toc_pages);
    assert_eq!(resolved.structure, book.structure);
    assert_eq!(resolved.offset, book.offset);
}

#[test]
fn test_analyze_then_extract() {
    let book = book(&BookSpec {
        chapters: 5,
        sections_per_chapter: 3,
        offset: 12,
        ..Default::default()
    });
    let analyzer = analyzer(&book, Arc::default());
    let resolved = analyzer.analyze(&book.doc).unwrap();
    let (sections, distribution) = analyzer.extract(&book.doc, &resolved, "4").unwrap();

    assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["4.1", "4.2", "4.3"]);
    assert_eq!(distribution.values().sum::<u32>(), 15);
}

#[test]
fn test_memory_cache_skips_second_analysis() {
    let book = book(&BookSpec::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer = analyzer(&book, Arc::clone(&calls)).with_cache(Box::new(MemoryCache::new()));

    let first = analyzer.analyze(&book.doc).unwrap();
    let second = analyzer.analyze(&book.doc).unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_json_dir_cache_persists() {
    let book = book(&BookSpec::default());
    let dir = tempfile::tempdir().unwrap();

    let resolved = analyzer(&book, Arc::default())
        .with_cache(Box::new(JsonDirCache::new(dir.path()).unwrap()))
        .analyze(&book.doc)
        .unwrap();

    let fingerprint = fingerprint_pages(&book.doc).unwrap();
    assert!(dir.path().join(format!("{}.json", fingerprint)).exists());

    // A fresh analyzer must not need its structurer
    let failing = |_: &str| -> toc_oxide::Result<TocStructure> {
        Err(Error::Collaborator("should not be called".into()))
    };
    let cached = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(failing))
        .unwrap()
        .with_cache(Box::new(JsonDirCache::new(dir.path()).unwrap()))
        .analyze(&book.doc)
        .unwrap();
    assert_eq!(cached, resolved);

    let store = JsonDirCache::new(dir.path()).unwrap();
    assert_eq!(store.get(&fingerprint).unwrap(), Some(resolved));
    assert!(store.get(&"0".repeat(64)).unwrap().is_none());
}

#[test]
fn test_no_toc() {
    let pages = (0..10)
        .map(|_| common::prose_page(&[&["just", "some", "words"]]))
        .collect();
    let doc = PageIndex::new(612.0, pages);
    let structurer = |_: &str| -> toc_oxide::Result<TocStructure> { Ok(TocStructure::default()) };
    let analyzer = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(structurer)).unwrap();

    assert!(matches!(analyzer.analyze(&doc), Err(Error::TocNotFound(_))));
}

#[test]
fn test_empty_structure_is_toc_not_found() {
    let book = book(&BookSpec::default());
    let structurer = |_: &str| -> toc_oxide::Result<TocStructure> { Ok(TocStructure::default()) };
    let analyzer = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(structurer)).unwrap();

    assert!(matches!(analyzer.analyze(&book.doc), Err(Error::TocNotFound(_))));
}

#[test]
fn test_structurer_failure_propagates() {
    let book = book(&BookSpec::default());
    let structurer = |_: &str| -> toc_oxide::Result<TocStructure> {
        Err(Error::Collaborator("model unavailable".into()))
    };
    let analyzer = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(structurer)).unwrap();

    assert!(matches!(analyzer.analyze(&book.doc), Err(Error::Collaborator(_))));
}

#[test]
fn test_unresolvable_offset_fails_loudly() {
    let book = book(&BookSpec::default());
    let mut structure = book.structure.clone();
    for entry in &mut structure.entries {
        entry.title = format!("{} Missing", entry.title);
    }
    let structurer = move |_: &str| -> toc_oxide::Result<TocStructure> { Ok(structure.clone()) };
    let analyzer = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(structurer)).unwrap();

    assert!(matches!(
        analyzer.analyze(&book.doc),
        Err(Error::PageOffsetUnresolved(_))
    ));
}

#[test]
fn test_chapter_questions() {
    let book = book(&BookSpec::default());
    let analyzer = analyzer(&book, Arc::default());
    let resolved = analyzer.analyze(&book.doc).unwrap();

    let generator = |text: &str, count: u32| -> toc_oxide::Result<Vec<QuestionAnswer>> {
        assert!(!text.is_empty());
        Ok((0..count)
            .map(|i| QuestionAnswer {
                question: format!("Question {}", i + 1),
                answer: "Answer".into(),
            })
            .collect())
    };
    let questions = analyzer
        .chapter_questions(&book.doc, &resolved, "3", &generator)
        .unwrap();

    assert_eq!(questions.keys().collect::<Vec<_>>(), vec!["3.1", "3.2"]);
    assert_eq!(questions.values().map(Vec::len).sum::<usize>(), 15);
}

#[test]
fn test_generator_failure_propagates() {
    let book = book(&BookSpec::default());
    let analyzer = analyzer(&book, Arc::default());
    let resolved = analyzer.analyze(&book.doc).unwrap();

    let generator = |_: &str, _: u32| -> toc_oxide::Result<Vec<QuestionAnswer>> {
        Err(Error::Collaborator("quota exceeded".into()))
    };
    assert!(matches!(
        analyzer.chapter_questions(&book.doc, &resolved, "1", &generator),
        Err(Error::Collaborator(_))
    ));
}

#[test]
fn test_config_from_json_drives_extraction() {
    let book = book(&BookSpec::default());
    let config = AnalyzerConfig::from_json_str(
        r#"{"extraction": {"max_tokens": 20, "total_questions": 4}}"#,
    )
    .unwrap();
    let structure = book.structure.clone();
    let structurer = move |_: &str| -> toc_oxide::Result<TocStructure> { Ok(structure.clone()) };
    let analyzer = BookAnalyzer::new(config, Box::new(structurer)).unwrap();

    let resolved = analyzer.analyze(&book.doc).unwrap();
    let (sections, distribution) = analyzer.extract(&book.doc, &resolved, "1").unwrap();
    assert!(sections.len() > 4);
    assert!(distribution.values().all(|&v| v == 0));
}

#[test]
fn test_configured_pacing_waits_between_batches() {
    let book = book(&BookSpec::default());
    // Memory use is always above a thousandth of a percent; give up at once
    let config = AnalyzerConfig::from_json_str(
        r#"{"pacing": {"enabled": true, "memory_threshold": 0.001, "check_interval_ms": 1, "max_wait_ms": 0}}"#,
    )
    .unwrap();
    let structure = book.structure.clone();
    let structurer = move |_: &str| -> toc_oxide::Result<TocStructure> { Ok(structure.clone()) };
    let analyzer = BookAnalyzer::new(config, Box::new(structurer)).unwrap();
    let resolved = analyzer.analyze(&book.doc).unwrap();

    // Two sections of two pages, one batch each, one load sample per batch
    let started = Instant::now();
    let (sections, _) = analyzer.extract(&book.doc, &resolved, "1").unwrap();
    assert_eq!(sections.len(), 2);
    assert!(started.elapsed() >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL * 2);
}

#[test]
fn test_document_dump_round_trip() {
    let book = book(&BookSpec::default());
    let json = serde_json::to_string(&book.doc).unwrap();
    let doc = PageIndex::from_json_str(&json).unwrap();
    assert_eq!(doc, book.doc);

    let resolved = analyzer(&book, Arc::default()).analyze(&doc).unwrap();
    assert_eq!(resolved.offset, book.offset);
}

#[test]
fn test_document_dump_words_only() {
    let json = r#"{
        "width": 612.0,
        "pages": [
            {"words": [
                {"text": "Origins", "x0": 72.0, "top": 80.0, "bottom": 92.0},
                {"text": "5", "x0": 300.0, "top": 40.0, "bottom": 52.0}
            ]}
        ]
    }"#;
    let doc = PageIndex::from_json_str(json).unwrap();
    assert_eq!(doc.pages()[0].text, "5\nOrigins");

    assert!(PageIndex::from_json_str(r#"{"width": 0.0, "pages": []}"#).is_err());
}
