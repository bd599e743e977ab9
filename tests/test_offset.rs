//! Integration tests for page offset resolution.

mod common;

use common::{book, page_marker, BookSpec};
use proptest::prelude::*;
use toc_oxide::config::{ExtractionConfig, OffsetConfig};
use toc_oxide::{
    resolve_page_offset, Error, OffsetResolver, Page, PageIndex, SectionExtractor, TocEntry,
    TocStructure,
};

/// `count` blank pages with the given texts placed at their indices.
fn sparse_doc(count: usize, texts: &[(usize, &str)]) -> PageIndex {
    let mut pages = vec![Page::new("blank", Vec::new()); count];
    for (index, text) in texts {
        pages[*index] = Page::new(*text, Vec::new());
    }
    PageIndex::new(612.0, pages)
}

fn origins_spec() -> BookSpec {
    BookSpec {
        chapters: 4,
        sections_per_chapter: 3,
        pages_per_section: 1,
        first_page: 5,
        offset: 4,
        trailing_pages: 0,
    }
}

#[test]
fn test_origins_scenario() {
    common::init_logging();
    let book = book(&origins_spec());
    assert_eq!(book.toc_pages, vec![2, 3]);

    let offset = resolve_page_offset(&book.doc, &book.structure, 3).unwrap();
    assert_eq!(offset, 4);

    // Chapter 1 extraction starts on physical page 9
    let extractor = SectionExtractor::new(ExtractionConfig::default()).unwrap();
    let chapter = book.structure.chapter("1").unwrap();
    let ranges = extractor
        .section_ranges(&book.structure, chapter, offset, book.doc.len())
        .unwrap();
    assert_eq!(ranges[0].start, 9);

    let (sections, _) = extractor
        .extract(&book.doc, &book.structure, offset, "1", 75_000, 15)
        .unwrap();
    assert!(sections["1.1"].contains("Origins"));
    assert!(sections["1.1"].contains(&page_marker(5)));
}

#[test]
fn test_negative_offset() {
    // Printed numbering starts well past the physical index
    let doc = sparse_doc(20, &[(6, "15\nOrigins\nthe story")]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 15)]);
    assert_eq!(resolve_page_offset(&doc, &structure, 2).unwrap(), -9);
}

#[test]
fn test_footer_page_number() {
    let doc = sparse_doc(
        20,
        &[(11, "Origins\nline\nline\nline\nline\nline\nline\n3")],
    );
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 3)]);
    assert_eq!(resolve_page_offset(&doc, &structure, 4).unwrap(), 8);
}

#[test]
fn test_page_number_glued_to_letters() {
    let doc = sparse_doc(20, &[(9, "Origins\nthe story begins\np5")]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 5)]);
    assert_eq!(resolve_page_offset(&doc, &structure, 2).unwrap(), 4);
}

#[test]
fn test_number_outside_edge_lines_ignored() {
    let doc = sparse_doc(
        20,
        &[(11, "Origins\na\nb\nc\n3\nd\ne\nf")],
    );
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 3)]);
    assert!(matches!(
        resolve_page_offset(&doc, &structure, 4),
        Err(Error::PageOffsetUnresolved(_))
    ));
}

#[test]
fn test_title_words_across_lines() {
    let doc = sparse_doc(20, &[(10, "7\nThe Rise\nof Early\nCities and more")]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "The Rise of Early Cities", 7)]);
    assert_eq!(resolve_page_offset(&doc, &structure, 1).unwrap(), 3);
}

#[test]
fn test_number_without_title_rejected() {
    // A running footer matches the number but not the title
    let doc = sparse_doc(20, &[(8, "5\nSomething else"), (12, "5\nOrigins")]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 5)]);
    assert_eq!(resolve_page_offset(&doc, &structure, 1).unwrap(), 7);
}

#[test]
fn test_section_fallback() {
    let doc = sparse_doc(30, &[(14, "9\n1.1 Spark\nfire was found")]);
    let structure = TocStructure::new(vec![
        TocEntry::new(0, "1", "Origins", 7),
        TocEntry::new(1, "1.1", "Spark", 9),
        TocEntry::new(1, "2.1", "Roads", 9),
    ]);
    assert_eq!(resolve_page_offset(&doc, &structure, 1).unwrap(), 5);
}

#[test]
fn test_sections_of_other_chapters_ignored() {
    let doc = sparse_doc(30, &[(14, "9\n2.1 Roads")]);
    let structure = TocStructure::new(vec![
        TocEntry::new(0, "1", "Origins", 7),
        TocEntry::new(0, "2", "Empires", 8),
        TocEntry::new(1, "2.1", "Roads", 9),
    ]);
    assert!(resolve_page_offset(&doc, &structure, 1).is_err());
}

#[test]
fn test_search_window_bounds() {
    let doc = sparse_doc(40, &[(30, "5\nOrigins")]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 5)]);

    let narrow = OffsetResolver::new(OffsetConfig::default().with_search_window(10)).unwrap();
    assert!(matches!(
        narrow.resolve(&doc, &structure, 2),
        Err(Error::PageOffsetUnresolved(_))
    ));
    assert_eq!(resolve_page_offset(&doc, &structure, 2).unwrap(), 25);
}

#[test]
fn test_window_capped_at_document_end() {
    let doc = sparse_doc(5, &[]);
    let structure = TocStructure::new(vec![TocEntry::new(0, "1", "Origins", 5)]);
    assert!(resolve_page_offset(&doc, &structure, 4).is_err());
    assert!(resolve_page_offset(&doc, &structure, 10).is_err());
}

#[test]
fn test_structure_without_chapters() {
    let doc = sparse_doc(10, &[(5, "3\nSpark")]);
    let structure = TocStructure::new(vec![TocEntry::new(1, "1.1", "Spark", 3)]);
    assert!(matches!(
        resolve_page_offset(&doc, &structure, 0),
        Err(Error::PageOffsetUnresolved(_))
    ));
}

#[test]
fn test_zero_window_rejected() {
    assert!(OffsetResolver::new(OffsetConfig::default().with_search_window(0)).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_recovers_injected_offset(
        chapters in 1usize..6,
        sections in 0usize..4,
        first_page in 1u32..20,
        extra in 0usize..28,
    ) {
        let mut spec = BookSpec {
            chapters,
            sections_per_chapter: sections,
            pages_per_section: 2,
            first_page,
            ..Default::default()
        };
        spec.offset = 1 + common::toc_page_count(&spec) + extra;
        let book = book(&spec);

        let offset = resolve_page_offset(&book.doc, &book.structure, book.last_toc_page()).unwrap();
        prop_assert_eq!(offset, book.offset);
    }

    #[test]
    fn prop_chapter_match_beats_section_match(
        chapter_at in 8usize..40,
        section_at in 2usize..40,
    ) {
        prop_assume!(chapter_at != section_at);
        let doc = sparse_doc(
            45,
            &[(chapter_at, "7\nOrigins\nthe story"), (section_at, "9\n1.1 Spark\nfire")],
        );
        let structure = TocStructure::new(vec![
            TocEntry::new(0, "1", "Origins", 7),
            TocEntry::new(1, "1.1", "Spark", 9),
        ]);

        let offset = resolve_page_offset(&doc, &structure, 1).unwrap();
        prop_assert_eq!(offset, chapter_at as i64 - 7);
    }
}
