#![allow(dead_code)]
//! Synthetic books for integration tests.
//!
//! A book is laid out as: cover, preface, the TOC (labelled "Contents", one entry
//! per line, printed page numbers in a right-hand column), blank filler pages,
//! then the body. Body page `p` (printed) sits at physical index `p + offset` and
//! carries its printed number on the first line. Body prose contains no digits, so
//! the only numbers on a body page are its header and its heading numbers.

use toc_oxide::{Page, PageIndex, TocEntry, TocStructure, Word};

pub const PAGE_WIDTH: f32 = 612.0;
pub const MAX_TOC_LINES: usize = 12;

const CHAPTER_TITLES: &[&str] = &[
    "Origins",
    "Empires",
    "Revolutions",
    "Machines",
    "Networks",
    "Frontiers",
    "Oceans",
    "Deserts",
];

const SECTION_TITLES: &[&str] = &["Beginnings", "Growth", "Decline", "Legacy", "Echoes", "Remnants"];

const PROSE: &[&str] = &[
    "the", "river", "carried", "old", "stories", "across", "wide", "plains", "while", "people",
    "built", "towns", "along", "its", "banks", "and", "traded", "grain",
];

/// Shape of a synthetic book.
#[derive(Debug, Clone)]
pub struct BookSpec {
    pub chapters: usize,
    pub sections_per_chapter: usize,
    pub pages_per_section: usize,
    /// Printed page of chapter 1
    pub first_page: u32,
    /// Physical index minus printed page
    pub offset: usize,
    /// Pages after the last body page
    pub trailing_pages: usize,
}

impl Default for BookSpec {
    fn default() -> Self {
        Self {
            chapters: 3,
            sections_per_chapter: 2,
            pages_per_section: 2,
            first_page: 1,
            offset: 8,
            trailing_pages: 0,
        }
    }
}

/// A generated book with the facts tests check against.
#[derive(Debug, Clone)]
pub struct SyntheticBook {
    pub doc: PageIndex,
    pub structure: TocStructure,
    pub toc_pages: Vec<usize>,
    pub offset: i64,
}

impl SyntheticBook {
    pub fn last_toc_page(&self) -> usize {
        *self.toc_pages.last().unwrap()
    }
}

/// Number of pages the TOC of `spec` occupies.
pub fn toc_page_count(spec: &BookSpec) -> usize {
    let lines = spec.chapters * (1 + spec.sections_per_chapter);
    lines.div_ceil(MAX_TOC_LINES).max(1)
}

/// Letters-only marker identifying printed page `page` ("pgbc" for 12).
pub fn page_marker(page: u32) -> String {
    let letters: String = page
        .to_string()
        .chars()
        .map(|d| (b'a' + d.to_digit(10).unwrap() as u8) as char)
        .collect();
    format!("pg{}", letters)
}

pub fn chapter_title(chapter: usize) -> &'static str {
    CHAPTER_TITLES[(chapter - 1) % CHAPTER_TITLES.len()]
}

pub fn section_title(section: usize) -> &'static str {
    SECTION_TITLES[(section - 1) % SECTION_TITLES.len()]
}

/// Build the structure described by `spec`.
pub fn structure(spec: &BookSpec) -> TocStructure {
    let pages_per_chapter = (spec.sections_per_chapter.max(1) * spec.pages_per_section) as u32;
    let mut entries = Vec::new();
    for c in 1..=spec.chapters {
        let chapter_page = spec.first_page + (c as u32 - 1) * pages_per_chapter;
        entries.push(TocEntry::new(0, c.to_string(), chapter_title(c), chapter_page));
        for s in 1..=spec.sections_per_chapter {
            let page = chapter_page + ((s - 1) * spec.pages_per_section) as u32;
            entries.push(TocEntry::new(1, format!("{}.{}", c, s), section_title(s), page));
        }
    }
    TocStructure::new(entries)
}

/// Generate the book described by `spec`.
pub fn book(spec: &BookSpec) -> SyntheticBook {
    let structure = structure(spec);
    let toc_count = toc_page_count(spec);
    let toc_pages: Vec<usize> = (2..2 + toc_count).collect();
    let body_start = spec.first_page as usize + spec.offset;
    assert!(
        body_start > 1 + toc_count,
        "offset too small: body would overlap the TOC"
    );

    let mut pages = vec![
        prose_page(&[&["A", "Short", "History", "of", "Everything"]]),
        prose_page(&[&["Preface"], PROSE]),
    ];

    // TOC lines, spread evenly over the TOC pages
    let lines: Vec<&TocEntry> = structure.entries.iter().collect();
    let per_page = lines.len().div_ceil(toc_count).max(1);
    for (i, chunk) in lines.chunks(per_page).enumerate() {
        pages.push(toc_page(i == 0, chunk));
    }
    while pages.len() < 2 + toc_count {
        pages.push(toc_page(false, &[]));
    }

    while pages.len() < body_start {
        pages.push(prose_page(&[&["This", "page", "intentionally", "left", "blank"]]));
    }

    let pages_per_chapter = (spec.sections_per_chapter.max(1) * spec.pages_per_section) as u32;
    let body_pages = spec.chapters as u32 * pages_per_chapter;
    for p in spec.first_page..spec.first_page + body_pages {
        pages.push(body_page(p, &structure));
    }

    for _ in 0..spec.trailing_pages {
        pages.push(prose_page(&[&["Afterword"], PROSE]));
    }

    SyntheticBook {
        doc: PageIndex::new(PAGE_WIDTH, pages),
        structure,
        toc_pages,
        offset: spec.offset as i64,
    }
}

fn line_words(words: &mut Vec<Word>, tokens: &[&str], x0: f32, line: usize) {
    let top = 60.0 + line as f32 * 18.0;
    for (i, token) in tokens.iter().enumerate() {
        words.push(Word::new(*token, x0 + i as f32 * 60.0, top, top + 12.0));
    }
}

/// A TOC page; entries are laid out as "Chapter N Title ... page" and
/// "N.M Title ... page".
pub fn toc_page(label: bool, entries: &[&TocEntry]) -> Page {
    let mut words = Vec::new();
    let mut line = 0;
    if label {
        line_words(&mut words, &["Contents"], 72.0, line);
        line += 1;
    }
    for entry in entries {
        let top = 60.0 + line as f32 * 18.0;
        if entry.level == 0 {
            words.push(Word::new("Chapter", 72.0, top, top + 12.0));
            words.push(Word::new(entry.number.clone(), 130.0, top, top + 12.0));
            words.push(Word::new(entry.title.clone(), 160.0, top, top + 12.0));
        } else {
            words.push(Word::new(entry.number.clone(), 90.0, top, top + 12.0));
            words.push(Word::new(entry.title.clone(), 140.0, top, top + 12.0));
        }
        words.push(Word::new(entry.page.to_string(), 520.0, top, top + 12.0));
        line += 1;
    }
    Page::from_words(words)
}

/// A page of digit-free prose, one slice per line.
pub fn prose_page(lines: &[&[&str]]) -> Page {
    let mut words = Vec::new();
    for (i, tokens) in lines.iter().enumerate() {
        line_words(&mut words, tokens, 72.0, i);
    }
    Page::from_words(words)
}

fn body_page(page: u32, structure: &TocStructure) -> Page {
    let mut words = Vec::new();
    let mut line = 0;
    let number = page.to_string();
    line_words(&mut words, &[number.as_str()], 300.0, line);
    line += 1;

    for entry in structure.entries.iter().filter(|e| e.page == page) {
        if entry.level == 0 {
            line_words(&mut words, &["Chapter", entry.number.as_str()], 72.0, line);
            line += 1;
            line_words(&mut words, &[entry.title.as_str()], 72.0, line);
        } else {
            line_words(&mut words, &[entry.number.as_str(), entry.title.as_str()], 72.0, line);
        }
        line += 1;
    }

    let marker = page_marker(page);
    for chunk in PROSE.chunks(6) {
        line_words(&mut words, chunk, 72.0, line);
        line += 1;
    }
    line_words(&mut words, &[marker.as_str(), "ends", "here"], 72.0, line);
    Page::from_words(words)
}

/// Initialise test logging once.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
