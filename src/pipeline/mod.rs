//! Book analysis pipeline.
//!
//! ```text
//! Pages
//!     ↓
//! [TocLocator] (strategy cascade → TOC page indices)
//!     ↓
//! toc_text (page-marked raw TOC text)
//!     ↓
//! [TocStructurer] (external → TocStructure)
//!     ↓
//! [OffsetResolver] (printed page → physical page)
//!     ↓
//! ResolvedStructure (cached by content fingerprint)
//!     ↓
//! [SectionExtractor] (chapter → budgeted sections + question allotment)
//!     ↓
//! [QuestionGenerator] (external, once per section)
//! ```
//!
//! The structuring and question-generation steps are collaborators supplied by
//! the caller. Their failures propagate unchanged; nothing is retried here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::{fingerprint_pages, ResolvedStructure, StructureCache};
use crate::config::{AnalyzerConfig, ExtractionConfig, LocatorConfig, OffsetConfig};
use crate::document::PageSource;
use crate::error::{Error, Result};
use crate::extract::{ExtractedSections, QuestionDistribution, SectionExtractor, TokenCounter};
use crate::offset::{OffsetResolver, PageOffset};
use crate::pacing::{Pacer, SystemLoadPacer};
use crate::toc::{toc_text, TocLocator, TocStructure};

/// Turns raw TOC text into structured entries.
pub trait TocStructurer: Send + Sync {
    /// Structure the text produced by [`toc_text`].
    fn structure(&self, toc_text: &str) -> Result<TocStructure>;
}

impl<F> TocStructurer for F
where
    F: Fn(&str) -> Result<TocStructure> + Send + Sync,
{
    fn structure(&self, toc_text: &str) -> Result<TocStructure> {
        self(toc_text)
    }
}

/// One generated question with its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Question text
    pub question: String,
    /// Expected answer
    pub answer: String,
}

/// Writes questions about a section of text.
pub trait QuestionGenerator: Send + Sync {
    /// Generate up to `count` questions about `section_text`.
    fn generate(&self, section_text: &str, count: u32) -> Result<Vec<QuestionAnswer>>;
}

impl<F> QuestionGenerator for F
where
    F: Fn(&str, u32) -> Result<Vec<QuestionAnswer>> + Send + Sync,
{
    fn generate(&self, section_text: &str, count: u32) -> Result<Vec<QuestionAnswer>> {
        self(section_text, count)
    }
}

/// Section number → generated questions, in section order.
pub type ChapterQuestions = IndexMap<String, Vec<QuestionAnswer>>;

/// Analyses books: structure once per document, then chapters on demand.
pub struct BookAnalyzer {
    config: AnalyzerConfig,
    locator: TocLocator,
    resolver: OffsetResolver,
    extractor: SectionExtractor,
    structurer: Box<dyn TocStructurer>,
    cache: Option<Box<dyn StructureCache>>,
}

impl std::fmt::Debug for BookAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookAnalyzer")
            .field("config", &self.config)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl BookAnalyzer {
    /// Create an analyzer that structures TOC text with `structurer`.
    ///
    /// With `config.pacing.enabled`, chapter extraction waits on a
    /// [`SystemLoadPacer`] between page batches.
    pub fn new(config: AnalyzerConfig, structurer: Box<dyn TocStructurer>) -> Result<Self> {
        config.validate()?;
        let mut extractor = SectionExtractor::new(config.extraction.clone())?;
        if config.pacing.enabled {
            extractor = extractor.with_pacer(Box::new(SystemLoadPacer::new(config.pacing.clone())?));
        }
        Ok(Self {
            locator: TocLocator::new(config.locator.clone())?,
            resolver: OffsetResolver::new(config.offset.clone())?,
            extractor,
            config,
            structurer,
            cache: None,
        })
    }

    /// Memoize resolved structures in `cache`.
    pub fn with_cache(mut self, cache: Box<dyn StructureCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Pace chapter extraction with `pacer`.
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.extractor = self.extractor.with_pacer(pacer);
        self
    }

    /// Count section tokens with `counter`.
    pub fn with_token_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.extractor = self.extractor.with_token_counter(counter);
        self
    }

    /// Analyzer settings.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Locate and structure the TOC and resolve the page offset.
    ///
    /// With a cache configured, a document whose fingerprint is already known is
    /// not analysed again.
    pub fn analyze(&self, source: &dyn PageSource) -> Result<ResolvedStructure> {
        let fingerprint = match &self.cache {
            Some(cache) => {
                let fingerprint = fingerprint_pages(source)?;
                if let Some(resolved) = cache.get(&fingerprint)? {
                    log::info!("Using cached structure for {}", fingerprint);
                    return Ok(resolved);
                }
                Some(fingerprint)
            },
            None => None,
        };

        let toc_pages = self.locator.locate(source);
        let Some(&last_toc_page) = toc_pages.last() else {
            return Err(Error::TocNotFound("no TOC pages located".into()));
        };

        let text = toc_text(source, &toc_pages)?;
        let structure = self.structurer.structure(&text)?;
        if structure.is_empty() {
            return Err(Error::TocNotFound("structured TOC has no entries".into()));
        }
        log::debug!("Structured TOC has {} entries", structure.entries.len());

        let offset = self.resolver.resolve(source, &structure, last_toc_page)?;
        let resolved = ResolvedStructure {
            toc_pages,
            structure,
            offset,
        };

        if let (Some(cache), Some(fingerprint)) = (&self.cache, fingerprint) {
            cache.put(&fingerprint, &resolved)?;
        }
        Ok(resolved)
    }

    /// Extract `chapter` with the configured token budget and question total.
    pub fn extract(
        &self,
        source: &dyn PageSource,
        resolved: &ResolvedStructure,
        chapter: &str,
    ) -> Result<(ExtractedSections, QuestionDistribution)> {
        let extraction = &self.config.extraction;
        self.extractor.extract(
            source,
            &resolved.structure,
            resolved.offset,
            chapter,
            extraction.max_tokens,
            extraction.total_questions,
        )
    }

    /// Extract `chapter` and ask `generator` for each section's allotted questions.
    ///
    /// Sections allotted no questions are not sent to the generator.
    pub fn chapter_questions(
        &self,
        source: &dyn PageSource,
        resolved: &ResolvedStructure,
        chapter: &str,
        generator: &dyn QuestionGenerator,
    ) -> Result<ChapterQuestions> {
        let (sections, distribution) = self.extract(source, resolved, chapter)?;

        let mut questions = ChapterQuestions::new();
        for (key, text) in &sections {
            let count = distribution.get(key).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            let generated = generator.generate(text, count)?;
            log::debug!("Section {}: {} of {} questions", key, generated.len(), count);
            questions.insert(key.clone(), generated);
        }
        Ok(questions)
    }
}

/// Locate the TOC pages of `source` with default settings.
pub fn locate_toc_pages(source: &dyn PageSource) -> Result<Vec<usize>> {
    Ok(TocLocator::new(LocatorConfig::default())?.locate(source))
}

/// Resolve the page offset of `source` with default settings.
pub fn resolve_page_offset(
    source: &dyn PageSource,
    structure: &TocStructure,
    last_toc_page: usize,
) -> Result<PageOffset> {
    OffsetResolver::new(OffsetConfig::default())?.resolve(source, structure, last_toc_page)
}

/// Extract a chapter with default settings.
pub fn extract_chapter(
    source: &dyn PageSource,
    structure: &TocStructure,
    offset: PageOffset,
    chapter: &str,
    max_tokens: usize,
    total_questions: u32,
) -> Result<(ExtractedSections, QuestionDistribution)> {
    SectionExtractor::new(ExtractionConfig::default())?.extract(
        source,
        structure,
        offset,
        chapter,
        max_tokens,
        total_questions,
    )
}
