//! TOC page location.
//!
//! The locator first checks that the document has a labelled TOC page with at
//! least one heading → page-number entry near its front, then runs the strategy
//! cascade and keeps the first proposal that survives validation.

use crate::config::LocatorConfig;
use crate::document::{PageCache, PageSource};
use crate::error::{Error, Result};
use crate::toc::patterns::TermMatcher;
use crate::toc::strategy::{default_strategies, DetectionContext, TocStrategy};

/// Finds the physical pages holding a book's table of contents.
pub struct TocLocator {
    config: LocatorConfig,
    terms: TermMatcher,
    strategies: Vec<Box<dyn TocStrategy>>,
}

impl std::fmt::Debug for TocLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TocLocator")
            .field("config", &self.config)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TocLocator {
    /// Create a locator with the default strategy cascade.
    pub fn new(config: LocatorConfig) -> Result<Self> {
        config.validate()?;
        let terms = TermMatcher::new(&config.terms)?;
        Ok(Self {
            config,
            terms,
            strategies: default_strategies(),
        })
    }

    /// Replace the strategy cascade. Strategies are tried in the given order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn TocStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Locator settings.
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Physical indices of the TOC pages, ascending. Empty when no TOC is found.
    pub fn locate(&self, source: &dyn PageSource) -> Vec<usize> {
        let pages = PageCache::new(source);
        let ctx = DetectionContext {
            pages: &pages,
            config: &self.config,
            terms: &self.terms,
        };

        let Some(probe) = self.probe(&ctx) else {
            log::info!("No TOC page within the first {} pages", ctx.start_window());
            return Vec::new();
        };
        log::debug!("TOC probe hit on page {}", probe);

        let mut fallback = Vec::new();
        for strategy in &self.strategies {
            let mut found = strategy.detect(&ctx);
            found.sort_unstable();
            found.dedup();

            if self.validate(&ctx, &found) {
                log::info!("{} located TOC pages {:?}", strategy.name(), found);
                return found;
            }
            log::debug!("{} proposal {:?} failed validation", strategy.name(), found);
            fallback = found;
        }

        log::info!("No TOC proposal validated, falling back to {:?}", fallback);
        fallback
    }

    /// First labelled page within the probe window carrying a qualifying entry.
    fn probe(&self, ctx: &DetectionContext<'_>) -> Option<usize> {
        let rule = ctx.relative_rule();
        ctx.find_start(|page| rule.has_entry(&page.words))
    }

    /// At least half of the proposed pages must show a qualifying entry.
    fn validate(&self, ctx: &DetectionContext<'_>, found: &[usize]) -> bool {
        if found.is_empty() {
            return false;
        }
        let rule = ctx.relative_rule();
        let valid = found
            .iter()
            .filter(|&&i| ctx.pages.get(i).is_some_and(|page| rule.has_entry(&page.words)))
            .count();
        valid * 2 >= found.len()
    }
}

/// Text of the TOC pages with a `--- Page {n} ---` marker (1-based) before each.
///
/// Pages without text are skipped.
pub fn toc_text(source: &dyn PageSource, pages: &[usize]) -> Result<String> {
    if pages.is_empty() {
        return Err(Error::TocNotFound("no TOC pages located".into()));
    }

    let mut parts = Vec::with_capacity(pages.len());
    for &index in pages {
        let text = source.page_text(index)?;
        let text = text.trim();
        if text.is_empty() {
            log::debug!("TOC page {} has no text", index);
            continue;
        }
        parts.push(format!("--- Page {} ---\n{}", index + 1, text));
    }

    if parts.is_empty() {
        return Err(Error::TocNotFound(format!("TOC pages {:?} carry no text", pages)));
    }
    Ok(parts.join("\n\n"))
}
