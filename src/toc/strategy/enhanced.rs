//! Column strategy with width-relative tolerances and the full heading vocabulary.

use super::{ColumnScan, DetectionContext, TocStrategy};

/// Follows the page-number columns of the TOC start page.
///
/// A page stays in the TOC while its bare numbers sit within 5 % of the page width
/// of an established column and it shows at least two heading → page-number
/// entries and five bare numbers. A failing page ends the run only when the next
/// page fails too; a next page carrying a back-matter heading is kept as the last
/// TOC page. Gives up 30 pages after the start.
pub struct EnhancedColumnStrategy;

impl TocStrategy for EnhancedColumnStrategy {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<usize> {
        let config = ctx.config;
        ColumnScan {
            rule: ctx.relative_rule(),
            tolerance: ctx.page_width() * config.column_tolerance_ratio,
            min_entries: config.min_entries_per_page,
            min_numbers: config.min_numbers_per_page,
            max_pages: config.enhanced_max_pages,
        }
        .run(ctx)
    }

    fn name(&self) -> &'static str {
        "EnhancedColumnStrategy"
    }
}
