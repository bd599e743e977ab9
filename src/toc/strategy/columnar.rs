//! Column strategy with fixed point tolerances.

use super::{ColumnScan, DetectionContext, TocStrategy};
use crate::toc::patterns::{EntryRule, PatternSet};

/// Lower-precision sibling of [`EnhancedColumnStrategy`](super::EnhancedColumnStrategy).
///
/// Only "Chapter" and "N." headings count, the heading → number gap is a fixed
/// 100 points, columns are matched within 20 points and there is no minimum count
/// of bare numbers per page. Gives up 40 pages after the start.
pub struct ColumnarStrategy;

impl TocStrategy for ColumnarStrategy {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<usize> {
        let config = ctx.config;
        ColumnScan {
            rule: EntryRule {
                patterns: PatternSet::Basic,
                min_gap: config.columnar_min_gap,
                lookahead: config.entry_lookahead,
            },
            tolerance: config.columnar_tolerance,
            min_entries: config.min_entries_per_page,
            min_numbers: 0,
            max_pages: config.columnar_max_pages,
        }
        .run(ctx)
    }

    fn name(&self) -> &'static str {
        "ColumnarStrategy"
    }
}
