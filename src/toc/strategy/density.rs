//! Numeric density strategy.

use super::{DetectionContext, TocStrategy};
use crate::document::PageView;
use crate::utils::safe_float_cmp;

/// Treats pages as TOC while a large share of their tokens carry digits.
///
/// The TOC opens on a labelled page whose numeric density exceeds 8 %. It closes
/// when density collapses (below half the previous page and under 10 %) and the
/// following page stays under 10 %, or when line spacing turns uniform while
/// density is low, which is what running prose looks like.
pub struct NumericDensityStrategy;

impl TocStrategy for NumericDensityStrategy {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<usize> {
        let config = ctx.config;
        let pages = ctx.pages;
        let Some(start) = ctx.find_start(|page| page.numeric_density() > config.density_start) else {
            return Vec::new();
        };

        let mut toc = vec![start];
        let mut previous = pages.get(start).map_or(0.0, PageView::numeric_density);
        let end = (start + config.density_max_pages).min(pages.len());
        for i in start + 1..end {
            let Some(page) = pages.get(i) else { break };
            if page.words.is_empty() {
                continue;
            }
            let density = page.numeric_density();

            if density < previous * config.density_drop_ratio && density < config.density_floor {
                let next = pages.get(i + 1).map_or(0.0, PageView::numeric_density);
                if next < config.density_floor {
                    log::debug!("Numeric density collapsed at page {} ({:.3})", i, density);
                    break;
                }
            }

            if spacing_variance(page) < config.spacing_variance_limit
                && density < config.spacing_density_limit
            {
                log::debug!("Uniform line spacing at page {}, reading as prose", i);
                break;
            }

            toc.push(i);
            previous = density;
        }
        toc
    }

    fn name(&self) -> &'static str {
        "NumericDensityStrategy"
    }
}

/// Population variance of the vertical gaps between consecutive words (by top edge).
///
/// Pages with fewer than two words report infinite variance.
fn spacing_variance(page: &PageView) -> f32 {
    if page.words.len() < 2 {
        return f32::INFINITY;
    }
    let mut words: Vec<_> = page.words.iter().collect();
    words.sort_by(|a, b| safe_float_cmp(a.top, b.top));

    let gaps: Vec<f32> = words.windows(2).map(|w| w[1].top - w[0].bottom).collect();
    let mean = gaps.iter().sum::<f32>() / gaps.len() as f32;
    gaps.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / gaps.len() as f32
}
