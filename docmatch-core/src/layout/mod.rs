pub mod images;
pub mod math_fonts;
pub mod placement;
pub mod spatial_clustering;

pub use images::{gap_above, ImageDetector};
pub use math_fonts::{is_math_font, normalize_font_name, select_math_fragments};
pub use placement::{
    assess_placement, assess_placement_within, find_numbering, page_context, Placement,
};
pub use spatial_clustering::{cluster, SpatialClusterer};

use crate::config::ReconcileConfig;
use crate::types::{Entity, PageLayout};

/// Finds formula entities on rendered pages: math-font fragments are clustered, then each
/// cluster is checked for placement, numbering and surrounding text.
pub struct FormulaDetector<'a> {
    config: &'a ReconcileConfig,
}

impl<'a> FormulaDetector<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, pages: &[PageLayout]) -> Vec<Entity> {
        let clusterer = SpatialClusterer::new(&self.config.clustering);
        let placement = &self.config.placement;
        let mut entities = Vec::new();

        for page in pages {
            let math_fragments = select_math_fragments(&page.fragments, &self.config.math_fonts);
            if math_fragments.is_empty() {
                log::debug!("Page {}: no math-font fragments", page.page);
                continue;
            }

            // clustering works on the page the layout says, not the fragment's own label
            let math_fragments: Vec<_> = math_fragments
                .into_iter()
                .map(|mut f| {
                    f.page = page.page;
                    f
                })
                .collect();

            let found = clusterer.cluster(&math_fragments);
            log::info!(
                "Page {}: {} math fragments grouped into {} formulas",
                page.page,
                math_fragments.len(),
                found.len()
            );

            for mut entity in found {
                let Some(bbox) = entity.bbox else {
                    continue;
                };
                let assessed = assess_placement(&bbox, page.width, placement);
                entity.centered = assessed.centered;
                entity.margins_ok = assessed.margins_ok;
                entity.numbering = find_numbering(&entity.text, &bbox, &page.fragments, placement);

                let (before, after) = page_context(&bbox, &page.fragments, placement.context_chars);
                entity.context_before = before;
                entity.context_after = after;

                log::debug!(
                    "Formula '{}' on page {}: centered={}, margins_ok={}, numbering={:?}",
                    entity.text,
                    page.page,
                    entity.centered,
                    entity.margins_ok,
                    entity.numbering
                );
                entities.push(entity);
            }
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Fragment};

    fn page_with(fragments: Vec<Fragment>) -> PageLayout {
        PageLayout {
            page: 3,
            width: 595.28,
            height: 841.89,
            fragments,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_detects_centered_numbered_formula() {
        let config = ReconcileConfig::default();
        let line = |x0: f32, x1: f32| BoundingBox::new(x0, 300.0, x1, 312.0);
        let page = page_with(vec![
            Fragment::new("Закон Ома:", BoundingBox::new(85.0, 270.0, 200.0, 282.0), "Times", 3),
            Fragment::new("I", line(290.0, 296.0), "CambriaMath", 3),
            Fragment::new("=", line(300.0, 308.0), "CambriaMath", 3),
            Fragment::new("U/R", line(312.0, 332.0), "CambriaMath", 3),
            Fragment::new("(1)", line(400.0, 415.0), "Times", 3),
            Fragment::new("где I - ток", BoundingBox::new(85.0, 330.0, 200.0, 342.0), "Times", 3),
        ]);

        let entities = FormulaDetector::new(&config).detect(&[page]);
        assert_eq!(entities.len(), 1);
        let formula = &entities[0];
        assert_eq!(formula.text, "I=U/R");
        assert_eq!(formula.page, Some(3));
        assert!(formula.centered);
        assert!(formula.margins_ok);
        assert_eq!(formula.numbering.as_deref(), Some("(1)"));
        assert_eq!(formula.context_before, "Закон Ома:");
        assert_eq!(formula.context_after, "где I - ток");
    }

    #[test]
    fn test_page_without_math_fonts_yields_nothing() {
        let config = ReconcileConfig::default();
        let page = page_with(vec![Fragment::new(
            "x = 1",
            BoundingBox::new(85.0, 100.0, 150.0, 112.0),
            "Times New Roman",
            3,
        )]);
        assert!(FormulaDetector::new(&config).detect(&[page]).is_empty());
    }
}
