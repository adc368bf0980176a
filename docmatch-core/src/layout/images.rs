use super::placement::{assess_placement_within, page_context};
use crate::config::ReconcileConfig;
use crate::types::{BoundingBox, Entity, Fragment, PageLayout};

/// Gap between a figure and the closest text fragment ending above it, if any.
pub fn gap_above(bbox: &BoundingBox, page_fragments: &[Fragment]) -> Option<f32> {
    page_fragments
        .iter()
        .filter(|f| f.bbox.is_valid() && !f.text.trim().is_empty())
        .filter(|f| f.bbox.y1 <= bbox.y0)
        .map(|f| bbox.y0 - f.bbox.y1)
        .min_by(|a, b| a.total_cmp(b))
}

/// Figure entities on rendered pages with their placement checks.
pub struct ImageDetector<'a> {
    config: &'a ReconcileConfig,
}

impl<'a> ImageDetector<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, pages: &[PageLayout]) -> Vec<Entity> {
        let images = &self.config.images;
        if !images.enabled {
            return Vec::new();
        }
        let placement = &self.config.placement;
        let mut entities = Vec::new();

        for page in pages {
            let mut boxes: Vec<&BoundingBox> = Vec::with_capacity(page.images.len());
            for bbox in &page.images {
                if !bbox.is_valid() {
                    log::warn!("Skipping image with malformed bbox on page {}", page.page);
                    continue;
                }
                if bbox.width() < images.min_width && bbox.height() < images.min_height {
                    log::debug!(
                        "Skipping small image on page {}: {:.1}x{:.1}",
                        page.page,
                        bbox.width(),
                        bbox.height()
                    );
                    continue;
                }
                boxes.push(bbox);
            }
            boxes.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

            for bbox in boxes {
                let mut entity = Entity::layout_image(*bbox, page.page);
                let assessed =
                    assess_placement_within(bbox, page.width, placement, images.center_tolerance);
                entity.centered = assessed.centered;
                entity.margins_ok = assessed.margins_ok;
                entity.blank_line_before = gap_above(bbox, &page.fragments)
                    .map_or(true, |gap| gap >= images.min_blank_line_distance);

                let (before, after) = page_context(bbox, &page.fragments, placement.context_chars);
                entity.context_before = before;
                entity.context_after = after;

                log::debug!(
                    "Image on page {}: centered={}, margins_ok={}, blank_line_before={}",
                    page.page,
                    entity.centered,
                    entity.margins_ok,
                    entity.blank_line_before
                );
                entities.push(entity);
            }
        }

        log::info!("Found {} images on {} pages", entities.len(), pages.len());
        entities
    }
}
