use crate::config::PlacementConfig;
use crate::text::{first_chars, last_chars};
use crate::types::{BoundingBox, Fragment};
use regex::Regex;
use std::sync::LazyLock;

static NUMBERING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[(\[]\s*\d+(?:\.\d+)?\s*[)\]]$").expect("static regex"));

static TRAILING_NUMBERING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([(\[]\s*\d+(?:\.\d+)?\s*[)\]])\s*$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub centered: bool,
    pub margins_ok: bool,
}

/// Position of a block against the content area of a page of the given width.
pub fn assess_placement(bbox: &BoundingBox, page_width: f32, config: &PlacementConfig) -> Placement {
    let center_tolerance = config.tolerance * config.center_tolerance_factor;
    assess_placement_within(bbox, page_width, config, center_tolerance)
}

/// Same as `assess_placement` with an explicit centre tolerance in points.
pub fn assess_placement_within(
    bbox: &BoundingBox,
    page_width: f32,
    config: &PlacementConfig,
    center_tolerance: f32,
) -> Placement {
    let content_right = page_width - config.right_margin;
    let content_center = (config.left_margin + content_right) / 2.0;

    Placement {
        centered: (bbox.center_x() - content_center).abs() <= center_tolerance,
        margins_ok: bbox.x0 >= config.left_margin - config.tolerance
            && bbox.x1 <= content_right + config.tolerance,
    }
}

/// Equation number such as "(3)" or "[1.2]" printed to the right of a formula, either as a
/// separate fragment inside the formula's line band or glued to the end of its own text.
pub fn find_numbering(
    text: &str,
    bbox: &BoundingBox,
    page_fragments: &[Fragment],
    config: &PlacementConfig,
) -> Option<String> {
    if let Some(caps) = TRAILING_NUMBERING_REGEX.captures(text) {
        return Some(caps[1].to_string());
    }

    let band_top = bbox.y0 - config.numbering_vertical_slack;
    let band_bottom = bbox.y1 + config.numbering_vertical_slack;
    let search_right = bbox.x1 + config.numbering_search_width;

    let mut candidates: Vec<&Fragment> = page_fragments
        .iter()
        .filter(|f| f.bbox.is_valid())
        .filter(|f| f.bbox.x1 > bbox.x1 && f.bbox.x0 < search_right)
        .filter(|f| f.bbox.y1 >= band_top && f.bbox.y0 <= band_bottom)
        .collect();
    candidates.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    candidates
        .into_iter()
        .map(|f| f.text.trim())
        .find(|t| NUMBERING_REGEX.is_match(t))
        .map(str::to_string)
}

fn center_y(bbox: &BoundingBox) -> f32 {
    (bbox.y0 + bbox.y1) / 2.0
}

fn reading_order_text<'f>(fragments: impl Iterator<Item = &'f Fragment>) -> String {
    let mut fragments: Vec<&Fragment> = fragments.collect();
    fragments.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    fragments
        .iter()
        .map(|f| f.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text above the block (last `context_chars`) and below it (first `context_chars`).
pub fn page_context(
    bbox: &BoundingBox,
    page_fragments: &[Fragment],
    context_chars: usize,
) -> (String, String) {
    let valid = || page_fragments.iter().filter(|f| f.bbox.is_valid());
    let above = reading_order_text(valid().filter(|f| center_y(&f.bbox) < bbox.y0));
    let below = reading_order_text(valid().filter(|f| center_y(&f.bbox) > bbox.y1));
    (
        last_chars(&above, context_chars).trim().to_string(),
        first_chars(&below, context_chars).trim().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4_WIDTH: f32 = 595.28;

    fn content_center(config: &PlacementConfig) -> f32 {
        (config.left_margin + A4_WIDTH - config.right_margin) / 2.0
    }

    #[test]
    fn test_centered_block_within_margins() {
        let config = PlacementConfig::default();
        let c = content_center(&config);
        let bbox = BoundingBox::new(c - 40.0, 100.0, c + 40.0, 112.0);
        let placement = assess_placement(&bbox, A4_WIDTH, &config);
        assert!(placement.centered);
        assert!(placement.margins_ok);
    }

    #[test]
    fn test_left_aligned_block_not_centered() {
        let config = PlacementConfig::default();
        let bbox = BoundingBox::new(90.0, 100.0, 150.0, 112.0);
        let placement = assess_placement(&bbox, A4_WIDTH, &config);
        assert!(!placement.centered);
        assert!(placement.margins_ok);
    }

    #[test]
    fn test_block_in_left_margin() {
        let config = PlacementConfig::default();
        let bbox = BoundingBox::new(40.0, 100.0, 150.0, 112.0);
        assert!(!assess_placement(&bbox, A4_WIDTH, &config).margins_ok);
    }

    #[test]
    fn test_numbering_found_to_the_right() {
        let config = PlacementConfig::default();
        let bbox = BoundingBox::new(250.0, 100.0, 330.0, 112.0);
        let fragments = vec![
            Fragment::new("E=mc^2", bbox, "Cambria Math", 1),
            Fragment::new("text", BoundingBox::new(340.0, 200.0, 380.0, 212.0), "Times", 1),
            Fragment::new("(1.2)", BoundingBox::new(400.0, 101.0, 420.0, 111.0), "Times", 1),
        ];
        assert_eq!(
            find_numbering("E=mc^2", &bbox, &fragments, &config),
            Some("(1.2)".to_string())
        );
    }

    #[test]
    fn test_numbering_too_far_or_absent() {
        let config = PlacementConfig::default();
        let bbox = BoundingBox::new(250.0, 100.0, 330.0, 112.0);
        let far = vec![Fragment::new(
            "(1)",
            BoundingBox::new(500.0, 100.0, 515.0, 112.0),
            "Times",
            1,
        )];
        assert_eq!(find_numbering("x=1", &bbox, &far, &config), None);
        assert_eq!(
            find_numbering("x=1 (4)", &bbox, &[], &config),
            Some("(4)".to_string())
        );
    }

    #[test]
    fn test_page_context_windows() {
        let bbox = BoundingBox::new(250.0, 100.0, 330.0, 112.0);
        let fragments = vec![
            Fragment::new("second line", BoundingBox::new(85.0, 80.0, 200.0, 92.0), "Times", 1),
            Fragment::new("first line", BoundingBox::new(85.0, 60.0, 200.0, 72.0), "Times", 1),
            Fragment::new("x=1", bbox, "Cambria Math", 1),
            Fragment::new("after", BoundingBox::new(85.0, 130.0, 200.0, 142.0), "Times", 1),
        ];
        let (before, after) = page_context(&bbox, &fragments, 8);
        assert_eq!(before, "ond line");
        assert_eq!(after, "after");

        let (before, _) = page_context(&bbox, &fragments, 100);
        assert_eq!(before, "first line second line");
    }
}
