//! Formula and image candidates from the object-tree representation.

use crate::config::TreeDetectionConfig;
use crate::text::{first_chars, last_chars};
use crate::types::{Entity, TreeParagraph};

fn join_texts(paragraphs: &[TreeParagraph]) -> String {
    paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// A paragraph is a formula candidate when it contains a math indicator or holds a native
/// equation object.
pub fn is_formula_paragraph(paragraph: &TreeParagraph, config: &TreeDetectionConfig) -> bool {
    let text = paragraph.text.trim();
    paragraph.has_math_object
        || config
            .math_indicators
            .iter()
            .any(|indicator| text.contains(indicator.as_str()))
}

/// Neighbouring paragraph text on both sides of paragraph `i`, clipped to `context_chars`.
fn paragraph_context(
    paragraphs: &[TreeParagraph],
    i: usize,
    config: &TreeDetectionConfig,
) -> (String, String) {
    let span = config.context_paragraphs;
    let before = join_texts(&paragraphs[i.saturating_sub(span)..i]);
    let after_end = (i + 1 + span).min(paragraphs.len());
    let after = join_texts(&paragraphs[i + 1..after_end]);
    (
        last_chars(&before, config.context_chars),
        first_chars(&after, config.context_chars),
    )
}

/// Collect formula entities in document order, with the text of neighbouring paragraphs as
/// context.
pub fn collect_tree_formulas(
    paragraphs: &[TreeParagraph],
    config: &TreeDetectionConfig,
) -> Vec<Entity> {
    let formulas: Vec<Entity> = paragraphs
        .iter()
        .enumerate()
        .filter(|(_, paragraph)| is_formula_paragraph(paragraph, config))
        .map(|(i, paragraph)| {
            let (before, after) = paragraph_context(paragraphs, i, config);
            let mut entity = Entity::tree_formula(paragraph.text.trim(), paragraph.index)
                .with_context(&before, &after);
            entity.centered = paragraph.centered;
            entity
        })
        .collect();

    log::info!(
        "Found {} formula candidates in {} paragraphs",
        formulas.len(),
        paragraphs.len()
    );
    formulas
}

/// One image entity per paragraph that holds a picture, in document order.
pub fn collect_tree_images(
    paragraphs: &[TreeParagraph],
    config: &TreeDetectionConfig,
) -> Vec<Entity> {
    let images: Vec<Entity> = paragraphs
        .iter()
        .enumerate()
        .filter(|(_, paragraph)| paragraph.has_image)
        .map(|(i, paragraph)| {
            let (before, after) = paragraph_context(paragraphs, i, config);
            let mut entity = Entity::tree_image(paragraph.index).with_context(&before, &after);
            entity.centered = paragraph.centered;
            entity
        })
        .collect();

    log::info!("Found {} images in {} paragraphs", images.len(), paragraphs.len());
    images
}
