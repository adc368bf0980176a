use crate::types::Fragment;

/// Lower-case font name with spaces, hyphens and underscores removed.
pub fn normalize_font_name(font: &str) -> String {
    font.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether the font name contains any of the configured math font fragments.
pub fn is_math_font(font: &str, math_fonts: &[String]) -> bool {
    let normalized = normalize_font_name(font);
    !normalized.is_empty()
        && math_fonts
            .iter()
            .any(|known| normalized.contains(&normalize_font_name(known)))
}

/// Fragments set in a math font, with their text trimmed. Blank fragments and fragments
/// with malformed geometry are dropped.
pub fn select_math_fragments(fragments: &[Fragment], math_fonts: &[String]) -> Vec<Fragment> {
    fragments
        .iter()
        .filter(|fragment| {
            if !fragment.bbox.is_valid() {
                log::warn!(
                    "Skipping fragment '{}' on page {}: malformed bbox",
                    fragment.text,
                    fragment.page
                );
                return false;
            }
            !fragment.text.trim().is_empty() && is_math_font(&fragment.font, math_fonts)
        })
        .map(|fragment| Fragment {
            text: fragment.text.trim().to_string(),
            ..fragment.clone()
        })
        .collect()
}
