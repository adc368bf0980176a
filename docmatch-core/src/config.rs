use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub content_filter: ContentFilterConfig,
    /// Substrings of normalized font names that mark a math font
    #[serde(default = "default_math_fonts")]
    pub math_fonts: Vec<String>,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub tree_detection: TreeDetectionConfig,
    #[serde(default)]
    pub images: ImageConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            matching: MatchingConfig::default(),
            content_filter: ContentFilterConfig::default(),
            math_fonts: default_math_fonts(),
            placement: PlacementConfig::default(),
            tree_detection: TreeDetectionConfig::default(),
            images: ImageConfig::default(),
        }
    }
}

// ===== SPATIAL CLUSTERING =====

fn default_vertical_tolerance() -> f32 {
    15.0
}

fn default_horizontal_gap() -> f32 {
    50.0
}

fn default_math_gap_factor() -> f32 {
    1.5
}

fn default_space_gap_threshold() -> f32 {
    2.0
}

fn default_math_operator_glyphs() -> Vec<String> {
    ["=", "+", "-", "×", "÷", "/", "^", "²", "³", "∑", "∫", "∂"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Slack in points when testing vertical overlap between fragments
    #[serde(default = "default_vertical_tolerance")]
    pub vertical_tolerance: f32,
    /// Largest horizontal gap in points that still joins two fragments
    #[serde(default = "default_horizontal_gap")]
    pub horizontal_gap: f32,
    /// Multiplier on `horizontal_gap` when either fragment carries a math operator glyph
    #[serde(default = "default_math_gap_factor")]
    pub math_gap_factor: f32,
    /// Gaps at or below this many points never produce a space when joining text
    #[serde(default = "default_space_gap_threshold")]
    pub space_gap_threshold: f32,
    #[serde(default = "default_math_operator_glyphs")]
    pub math_operator_glyphs: Vec<String>,
    /// Second pass that joins neighbouring clusters on one text line
    #[serde(default = "default_true")]
    pub merge_same_line: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            vertical_tolerance: default_vertical_tolerance(),
            horizontal_gap: default_horizontal_gap(),
            math_gap_factor: default_math_gap_factor(),
            space_gap_threshold: default_space_gap_threshold(),
            math_operator_glyphs: default_math_operator_glyphs(),
            merge_same_line: true,
        }
    }
}

// ===== MATCHING =====

fn default_min_exact_length() -> usize {
    3
}

fn default_fuzzy_threshold() -> f64 {
    0.70
}

fn default_positional_floor() -> f64 {
    0.30
}

fn default_positional_count_slack() -> usize {
    2
}

fn default_context_bonus_weight() -> f64 {
    0.10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Normalized texts shorter than this never match exactly
    #[serde(default = "default_min_exact_length")]
    pub min_exact_length: usize,
    /// Fuzzy tier accepts only scores strictly above this
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Positional tier accepts only similarities strictly above this
    #[serde(default = "default_positional_floor")]
    pub positional_floor: f64,
    /// Positional tier runs only when the leftover counts differ by at most this much
    #[serde(default = "default_positional_count_slack")]
    pub positional_count_slack: usize,
    /// Weight of surrounding-text overlap added to fuzzy scores
    #[serde(default = "default_context_bonus_weight")]
    pub context_bonus_weight: f64,
    #[serde(default = "default_true")]
    pub enable_positional_fallback: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_exact_length: default_min_exact_length(),
            fuzzy_threshold: default_fuzzy_threshold(),
            positional_floor: default_positional_floor(),
            positional_count_slack: default_positional_count_slack(),
            context_bonus_weight: default_context_bonus_weight(),
            enable_positional_fallback: true,
        }
    }
}

// ===== CONTENT FILTER =====

/// Named regex counted as one positive math signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPattern {
    pub name: String,
    pub pattern: String,
}

impl SignalPattern {
    fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

fn default_signal_patterns() -> Vec<SignalPattern> {
    vec![
        SignalPattern::new("relation", r"[=<>≤≥≠≈]"),
        SignalPattern::new(
            "expression",
            r"[A-Za-z0-9)]\s*[+\-*/^]\s*[A-Za-z0-9(]",
        ),
        SignalPattern::new("greek", r"[α-ωΑ-Ω]"),
        SignalPattern::new(
            "function",
            r"(?i)\b(?:sin|cos|tg|tan|ctg|cot|arcsin|arccos|arctg|log|ln|lg|exp|sqrt|lim|max|min)\b",
        ),
        SignalPattern::new("operator_symbol", r"[∑∫∂∆∇√∞±]"),
    ]
}

fn default_exclusion_patterns() -> Vec<String> {
    vec![
        // Bibliography entries
        r"^\s*\[\d+\]".to_string(),
        r"(?i)\b(?:et al|isbn|issn|doi|url|https?|www)\b".to_string(),
        r"(?i)(?:^|\s)(?:с|c|pp?)\.\s*\d+(?:\s*[-–]\s*\d+)?\s*\.?\s*$".to_string(),
        // Captions and headings
        r"(?i)^\s*(?:глава|раздел|chapter|section|таблица|table|рисунок|рис\.|figure|fig\.)\s*\d"
            .to_string(),
        r"^\s*\d+(?:\.\d+)*[.)]?\s+\p{Lu}\p{Ll}+".to_string(),
        // Enumerated and bulleted lists
        r"^\s*[a-zа-я]\)\s+".to_string(),
        r"^\s*[-–—•]\s+\p{L}".to_string(),
    ]
}

fn default_long_text_threshold() -> usize {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_signal_patterns")]
    pub signal_patterns: Vec<SignalPattern>,
    #[serde(default = "default_exclusion_patterns")]
    pub exclusion_patterns: Vec<String>,
    /// Texts longer than this (in chars) need two distinct signals instead of one
    #[serde(default = "default_long_text_threshold")]
    pub long_text_threshold: usize,
}

impl Default for ContentFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            signal_patterns: default_signal_patterns(),
            exclusion_patterns: default_exclusion_patterns(),
            long_text_threshold: default_long_text_threshold(),
        }
    }
}

// ===== LAYOUT DETECTION =====

fn default_math_fonts() -> Vec<String> {
    [
        "cambriamath",
        "cambriamt",
        "cmmi",
        "cmr",
        "cmsy",
        "cmex",
        "stix",
        "stixmath",
        "mathtime",
        "xits",
        "xitsmath",
        "latinmodernmath",
        "texgyrepagella",
        "texgyretermes",
        "asanamath",
        "neoeuler",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_left_margin() -> f32 {
    85.04 // 3 cm
}

fn default_right_margin() -> f32 {
    56.69 // 2 cm
}

fn default_placement_tolerance() -> f32 {
    5.0
}

fn default_center_tolerance_factor() -> f32 {
    4.0
}

fn default_numbering_search_width() -> f32 {
    100.0
}

fn default_numbering_vertical_slack() -> f32 {
    5.0
}

fn default_context_chars() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "default_left_margin")]
    pub left_margin: f32,
    #[serde(default = "default_right_margin")]
    pub right_margin: f32,
    /// Slack in points applied to both margins
    #[serde(default = "default_placement_tolerance")]
    pub tolerance: f32,
    /// Centre tolerance as a multiple of `tolerance`
    #[serde(default = "default_center_tolerance_factor")]
    pub center_tolerance_factor: f32,
    #[serde(default = "default_numbering_search_width")]
    pub numbering_search_width: f32,
    #[serde(default = "default_numbering_vertical_slack")]
    pub numbering_vertical_slack: f32,
    /// Characters of surrounding page text kept on each side of a layout entity
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            left_margin: default_left_margin(),
            right_margin: default_right_margin(),
            tolerance: default_placement_tolerance(),
            center_tolerance_factor: default_center_tolerance_factor(),
            numbering_search_width: default_numbering_search_width(),
            numbering_vertical_slack: default_numbering_vertical_slack(),
            context_chars: default_context_chars(),
        }
    }
}

// ===== FIGURES =====

fn default_min_figure_size() -> f32 {
    28.35 // 1 cm
}

fn default_image_center_tolerance() -> f32 {
    5.0
}

fn default_min_blank_line_distance() -> f32 {
    12.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Figures smaller than this in both directions are decoration and ignored
    #[serde(default = "default_min_figure_size")]
    pub min_width: f32,
    #[serde(default = "default_min_figure_size")]
    pub min_height: f32,
    /// Largest distance in points between figure centre and content centre
    #[serde(default = "default_image_center_tolerance")]
    pub center_tolerance: f32,
    /// Smallest gap to the text above that still counts as an empty line
    #[serde(default = "default_min_blank_line_distance")]
    pub min_blank_line_distance: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_width: default_min_figure_size(),
            min_height: default_min_figure_size(),
            center_tolerance: default_image_center_tolerance(),
            min_blank_line_distance: default_min_blank_line_distance(),
        }
    }
}

// ===== OBJECT-TREE DETECTION =====

fn default_math_indicators() -> Vec<String> {
    ["=", "∑", "∫", "∂", "∆", "∇", "±", "×", "÷", "≤", "≥", "≠", "≈", "∞"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_context_paragraphs() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDetectionConfig {
    #[serde(default = "default_math_indicators")]
    pub math_indicators: Vec<String>,
    /// Neighbouring paragraphs read on each side for context
    #[serde(default = "default_context_paragraphs")]
    pub context_paragraphs: usize,
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for TreeDetectionConfig {
    fn default() -> Self {
        Self {
            math_indicators: default_math_indicators(),
            context_paragraphs: default_context_paragraphs(),
            context_chars: default_context_chars(),
        }
    }
}

impl ReconcileConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ReconcileConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                log::warn!("Failed to load config from {p} ({e}), using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// SHA-256 fingerprint of a serializable config, stamped on reports
pub fn calculate_config_hash<T: Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
