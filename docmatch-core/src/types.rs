use serde::{Deserialize, Serialize};

// ===== GEOMETRY =====

/// Axis-aligned rectangle in PDF user space (points), top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Finite coordinates with non-negative extent.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.y1 >= self.y0
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

// ===== LAYOUT INPUT =====

/// Smallest extracted text run with its own box, as delivered by the layout extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub font: String,
    pub page: u32,
}

impl Fragment {
    pub fn new(text: &str, bbox: BoundingBox, font: &str, page: u32) -> Self {
        Self {
            text: text.to_string(),
            bbox,
            font: font.to_string(),
            page,
        }
    }
}

/// One rendered page: its geometry and every text fragment on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page: u32,
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    /// Boxes of figures placed on the page
    #[serde(default)]
    pub images: Vec<BoundingBox>,
}

// ===== OBJECT-TREE INPUT =====

/// Paragraph as reported by the document-object-model collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParagraph {
    pub index: usize,
    pub text: String,
    #[serde(default)]
    pub centered: bool,
    /// Paragraph holds a native equation object
    #[serde(default)]
    pub has_math_object: bool,
    #[serde(default)]
    pub has_image: bool,
}

/// Both renderings of one document, as handed to the reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPair {
    #[serde(default)]
    pub pages: Vec<PageLayout>,
    #[serde(default)]
    pub paragraphs: Vec<TreeParagraph>,
}

// ===== ENTITIES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    Layout,
    ObjectTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Formula,
    Image,
}

/// Logical document element seen by one of the two representations.
///
/// Layout entities carry `bbox` and `page`; object-tree entities carry `position`
/// (paragraph index). Missing geometry on the side that requires it makes the entity
/// malformed for matching purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub source: EntitySource,
    pub text: String,
    pub bbox: Option<BoundingBox>,
    pub page: Option<u32>,
    pub position: Option<usize>,
    #[serde(default)]
    pub context_before: String,
    #[serde(default)]
    pub context_after: String,
    #[serde(default)]
    pub centered: bool,
    #[serde(default)]
    pub margins_ok: bool,
    /// Equation number found next to a layout formula, e.g. "(3)"
    #[serde(default)]
    pub numbering: Option<String>,
    #[serde(default)]
    pub fragment_count: usize,
    /// Figures need an empty line between them and the text above
    #[serde(default = "default_true")]
    pub blank_line_before: bool,
}

fn default_true() -> bool {
    true
}

impl Entity {
    pub fn layout_formula(text: &str, bbox: BoundingBox, page: u32) -> Self {
        Self {
            kind: EntityKind::Formula,
            source: EntitySource::Layout,
            text: text.to_string(),
            bbox: Some(bbox),
            page: Some(page),
            position: None,
            context_before: String::new(),
            context_after: String::new(),
            centered: false,
            margins_ok: false,
            numbering: None,
            fragment_count: 1,
            blank_line_before: true,
        }
    }

    pub fn tree_formula(text: &str, position: usize) -> Self {
        Self {
            kind: EntityKind::Formula,
            source: EntitySource::ObjectTree,
            text: text.to_string(),
            bbox: None,
            page: None,
            position: Some(position),
            context_before: String::new(),
            context_after: String::new(),
            centered: false,
            margins_ok: true,
            numbering: None,
            fragment_count: 0,
            blank_line_before: true,
        }
    }

    pub fn layout_image(bbox: BoundingBox, page: u32) -> Self {
        Self {
            kind: EntityKind::Image,
            fragment_count: 0,
            ..Self::layout_formula("", bbox, page)
        }
    }

    pub fn tree_image(position: usize) -> Self {
        Self {
            kind: EntityKind::Image,
            ..Self::tree_formula("", position)
        }
    }

    pub fn with_context(mut self, before: &str, after: &str) -> Self {
        self.context_before = before.to_string();
        self.context_after = after.to_string();
        self
    }

    /// Whether the entity carries the geometry its source requires.
    pub fn has_required_geometry(&self) -> bool {
        match self.source {
            EntitySource::Layout => {
                self.page.is_some() && self.bbox.map(|b| b.is_valid()).unwrap_or(false)
            }
            EntitySource::ObjectTree => self.position.is_some(),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.centered && self.margins_ok && self.blank_line_before
    }

    pub fn text_preview(&self, max_chars: usize) -> String {
        let preview: String = self.text.chars().take(max_chars).collect();
        if self.text.chars().count() > max_chars {
            format!("{preview}...")
        } else {
            preview
        }
    }
}
