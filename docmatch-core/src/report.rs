use crate::annotations::Annotation;
use crate::matching::{MatchMethod, Mapping};
use crate::types::Entity;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub layout_formulas: usize,
    pub compliant_layout_formulas: usize,
    pub tree_formulas: usize,
    pub filtered_layout: usize,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub positional_matches: usize,
    pub unmatched_layout: usize,
    pub unmatched_tree: usize,
    #[serde(default)]
    pub layout_images: usize,
    #[serde(default)]
    pub tree_images: usize,
    #[serde(default)]
    pub image_matches: usize,
    pub annotations: usize,
}

impl Summary {
    pub fn from_parts(
        layout: &[Entity],
        tree: &[Entity],
        mapping: &Mapping,
        annotations: &[Annotation],
    ) -> Self {
        Self {
            layout_formulas: layout.len(),
            compliant_layout_formulas: layout.iter().filter(|e| e.is_compliant()).count(),
            tree_formulas: tree.len(),
            filtered_layout: mapping.filtered_layout().len(),
            exact_matches: mapping.count_by_method(MatchMethod::Exact),
            fuzzy_matches: mapping.count_by_method(MatchMethod::Fuzzy),
            positional_matches: mapping.count_by_method(MatchMethod::Positional),
            unmatched_layout: mapping.unmatched_layout.len(),
            unmatched_tree: mapping.unmatched_tree.len(),
            annotations: annotations.len(),
            ..Self::default()
        }
    }

    pub fn with_images(mut self, layout: &[Entity], tree: &[Entity], mapping: &Mapping) -> Self {
        self.layout_images = layout.len();
        self.tree_images = tree.len();
        self.image_matches = mapping.count_by_method(MatchMethod::Order);
        self
    }

    pub fn matched(&self) -> usize {
        self.exact_matches + self.fuzzy_matches + self.positional_matches
    }
}

/// Everything one reconciliation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub config_hash: String,
    pub layout_entities: Vec<Entity>,
    pub tree_entities: Vec<Entity>,
    pub mapping: Mapping,
    #[serde(default)]
    pub layout_images: Vec<Entity>,
    #[serde(default)]
    pub tree_images: Vec<Entity>,
    #[serde(default)]
    pub image_mapping: Mapping,
    pub annotations: Vec<Annotation>,
    pub summary: Summary,
}

impl ReconciliationReport {
    pub fn new(
        config_hash: String,
        layout_entities: Vec<Entity>,
        tree_entities: Vec<Entity>,
        mapping: Mapping,
        annotations: Vec<Annotation>,
    ) -> Self {
        let summary = Summary::from_parts(&layout_entities, &tree_entities, &mapping, &annotations);
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            config_hash,
            layout_entities,
            tree_entities,
            mapping,
            layout_images: Vec::new(),
            tree_images: Vec::new(),
            image_mapping: Mapping::default(),
            annotations,
            summary,
        }
    }

    /// Attach the figure side of the run and refresh the summary counts.
    pub fn with_images(
        mut self,
        layout_images: Vec<Entity>,
        tree_images: Vec<Entity>,
        image_mapping: Mapping,
    ) -> Self {
        self.summary = self
            .summary
            .with_images(&layout_images, &tree_images, &image_mapping);
        self.layout_images = layout_images;
        self.tree_images = tree_images;
        self.image_mapping = image_mapping;
        self
    }

    pub fn save_to_json(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report to {path}"))?;
        Ok(())
    }
}
