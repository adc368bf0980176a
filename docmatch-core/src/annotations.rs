use crate::matching::Mapping;
use crate::types::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

const PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementIssue {
    NotCentered,
    MarginsViolated,
    MissingNumbering,
    MissingBlankLine,
}

impl PlacementIssue {
    pub fn describe(self, kind: EntityKind) -> &'static str {
        match (self, kind) {
            (PlacementIssue::NotCentered, EntityKind::Formula) => "formula is not centered",
            (PlacementIssue::NotCentered, EntityKind::Image) => "image is not centered",
            (PlacementIssue::MarginsViolated, _) => "margins violated",
            (PlacementIssue::MissingNumbering, _) => "numbering missing",
            (PlacementIssue::MissingBlankLine, _) => "no empty line before image",
        }
    }
}

/// A comment to attach to one paragraph of the object-tree document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: EntityKind,
    pub paragraph_index: usize,
    pub layout_index: usize,
    pub tree_index: usize,
    pub issues: Vec<PlacementIssue>,
    pub message: String,
}

pub fn issues_for(entity: &Entity) -> Vec<PlacementIssue> {
    let mut issues = Vec::new();
    if !entity.centered {
        issues.push(PlacementIssue::NotCentered);
    }
    if !entity.margins_ok {
        issues.push(PlacementIssue::MarginsViolated);
    }
    match entity.kind {
        EntityKind::Formula if entity.numbering.is_none() => {
            issues.push(PlacementIssue::MissingNumbering)
        }
        EntityKind::Image if !entity.blank_line_before => {
            issues.push(PlacementIssue::MissingBlankLine)
        }
        _ => {}
    }
    issues
}

fn message(entity: &Entity, issues: &[PlacementIssue]) -> String {
    let page = entity
        .page
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    let issues = issues
        .iter()
        .map(|issue| issue.describe(entity.kind))
        .collect::<Vec<_>>()
        .join("; ");
    match entity.kind {
        EntityKind::Formula => {
            let preview: String = entity.text.chars().take(PREVIEW_CHARS).collect();
            format!("FORMULA (p. {page}): {issues} | text: '{preview}...'")
        }
        EntityKind::Image => format!("IMAGE (p. {page}): {issues}"),
    }
}

/// One annotation per accepted pairing whose layout entity is not compliant. Pairings
/// are visited in layout order so the output is stable.
pub fn plan_annotations(layout: &[Entity], tree: &[Entity], mapping: &Mapping) -> Vec<Annotation> {
    let mut records: Vec<_> = mapping.records.iter().collect();
    records.sort_by_key(|r| r.layout_index);

    records
        .into_iter()
        .filter_map(|record| {
            let entity = layout.get(record.layout_index)?;
            if entity.is_compliant() {
                return None;
            }
            let paragraph_index = tree.get(record.tree_index)?.position?;
            let issues = issues_for(entity);
            Some(Annotation {
                kind: entity.kind,
                paragraph_index,
                layout_index: record.layout_index,
                tree_index: record.tree_index,
                message: message(entity, &issues),
                issues,
            })
        })
        .collect()
}
