use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tier that produced a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Positional,
    /// Images paired by page order against document order
    Order,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Positional => "positional",
            MatchMethod::Order => "order",
        };
        write!(f, "{name}")
    }
}

/// One accepted pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub layout_index: usize,
    pub tree_index: usize,
    pub method: MatchMethod,
    pub score: f64,
    pub rationale: String,
}

/// Every decision the matcher took, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Layout entity rejected by the content filter before matching
    Filtered { layout_index: usize, reason: String },
    /// Entity without the geometry its source requires, or of a kind the tier does not
    /// compare
    Skipped {
        source: crate::types::EntitySource,
        index: usize,
        reason: String,
    },
    Accepted {
        method: MatchMethod,
        layout_index: usize,
        tree_index: usize,
        score: f64,
    },
    /// Best candidate at a tier fell short of that tier's threshold. The fuzzy tier
    /// records one event per unmatched layout entity, for its top-scoring candidate; the
    /// scores of the other candidates only reach the `debug` log.
    Rejected {
        method: MatchMethod,
        layout_index: usize,
        tree_index: usize,
        score: f64,
        threshold: f64,
    },
    PositionalFallbackSkipped {
        remaining_layout: usize,
        remaining_tree: usize,
    },
}

/// Indices already consumed by an accepted pairing, on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    layout: BTreeSet<usize>,
    tree: BTreeSet<usize>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_layout_claimed(&self, index: usize) -> bool {
        self.layout.contains(&index)
    }

    pub fn is_tree_claimed(&self, index: usize) -> bool {
        self.tree.contains(&index)
    }

    /// Claim both indices. Returns false, claiming nothing, if either is already taken.
    pub fn claim(&mut self, layout_index: usize, tree_index: usize) -> bool {
        if self.is_layout_claimed(layout_index) || self.is_tree_claimed(tree_index) {
            return false;
        }
        self.layout.insert(layout_index);
        self.tree.insert(tree_index);
        true
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}

/// Result of one matching run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub records: Vec<MatchRecord>,
    /// Layout entities that passed filtering and validation but found no partner
    pub unmatched_layout: Vec<usize>,
    pub unmatched_tree: Vec<usize>,
    pub audit: Vec<AuditEvent>,
}

impl Mapping {
    /// No index appears twice on either side.
    pub fn is_injective(&self) -> bool {
        let mut layout = BTreeSet::new();
        let mut tree = BTreeSet::new();
        self.records
            .iter()
            .all(|r| layout.insert(r.layout_index) && tree.insert(r.tree_index))
    }

    pub fn tree_for_layout(&self, layout_index: usize) -> Option<&MatchRecord> {
        self.records.iter().find(|r| r.layout_index == layout_index)
    }

    pub fn layout_for_tree(&self, tree_index: usize) -> Option<&MatchRecord> {
        self.records.iter().find(|r| r.tree_index == tree_index)
    }

    pub fn count_by_method(&self, method: MatchMethod) -> usize {
        self.records.iter().filter(|r| r.method == method).count()
    }

    pub fn filtered_layout(&self) -> Vec<usize> {
        self.audit
            .iter()
            .filter_map(|event| match event {
                AuditEvent::Filtered { layout_index, .. } => Some(*layout_index),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> impl Iterator<Item = &AuditEvent> {
        self.audit
            .iter()
            .filter(|event| matches!(event, AuditEvent::Rejected { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(layout_index: usize, tree_index: usize) -> MatchRecord {
        MatchRecord {
            layout_index,
            tree_index,
            method: MatchMethod::Exact,
            score: 1.0,
            rationale: String::new(),
        }
    }

    #[test]
    fn test_claim_set_refuses_reuse() {
        let mut claims = ClaimSet::new();
        assert!(claims.claim(0, 1));
        assert!(!claims.claim(0, 2));
        assert!(!claims.claim(3, 1));
        assert!(!claims.is_layout_claimed(3));
        assert!(!claims.is_tree_claimed(2));
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn test_injectivity_check() {
        let mut mapping = Mapping {
            records: vec![record(0, 0), record(1, 2)],
            ..Mapping::default()
        };
        assert!(mapping.is_injective());
        mapping.records.push(record(2, 2));
        assert!(!mapping.is_injective());
    }

    #[test]
    fn test_lookup_helpers() {
        let mapping = Mapping {
            records: vec![record(4, 7)],
            audit: vec![AuditEvent::Filtered {
                layout_index: 1,
                reason: "prose".to_string(),
            }],
            ..Mapping::default()
        };
        assert_eq!(mapping.tree_for_layout(4).map(|r| r.tree_index), Some(7));
        assert_eq!(mapping.layout_for_tree(7).map(|r| r.layout_index), Some(4));
        assert!(mapping.tree_for_layout(7).is_none());
        assert_eq!(mapping.filtered_layout(), vec![1]);
        assert_eq!(mapping.count_by_method(MatchMethod::Exact), 1);
    }
}
