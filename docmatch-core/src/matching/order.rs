use super::mapping::{AuditEvent, ClaimSet, Mapping, MatchMethod, MatchRecord};
use super::matcher::malformed;
use crate::types::{Entity, EntitySource};

/// Pair text-less entities (images) purely by order: layout entities sorted by page and
/// top edge, tree entities by paragraph position. Surplus entities on either side stay
/// unmatched.
pub fn match_in_order(layout: &[Entity], tree: &[Entity]) -> Mapping {
    let mut audit = Vec::new();

    let mut layout_side: Vec<(usize, &Entity)> = Vec::with_capacity(layout.len());
    for (index, entity) in layout.iter().enumerate() {
        match malformed(EntitySource::Layout, index, entity) {
            Some(event) => audit.push(event),
            None => layout_side.push((index, entity)),
        }
    }
    let mut tree_side: Vec<(usize, &Entity)> = Vec::with_capacity(tree.len());
    for (index, entity) in tree.iter().enumerate() {
        match malformed(EntitySource::ObjectTree, index, entity) {
            Some(event) => audit.push(event),
            None => tree_side.push((index, entity)),
        }
    }

    layout_side.sort_by(|(_, a), (_, b)| {
        let top = |e: &Entity| e.bbox.map_or(f32::MAX, |b| b.y0);
        a.page
            .unwrap_or(u32::MAX)
            .cmp(&b.page.unwrap_or(u32::MAX))
            .then(top(a).total_cmp(&top(b)))
    });
    tree_side.sort_by_key(|(_, e)| e.position.unwrap_or(usize::MAX));

    let mut claims = ClaimSet::new();
    let mut records = Vec::new();
    for (rank, ((layout_index, l), (tree_index, t))) in
        layout_side.iter().zip(tree_side.iter()).enumerate()
    {
        claims.claim(*layout_index, *tree_index);
        log::debug!(
            "Image #{} (page {:?}) -> paragraph {:?}",
            layout_index,
            l.page,
            t.position
        );
        audit.push(AuditEvent::Accepted {
            method: MatchMethod::Order,
            layout_index: *layout_index,
            tree_index: *tree_index,
            score: 1.0,
        });
        records.push(MatchRecord {
            layout_index: *layout_index,
            tree_index: *tree_index,
            method: MatchMethod::Order,
            score: 1.0,
            rationale: format!("image {} in page order and in document order", rank + 1),
        });
    }

    let unmatched_layout: Vec<usize> = layout_side
        .iter()
        .map(|(i, _)| *i)
        .filter(|i| !claims.is_layout_claimed(*i))
        .collect();
    let unmatched_tree: Vec<usize> = tree_side
        .iter()
        .map(|(i, _)| *i)
        .filter(|i| !claims.is_tree_claimed(*i))
        .collect();

    log::info!(
        "Paired {} images by order; unmatched: {} layout, {} tree",
        records.len(),
        unmatched_layout.len(),
        unmatched_tree.len()
    );

    Mapping {
        records,
        unmatched_layout,
        unmatched_tree,
        audit,
    }
}
