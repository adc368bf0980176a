use super::content_filter::ContentFilter;
use super::mapping::{AuditEvent, ClaimSet, MatchMethod, MatchRecord, Mapping};
use crate::config::{ContentFilterConfig, MatchingConfig};
use crate::error::Result;
use crate::text::{context_overlap, score_normalized, NormalizedText, TextOrigin};
use crate::types::{Entity, EntityKind, EntitySource};

/// An input entity together with its normalized text, alive for one matching run.
#[derive(Debug)]
pub struct NormalizedEntity<'e> {
    pub index: usize,
    pub entity: &'e Entity,
    pub text: NormalizedText,
}

/// Mutable state threaded through the tiers.
#[derive(Debug, Default)]
struct MatchRun {
    claims: ClaimSet,
    records: Vec<MatchRecord>,
    audit: Vec<AuditEvent>,
}

impl MatchRun {
    fn accept(
        &mut self,
        method: MatchMethod,
        layout: &NormalizedEntity,
        tree: &NormalizedEntity,
        score: f64,
        rationale: String,
    ) {
        if !self.claims.claim(layout.index, tree.index) {
            return;
        }
        log::debug!(
            "{method} match: layout #{} '{}' <-> tree #{} '{}' ({score:.3})",
            layout.index,
            layout.text.cleaned_text,
            tree.index,
            tree.text.cleaned_text
        );
        self.audit.push(AuditEvent::Accepted {
            method,
            layout_index: layout.index,
            tree_index: tree.index,
            score,
        });
        self.records.push(MatchRecord {
            layout_index: layout.index,
            tree_index: tree.index,
            method,
            score,
            rationale,
        });
    }

    fn reject(
        &mut self,
        method: MatchMethod,
        layout: &NormalizedEntity,
        tree: &NormalizedEntity,
        score: f64,
        threshold: f64,
    ) {
        log::debug!(
            "{method} candidate rejected: layout #{} <-> tree #{} scored {score:.3} (needs > {threshold:.2})",
            layout.index,
            tree.index
        );
        self.audit.push(AuditEvent::Rejected {
            method,
            layout_index: layout.index,
            tree_index: tree.index,
            score,
            threshold,
        });
    }

    fn unclaimed_layout<'a, 'e>(
        &self,
        side: &'a [NormalizedEntity<'e>],
    ) -> Vec<&'a NormalizedEntity<'e>> {
        side.iter()
            .filter(|e| !self.claims.is_layout_claimed(e.index))
            .collect()
    }

    fn unclaimed_tree<'a, 'e>(
        &self,
        side: &'a [NormalizedEntity<'e>],
    ) -> Vec<&'a NormalizedEntity<'e>> {
        side.iter()
            .filter(|e| !self.claims.is_tree_claimed(e.index))
            .collect()
    }
}

/// Three-tier greedy matcher between layout and object-tree entities.
pub struct Matcher<'a> {
    config: &'a MatchingConfig,
    filter: &'a ContentFilter,
}

impl<'a> Matcher<'a> {
    pub fn new(config: &'a MatchingConfig, filter: &'a ContentFilter) -> Self {
        Self { config, filter }
    }

    pub fn match_entities(&self, layout: &[Entity], tree: &[Entity]) -> Mapping {
        let mut run = MatchRun::default();
        let layout_side = self.prepare_layout(layout, &mut run.audit);
        let tree_side = prepare_tree(tree, &mut run.audit);
        log::info!(
            "Matching {} layout entities ({} after filtering) against {} tree entities",
            layout.len(),
            layout_side.len(),
            tree_side.len()
        );

        self.exact_tier(&layout_side, &tree_side, &mut run);
        self.fuzzy_tier(&layout_side, &tree_side, &mut run);
        self.positional_tier(&layout_side, &tree_side, &mut run);

        let unmatched_layout: Vec<usize> =
            run.unclaimed_layout(&layout_side).iter().map(|e| e.index).collect();
        let unmatched_tree: Vec<usize> =
            run.unclaimed_tree(&tree_side).iter().map(|e| e.index).collect();

        let mapping = Mapping {
            records: run.records,
            unmatched_layout,
            unmatched_tree,
            audit: run.audit,
        };
        log::info!(
            "Matched {} pairs ({} exact, {} fuzzy, {} positional); unmatched: {} layout, {} tree",
            mapping.records.len(),
            mapping.count_by_method(MatchMethod::Exact),
            mapping.count_by_method(MatchMethod::Fuzzy),
            mapping.count_by_method(MatchMethod::Positional),
            mapping.unmatched_layout.len(),
            mapping.unmatched_tree.len()
        );
        mapping
    }

    /// Normalize layout entities and drop malformed ones, non-formulas and formula
    /// candidates that fail the content filter.
    fn prepare_layout<'e>(
        &self,
        layout: &'e [Entity],
        audit: &mut Vec<AuditEvent>,
    ) -> Vec<NormalizedEntity<'e>> {
        let mut prepared = Vec::with_capacity(layout.len());
        for (index, entity) in layout.iter().enumerate() {
            if let Some(event) = unmatchable(EntitySource::Layout, index, entity) {
                audit.push(event);
                continue;
            }

            let text = NormalizedText::new(&entity.text, TextOrigin::Layout);
            let verdict = self.filter.classify(&text.cleaned_text);
            if !verdict.is_accepted() {
                log::debug!(
                    "Filtered layout #{index} '{}': {}",
                    text.cleaned_text,
                    verdict.reason()
                );
                audit.push(AuditEvent::Filtered {
                    layout_index: index,
                    reason: verdict.reason(),
                });
                continue;
            }
            prepared.push(NormalizedEntity { index, entity, text });
        }
        prepared
    }

    /// Tier 1: identical normalized text of at least `min_exact_length` characters.
    fn exact_tier(
        &self,
        layout: &[NormalizedEntity],
        tree: &[NormalizedEntity],
        run: &mut MatchRun,
    ) {
        for l in layout {
            if run.claims.is_layout_claimed(l.index) {
                continue;
            }
            let key = &l.text.normalized_text;
            if key.chars().count() < self.config.min_exact_length {
                continue;
            }
            let hit = tree
                .iter()
                .find(|t| !run.claims.is_tree_claimed(t.index) && t.text.normalized_text == *key);
            if let Some(t) = hit {
                let rationale = format!("identical normalized text '{key}'");
                run.accept(MatchMethod::Exact, l, t, 1.0, rationale);
            }
        }
    }

    /// Tier 2: best similarity plus context bonus, first highest candidate wins.
    fn fuzzy_tier(
        &self,
        layout: &[NormalizedEntity],
        tree: &[NormalizedEntity],
        run: &mut MatchRun,
    ) {
        for l in layout {
            if run.claims.is_layout_claimed(l.index) {
                continue;
            }

            let mut best: Option<(&NormalizedEntity, f64, String)> = None;
            for t in tree {
                if run.claims.is_tree_claimed(t.index) {
                    continue;
                }
                let breakdown = score_normalized(&l.text, &t.text);
                let bonus = self.config.context_bonus_weight * context_overlap(l.entity, t.entity);
                let combined = (breakdown.best + bonus).min(1.0);
                log::debug!(
                    "fuzzy layout #{} vs tree #{}: {:.3} (+{:.3} context)",
                    l.index,
                    t.index,
                    breakdown.best,
                    bonus
                );

                if best.as_ref().map_or(true, |(_, score, _)| combined > *score) {
                    let rationale = format!(
                        "similarity {:.2} via {}, context bonus {:.2}",
                        breakdown.best,
                        breakdown.strongest_signal(),
                        bonus
                    );
                    best = Some((t, combined, rationale));
                }
            }

            if let Some((t, score, rationale)) = best {
                if score > self.config.fuzzy_threshold {
                    run.accept(MatchMethod::Fuzzy, l, t, score, rationale);
                } else {
                    run.reject(MatchMethod::Fuzzy, l, t, score, self.config.fuzzy_threshold);
                }
            }
        }
    }

    /// Tier 3: pair leftovers in page / document order when both sides have roughly the
    /// same number left, keeping only pairs above the positional floor.
    fn positional_tier(
        &self,
        layout: &[NormalizedEntity],
        tree: &[NormalizedEntity],
        run: &mut MatchRun,
    ) {
        let mut remaining_layout = run.unclaimed_layout(layout);
        let mut remaining_tree = run.unclaimed_tree(tree);
        if remaining_layout.is_empty() || remaining_tree.is_empty() {
            return;
        }

        let difference = remaining_layout.len().abs_diff(remaining_tree.len());
        if !self.config.enable_positional_fallback
            || difference > self.config.positional_count_slack
        {
            log::debug!(
                "Positional fallback skipped: {} layout vs {} tree left",
                remaining_layout.len(),
                remaining_tree.len()
            );
            run.audit.push(AuditEvent::PositionalFallbackSkipped {
                remaining_layout: remaining_layout.len(),
                remaining_tree: remaining_tree.len(),
            });
            return;
        }

        remaining_layout.sort_by_key(|e| e.entity.page.unwrap_or(u32::MAX));
        remaining_tree.sort_by_key(|e| e.entity.position.unwrap_or(usize::MAX));

        for (l, t) in remaining_layout.into_iter().zip(remaining_tree) {
            let score = score_normalized(&l.text, &t.text).best;
            if score > self.config.positional_floor {
                let rationale = format!(
                    "order position with similarity {score:.2} above floor {:.2}",
                    self.config.positional_floor
                );
                run.accept(MatchMethod::Positional, l, t, score, rationale);
            } else {
                run.reject(MatchMethod::Positional, l, t, score, self.config.positional_floor);
            }
        }
    }
}

pub(crate) fn malformed(source: EntitySource, index: usize, entity: &Entity) -> Option<AuditEvent> {
    if entity.has_required_geometry() {
        return None;
    }
    log::warn!(
        "Skipping {source:?} entity #{index} '{}': missing required geometry",
        entity.text_preview(30)
    );
    Some(AuditEvent::Skipped {
        source,
        index,
        reason: "missing required geometry".to_string(),
    })
}

/// Text tiers only compare formulas; other kinds are paired by `match_in_order`.
fn unmatchable(source: EntitySource, index: usize, entity: &Entity) -> Option<AuditEvent> {
    if let Some(event) = malformed(source, index, entity) {
        return Some(event);
    }
    if entity.kind == EntityKind::Formula {
        return None;
    }
    log::debug!("Skipping {source:?} entity #{index}: {:?} is not text-matched", entity.kind);
    Some(AuditEvent::Skipped {
        source,
        index,
        reason: format!("{:?} entities are paired by order", entity.kind).to_lowercase(),
    })
}

fn prepare_tree<'e>(tree: &'e [Entity], audit: &mut Vec<AuditEvent>) -> Vec<NormalizedEntity<'e>> {
    tree.iter()
        .enumerate()
        .filter_map(|(index, entity)| {
            if let Some(event) = unmatchable(EntitySource::ObjectTree, index, entity) {
                audit.push(event);
                return None;
            }
            Some(NormalizedEntity {
                index,
                entity,
                text: NormalizedText::new(&entity.text, TextOrigin::ObjectTree),
            })
        })
        .collect()
}

/// Match with the default thresholds and content filter.
pub fn match_entities(layout: &[Entity], tree: &[Entity]) -> Result<Mapping> {
    let filter = ContentFilter::new(&ContentFilterConfig::default())?;
    let config = MatchingConfig::default();
    Ok(Matcher::new(&config, &filter).match_entities(layout, tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn layout(text: &str, page: u32) -> Entity {
        Entity::layout_formula(text, BoundingBox::new(200.0, 100.0, 300.0, 112.0), page)
    }

    fn tree(text: &str, position: usize) -> Entity {
        Entity::tree_formula(text, position)
    }

    #[test]
    fn test_exact_tier_first_hit_in_input_order() {
        let mapping = match_entities(
            &[layout("F=ma", 1)],
            &[tree("F = ma", 0), tree("F=ma", 1)],
        )
        .unwrap();
        assert_eq!(mapping.records.len(), 1);
        assert_eq!(mapping.records[0].tree_index, 0);
        assert_eq!(mapping.records[0].method, MatchMethod::Exact);
        assert_eq!(mapping.unmatched_tree, vec![1]);
    }

    #[test]
    fn test_short_keys_skip_exact_tier() {
        let mapping = match_entities(&[layout("x=", 1)], &[tree("x=", 0)]).unwrap();
        assert_eq!(mapping.count_by_method(MatchMethod::Exact), 0);
        assert_eq!(mapping.count_by_method(MatchMethod::Fuzzy), 1);
    }

    #[test]
    fn test_fuzzy_tier_takes_best_candidate() {
        let mapping = match_entities(
            &[layout("P=U*I*cos", 1)],
            &[tree("Q=m*c*t", 0), tree("P=U*I*cosφ", 1)],
        )
        .unwrap();
        let record = mapping.tree_for_layout(0).unwrap();
        assert_eq!(record.tree_index, 1);
        assert_eq!(record.method, MatchMethod::Fuzzy);
        assert!(record.score > 0.7);
        assert!(mapping.is_injective());
    }

    #[test]
    fn test_fuzzy_rejection_is_audited() {
        let mapping = match_entities(&[layout("x+y=z", 1)], &[tree("a<b", 0), tree("c<d", 1), tree("e<f", 2), tree("g<h", 3)])
            .unwrap();
        assert!(mapping.records.is_empty());
        assert!(mapping
            .rejections()
            .any(|e| matches!(e, AuditEvent::Rejected { method: MatchMethod::Fuzzy, .. })));
        assert!(mapping
            .audit
            .iter()
            .any(|e| matches!(e, AuditEvent::PositionalFallbackSkipped { .. })));
        assert_eq!(mapping.unmatched_layout, vec![0]);
        assert_eq!(mapping.unmatched_tree, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_malformed_entities_skipped() {
        let mut broken = layout("E=mc^2", 1);
        broken.page = None;
        let mut orphan = tree("E=mc^2", 0);
        orphan.position = None;

        let mapping = match_entities(&[broken, layout("F=ma", 1)], &[orphan, tree("F=ma", 1)]).unwrap();
        assert_eq!(mapping.records.len(), 1);
        assert_eq!(mapping.records[0].layout_index, 1);
        assert_eq!(mapping.records[0].tree_index, 1);
        let skipped = mapping
            .audit
            .iter()
            .filter(|e| matches!(e, AuditEvent::Skipped { .. }))
            .count();
        assert_eq!(skipped, 2);
        assert!(mapping.unmatched_layout.is_empty());
        assert!(mapping.unmatched_tree.is_empty());
    }

    #[test]
    fn test_images_are_left_to_order_matching() {
        let image = Entity::layout_image(BoundingBox::new(200.0, 200.0, 400.0, 300.0), 1);
        let mapping = match_entities(
            &[image, layout("F=ma", 1)],
            &[Entity::tree_image(0), tree("F=ma", 1)],
        )
        .unwrap();

        assert_eq!(mapping.records.len(), 1);
        assert_eq!(mapping.records[0].layout_index, 1);
        assert!(mapping.filtered_layout().is_empty());
        let skipped: Vec<_> = mapping
            .audit
            .iter()
            .filter_map(|e| match e {
                AuditEvent::Skipped {
                    source,
                    index,
                    reason,
                } => Some((*source, *index, reason.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            skipped,
            vec![
                (EntitySource::Layout, 0, "image entities are paired by order"),
                (EntitySource::ObjectTree, 0, "image entities are paired by order"),
            ]
        );
        assert!(mapping.unmatched_layout.is_empty());
        assert!(mapping.unmatched_tree.is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let mapping = match_entities(&[], &[]).unwrap();
        assert_eq!(mapping, Mapping::default());
    }
}
