use crate::config::ClusteringConfig;
use crate::text::tables::{BINDING_END_GLYPHS, BINDING_START_GLYPHS};
use crate::types::{BoundingBox, Entity, Fragment};
use std::collections::BTreeMap;

/// Groups page-layout fragments into formula entities by transitive adjacency.
pub struct SpatialClusterer<'a> {
    config: &'a ClusteringConfig,
}

impl<'a> SpatialClusterer<'a> {
    pub fn new(config: &'a ClusteringConfig) -> Self {
        Self { config }
    }

    /// Cluster fragments into entities ordered by (page, top, left).
    pub fn cluster(&self, fragments: &[Fragment]) -> Vec<Entity> {
        let groups = self.cluster_indices(fragments);
        let mut entities: Vec<Entity> = groups
            .iter()
            .filter_map(|group| merge_group(fragments, group, self.config.space_gap_threshold))
            .collect();

        entities.sort_by(|a, b| {
            let (ba, bb) = (a.bbox.unwrap_or(ZERO_BOX), b.bbox.unwrap_or(ZERO_BOX));
            a.page
                .cmp(&b.page)
                .then(ba.y0.total_cmp(&bb.y0))
                .then(ba.x0.total_cmp(&bb.x0))
        });

        log::info!(
            "Clustered {} fragments into {} entities",
            fragments.len(),
            entities.len()
        );
        entities
    }

    /// Cluster membership as indices into `fragments`. Fragments with malformed geometry
    /// are left out.
    pub fn cluster_indices(&self, fragments: &[Fragment]) -> Vec<Vec<usize>> {
        let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (index, fragment) in fragments.iter().enumerate() {
            if !fragment.bbox.is_valid() {
                log::warn!(
                    "Skipping fragment {index} on page {} with malformed bbox {:?}",
                    fragment.page,
                    fragment.bbox
                );
                continue;
            }
            by_page.entry(fragment.page).or_default().push(index);
        }

        let mut groups = Vec::new();
        for (_page, mut order) in by_page {
            order.sort_by(|&a, &b| {
                let (ba, bb) = (&fragments[a].bbox, &fragments[b].bbox);
                ba.y0.total_cmp(&bb.y0).then(ba.x0.total_cmp(&bb.x0))
            });

            let page_groups = self.grow_clusters(fragments, &order);
            let page_groups = if self.config.merge_same_line {
                self.merge_line_neighbours(fragments, page_groups)
            } else {
                page_groups
            };
            groups.extend(page_groups);
        }
        groups
    }

    /// Adjacency pass: each cluster absorbs any unclustered fragment adjacent to any member.
    fn grow_clusters(&self, fragments: &[Fragment], order: &[usize]) -> Vec<Vec<usize>> {
        let mut assigned = vec![false; order.len()];
        let mut groups = Vec::new();

        for seed in 0..order.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut members = vec![order[seed]];

            let mut frontier = 0;
            while frontier < members.len() {
                let current = &fragments[members[frontier]];
                for (pos, &candidate) in order.iter().enumerate() {
                    if !assigned[pos] && self.are_adjacent(current, &fragments[candidate]) {
                        assigned[pos] = true;
                        members.push(candidate);
                    }
                }
                frontier += 1;
            }
            groups.push(members);
        }
        groups
    }

    /// Second pass: merge consecutive clusters sitting on one line and closer than the
    /// horizontal gap.
    pub fn merge_line_neighbours(
        &self,
        fragments: &[Fragment],
        mut groups: Vec<Vec<usize>>,
    ) -> Vec<Vec<usize>> {
        groups.sort_by(|a, b| {
            let (ba, bb) = (group_bbox(fragments, a), group_bbox(fragments, b));
            ba.y0.total_cmp(&bb.y0).then(ba.x0.total_cmp(&bb.x0))
        });

        let mut merged: Vec<Vec<usize>> = Vec::with_capacity(groups.len());
        for group in groups {
            if let Some(last) = merged.last_mut() {
                let current = group_bbox(fragments, last);
                let next = group_bbox(fragments, &group);
                let same_line = (current.y0 - next.y0).abs() <= self.config.vertical_tolerance;
                if same_line && horizontal_gap(&current, &next) <= self.config.horizontal_gap {
                    last.extend(group);
                    continue;
                }
            }
            merged.push(group);
        }
        merged
    }

    fn has_math_glyph(&self, text: &str) -> bool {
        self.config
            .math_operator_glyphs
            .iter()
            .any(|glyph| text.contains(glyph.as_str()))
    }

    fn are_adjacent(&self, a: &Fragment, b: &Fragment) -> bool {
        let tolerance = self.config.vertical_tolerance;
        let vertical = b.bbox.y0 <= a.bbox.y1 + tolerance && b.bbox.y1 >= a.bbox.y0 - tolerance;
        if !vertical {
            return false;
        }

        let gap = horizontal_gap(&a.bbox, &b.bbox);
        let allowed = if self.has_math_glyph(&a.text) || self.has_math_glyph(&b.text) {
            self.config.horizontal_gap * self.config.math_gap_factor
        } else {
            self.config.horizontal_gap
        };
        gap <= allowed || a.bbox.intersects(&b.bbox)
    }
}

const ZERO_BOX: BoundingBox = BoundingBox {
    x0: 0.0,
    y0: 0.0,
    x1: 0.0,
    y1: 0.0,
};

/// Horizontal distance between two boxes, 0 when they overlap horizontally.
fn horizontal_gap(a: &BoundingBox, b: &BoundingBox) -> f32 {
    (a.x0.max(b.x0) - a.x1.min(b.x1)).max(0.0)
}

fn group_bbox(fragments: &[Fragment], group: &[usize]) -> BoundingBox {
    group
        .iter()
        .map(|&i| fragments[i].bbox)
        .reduce(|acc, bbox| acc.union(&bbox))
        .unwrap_or(ZERO_BOX)
}

/// Reduce one cluster to an entity: union bbox, text in (top, left) order with spaces only
/// where the gap is visible and no binding glyph sits on either side.
fn merge_group(fragments: &[Fragment], group: &[usize], space_gap: f32) -> Option<Entity> {
    let mut members: Vec<&Fragment> = group.iter().map(|&i| &fragments[i]).collect();
    members.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    let first = members.first()?;

    let mut text = String::new();
    for (i, fragment) in members.iter().enumerate() {
        if i > 0 {
            let previous = members[i - 1];
            let gap = fragment.bbox.x0 - previous.bbox.x1;
            let binds_left = previous
                .text
                .trim()
                .chars()
                .last()
                .map(|c| BINDING_END_GLYPHS.contains(&c))
                .unwrap_or(false);
            let binds_right = fragment
                .text
                .trim()
                .chars()
                .next()
                .map(|c| BINDING_START_GLYPHS.contains(&c))
                .unwrap_or(false);
            if gap > space_gap && !binds_left && !binds_right {
                text.push(' ');
            }
        }
        text.push_str(&fragment.text);
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let bbox = group_bbox(fragments, group);
    let mut entity = Entity::layout_formula(&text, bbox, first.page);
    entity.fragment_count = members.len();
    Some(entity)
}

/// Cluster with the default thresholds.
pub fn cluster(fragments: &[Fragment]) -> Vec<Entity> {
    let config = ClusteringConfig::default();
    SpatialClusterer::new(&config).cluster(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, x0: f32, x1: f32) -> Fragment {
        Fragment::new(text, BoundingBox::new(x0, 100.0, x1, 112.0), "CambriaMath", 1)
    }

    #[test]
    fn test_small_gaps_form_one_entity() {
        let fragments = vec![
            fragment("x", 100.0, 110.0),
            fragment("=", 115.0, 125.0),
            fragment("5", 130.0, 140.0),
        ];
        let entities = cluster(&fragments);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "x=5");
        assert_eq!(entities[0].bbox, Some(BoundingBox::new(100.0, 100.0, 140.0, 112.0)));
        assert_eq!(entities[0].fragment_count, 3);
    }

    #[test]
    fn test_wide_gap_splits_entities() {
        let fragments = vec![
            fragment("a", 100.0, 110.0),
            fragment("b", 115.0, 125.0),
            fragment("c", 325.0, 335.0),
        ];
        let entities = cluster(&fragments);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "a b");
        assert_eq!(entities[1].text, "c");
    }

    #[test]
    fn test_membership_is_transitive() {
        let fragments: Vec<Fragment> = (0..6)
            .map(|i| {
                let x0 = 50.0 + i as f32 * 50.0;
                fragment("t", x0, x0 + 10.0)
            })
            .collect();
        let entities = cluster(&fragments);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].fragment_count, 6);
    }

    #[test]
    fn test_math_glyph_relaxes_gap() {
        let config = ClusteringConfig::default();
        let clusterer = SpatialClusterer::new(&config);

        let with_operator = vec![fragment("a+", 100.0, 110.0), fragment("b", 170.0, 180.0)];
        assert_eq!(clusterer.cluster(&with_operator).len(), 1);

        let plain = vec![fragment("a", 100.0, 110.0), fragment("b", 170.0, 180.0)];
        assert_eq!(clusterer.cluster(&plain).len(), 2);
    }

    #[test]
    fn test_pages_never_mix() {
        let mut other_page = fragment("y", 115.0, 125.0);
        other_page.page = 2;
        let fragments = vec![fragment("x", 100.0, 110.0), other_page];
        let entities = cluster(&fragments);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].page, Some(1));
        assert_eq!(entities[1].page, Some(2));
    }

    #[test]
    fn test_malformed_fragments_skipped() {
        let broken = Fragment::new("z", BoundingBox::new(50.0, 0.0, 10.0, 5.0), "", 1);
        let fragments = vec![broken, fragment("x", 100.0, 110.0)];
        let entities = cluster(&fragments);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "x");
    }

    #[test]
    fn test_line_neighbours_merge() {
        let config = ClusteringConfig::default();
        let clusterer = SpatialClusterer::new(&config);
        let fragments = vec![
            fragment("a", 100.0, 110.0),
            fragment("b", 140.0, 150.0),
            fragment("c", 400.0, 410.0),
        ];
        let merged = clusterer.merge_line_neighbours(&fragments, vec![vec![1], vec![0], vec![2]]);
        assert_eq!(merged, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_no_space_next_to_binding_glyphs() {
        let fragments = vec![
            fragment("F", 100.0, 110.0),
            fragment("=", 120.0, 125.0),
            fragment("m", 135.0, 140.0),
            fragment("a", 141.0, 146.0),
        ];
        let entities = cluster(&fragments);
        assert_eq!(entities[0].text, "F=ma");
    }
}
