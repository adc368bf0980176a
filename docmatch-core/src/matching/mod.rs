//! Reconciliation of layout entities with object-tree entities.
//!
//! Layout candidates first pass a content filter. The survivors are paired in three tiers
//! of decreasing confidence (exact, fuzzy, positional); each tier only sees indices that
//! no earlier tier has claimed, so the resulting mapping is injective on both sides.
//! Images carry no text and are paired by order alone.

pub mod content_filter;
pub mod mapping;
pub mod matcher;
pub mod order;

pub use content_filter::{ContentFilter, FilterVerdict};
pub use mapping::{AuditEvent, ClaimSet, MatchMethod, MatchRecord, Mapping};
pub use matcher::{match_entities, Matcher, NormalizedEntity};
pub use order::match_in_order;
