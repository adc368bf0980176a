// Docmatch Core Library
//
// Clusters formula fragments on rendered pages and reconciles them with the formulas of
// the document's object tree. Main interface for producing a mapping between the two
// representations plus the annotations to write back.

pub mod annotations;
pub mod config;
pub mod error;
pub mod layout;
pub mod matching;
pub mod processor;
pub mod report;
pub mod text;
pub mod tree;
pub mod types;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use layout::cluster;
pub use matching::{match_entities, Mapping, MatchMethod};
pub use processor::Reconciler;
pub use report::ReconciliationReport;
pub use text::{normalize, similarity, TextOrigin};
