// src/model/mod.rs
// =============================================================================
// The data the crawler discovers.
//
// - node: Account / Post, their keys, and the per-run CrawlGraph arena
// - relation: the six relation kinds and the configured RelationSet
// =============================================================================

mod node;
mod relation;

pub use node::{
    sanitize_text, Account, CrawlGraph, Node, NodeId, NodeKey, NodeKind, Post, MAX_TEXT_LEN,
};
pub use relation::{Relation, RelationMode, RelationSet};
