// src/sink.rs
// =============================================================================
// RecordSink: the ordered list of everything a crawl discovered.
//
// Each discovered node produces exactly one Record, appended at the moment
// it is discovered (before it is queued or visited). The sink does no I/O and
// knows nothing about SQL; persist/ turns the batch into output.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::model::{Node, NodeId, NodeKey, NodeKind, Relation};

/// One discovered node together with the edge it was discovered through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Process-local sequence number of the node
    pub seq: NodeId,
    pub kind: NodeKind,
    /// Screen name or remote post id
    pub key: NodeKey,
    /// Sequence number of the node it was discovered under (None for the seed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_seq: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<NodeKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    /// Account language tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Sanitized post text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Hops from the seed
    pub depth: u32,
}

/// Accumulates records for one crawl run
#[derive(Debug, Default)]
pub struct RecordSink {
    records: Vec<Record>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends the record for `node`.
    //
    // `parent` is the node it hangs off and the relation that led there;
    // the seed has no parent.
    pub fn record(&mut self, node: &Node, parent: Option<(&Node, Relation)>, depth: u32) {
        self.records.push(Record {
            seq: node.id(),
            kind: node.kind(),
            key: node.key(),
            parent_seq: parent.map(|(p, _)| p.id()),
            parent_key: parent.map(|(p, _)| p.key()),
            relation: parent.map(|(_, rel)| rel),
            lang: node.as_account().and_then(|a| a.lang.clone()),
            text: node.as_post().map(|p| p.text.clone()),
            depth,
        });
    }

    /// The accumulated records in discovery order
    pub fn batch(&self) -> &[Record] {
        &self.records
    }

    pub fn into_batch(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
