// src/model/node.rs
// =============================================================================
// Accounts, posts, and the arena that owns them during one crawl.
//
// Nodes point at each other through `NodeId`s (indexes into `CrawlGraph`)
// instead of references. A NodeId doubles as the process-local sequence
// number used to express edges before anything is persisted.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Relation;

/// Maximum number of characters of post text we keep
pub const MAX_TEXT_LEN: usize = 63;

/// Process-local sequence number of a discovered node (0 = seed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminator for the two traversal unit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Account,
    Post,
}

/// Natural key of a node: screen name for accounts, remote id for posts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum NodeKey {
    Account(String),
    Post(u64),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Account(name) => write!(f, "@{}", name),
            NodeKey::Post(id) => write!(f, "post:{}", id),
        }
    }
}

/// A crawled social-graph identity
#[derive(Debug, Clone)]
pub struct Account {
    pub id: NodeId,
    pub screen_name: String,
    pub lang: Option<String>,
    /// Children discovered under this account, grouped by relation
    pub links: BTreeMap<Relation, Vec<NodeId>>,
}

/// A crawled status/message
#[derive(Debug, Clone)]
pub struct Post {
    pub id: NodeId,
    /// Stable identifier on the remote service
    pub post_id: u64,
    /// The author account, or the original post for a repost
    pub parent: NodeKey,
    /// Sanitized text (see `sanitize_text`)
    pub text: String,
    pub reposts: Vec<NodeId>,
}

/// A traversal unit
#[derive(Debug, Clone)]
pub enum Node {
    Account(Account),
    Post(Post),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Account(a) => a.id,
            Node::Post(p) => p.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Account(_) => NodeKind::Account,
            Node::Post(_) => NodeKind::Post,
        }
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Node::Account(a) => NodeKey::Account(a.screen_name.clone()),
            Node::Post(p) => NodeKey::Post(p.post_id),
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Node::Account(a) => Some(a),
            Node::Post(_) => None,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            Node::Post(p) => Some(p),
            Node::Account(_) => None,
        }
    }

    /// All children of this node, in attach order per relation
    pub fn children(&self) -> Vec<(Relation, NodeId)> {
        match self {
            Node::Account(a) => a
                .links
                .iter()
                .flat_map(|(rel, ids)| ids.iter().map(move |id| (*rel, *id)))
                .collect(),
            Node::Post(p) => p.reposts.iter().map(|id| (Relation::Reposts, *id)).collect(),
        }
    }
}

/// Owns every node discovered during one crawl run
#[derive(Debug, Default)]
pub struct CrawlGraph {
    nodes: Vec<Node>,
}

impl CrawlGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u64)
    }

    /// Adds an account and returns its sequence number
    pub fn add_account(&mut self, screen_name: impl Into<String>, lang: Option<String>) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::Account(Account {
            id,
            screen_name: screen_name.into(),
            lang,
            links: BTreeMap::new(),
        }));
        id
    }

    /// Adds a post; the text is sanitized on the way in
    pub fn add_post(&mut self, post_id: u64, parent: NodeKey, text: &str) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::Post(Post {
            id,
            post_id,
            parent,
            text: sanitize_text(text),
            reposts: Vec::new(),
        }));
        id
    }

    // Records `child` under `parent` for `relation`.
    // Only the owning collection changes; nodes are never removed.
    pub fn attach(&mut self, parent: NodeId, relation: Relation, child: NodeId) {
        match self.nodes.get_mut(parent.0 as usize) {
            Some(Node::Account(a)) => a.links.entry(relation).or_default().push(child),
            Some(Node::Post(p)) => p.reposts.push(child),
            None => {}
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind() == kind).count()
    }
}

// Truncates post text to MAX_TEXT_LEN characters, then strips single quotes.
//
// Output encoders bind values as parameters, so this is hygiene only.
pub fn sanitize_text(text: &str) -> String {
    let truncated: String = text.chars().take(MAX_TEXT_LEN).collect();
    truncated.replace('\'', "")
}
