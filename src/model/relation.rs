// src/model/relation.rs
// =============================================================================
// The six relation kinds the crawler can expand, and the configured set.
//
// The declaration order of `Relation` IS the expansion order. Deriving Ord
// makes a BTreeSet iterate in exactly that order, so "which relation first"
// never depends on how the user wrote their config.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::NodeKind;

/// An edge kind the crawler may follow out of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Accounts that follow this account
    FollowedBy,
    /// Accounts this account follows
    Follows,
    /// Posts mentioning the authenticated account
    Mentions,
    /// Replies; the API offers no way to list them, always a no-op
    RepliesTo,
    /// Posts authored by this account
    HasPosts,
    /// Reposts of a post
    Reposts,
}

impl Relation {
    /// All relations in expansion order
    pub const ALL: [Relation; 6] = [
        Relation::FollowedBy,
        Relation::Follows,
        Relation::Mentions,
        Relation::RepliesTo,
        Relation::HasPosts,
        Relation::Reposts,
    ];

    /// Label stored with every record (also the column name in SQL output)
    pub fn label(self) -> &'static str {
        match self {
            Relation::FollowedBy => "followed_by",
            Relation::Follows => "follows",
            Relation::Mentions => "mentions",
            Relation::RepliesTo => "replies_to",
            Relation::HasPosts => "has_posts",
            Relation::Reposts => "reposts",
        }
    }

    /// Which node kind this relation is expanded from
    pub fn source_kind(self) -> NodeKind {
        match self {
            Relation::Reposts => NodeKind::Post,
            _ => NodeKind::Account,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a node's applicable relations are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationMode {
    /// Every configured relation fires
    #[default]
    Independent,
    /// Only the first configured relation (in expansion order) fires
    FirstMatch,
}

/// The relations enabled for one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet {
    enabled: BTreeSet<Relation>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: Relation) -> Self {
        self.enabled.insert(relation);
        self
    }

    pub fn insert(&mut self, relation: Relation) {
        self.enabled.insert(relation);
    }

    pub fn contains(&self, relation: Relation) -> bool {
        self.enabled.contains(&relation)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Relation> + '_ {
        self.enabled.iter().copied()
    }

    // Relations to expand for a node of `kind`, in the fixed expansion order.
    //
    // FirstMatch keeps only the first one, reproducing the old
    // `if ... else if ...` chain.
    pub fn expansions(&self, kind: NodeKind, mode: RelationMode) -> Vec<Relation> {
        let applicable = self.iter().filter(|r| r.source_kind() == kind);
        match mode {
            RelationMode::Independent => applicable.collect(),
            RelationMode::FirstMatch => applicable.take(1).collect(),
        }
    }
}

impl FromIterator<Relation> for RelationSet {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_order_ignores_insertion_order() {
        let set: RelationSet = [Relation::HasPosts, Relation::Follows, Relation::FollowedBy]
            .into_iter()
            .collect();

        assert_eq!(
            set.expansions(NodeKind::Account, RelationMode::Independent),
            vec![Relation::FollowedBy, Relation::Follows, Relation::HasPosts]
        );
    }

    #[test]
    fn test_reposts_only_apply_to_posts() {
        let set = RelationSet::new()
            .with(Relation::Reposts)
            .with(Relation::Follows);

        assert_eq!(
            set.expansions(NodeKind::Post, RelationMode::Independent),
            vec![Relation::Reposts]
        );
        assert_eq!(
            set.expansions(NodeKind::Account, RelationMode::Independent),
            vec![Relation::Follows]
        );
    }

    #[test]
    fn test_first_match_keeps_only_first_relation() {
        let set = RelationSet::new()
            .with(Relation::Mentions)
            .with(Relation::Follows);

        assert_eq!(
            set.expansions(NodeKind::Account, RelationMode::FirstMatch),
            vec![Relation::Follows]
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Relation::FollowedBy.label(), "followed_by");
        assert_eq!(Relation::Reposts.to_string(), "reposts");
    }
}
