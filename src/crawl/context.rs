// src/crawl/context.rs
// =============================================================================
// State and steps shared by both traversal strategies.
//
// A strategy only decides ORDER. Everything else lives here:
// - which relations a node expands (per node kind, fixed order)
// - the rate-gated remote call(s) for one relation, including pagination
// - turning a fetched item into a node: build, attach, record, in one step
//
// Remote failures never escape: they are logged, counted, and the relation
// yields whatever was fetched before the failure (usually nothing).
//
// Rust concepts:
// - &'a dyn SocialApi: the API is borrowed as a trait object, so tests can
//   pass a scripted fake and the binary the HTTP client
// - Generic F: Future: fetch_posts takes the not-yet-started call; futures
//   are lazy, so nothing goes out until after the gate wait
// - Tuple matching: (relation, key) picks the right endpoint in one match
// =============================================================================

use std::future::Future;
use tracing::{debug, warn};

use super::{CancelSignal, RateGate};
use crate::api::{Cursor, RemoteAccount, RemotePost, SocialApi};
use crate::config::CrawlerConfig;
use crate::error::ApiError;
use crate::model::{CrawlGraph, NodeId, NodeKey, Relation, RelationMode, RelationSet};
use crate::sink::{Record, RecordSink};

/// Something a remote call returned, not yet part of the graph
#[derive(Debug, Clone)]
pub(crate) enum Discovered {
    Account(RemoteAccount),
    Post(RemotePost),
}

/// Remote call counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub remote_calls: u32,
    pub failed_calls: u32,
}

pub(crate) struct Crawl<'a> {
    api: &'a dyn SocialApi,
    gate: RateGate,
    cancel: CancelSignal,
    relations: RelationSet,
    mode: RelationMode,
    max_pages: u32,
    graph: CrawlGraph,
    sink: RecordSink,
    stats: CallStats,
}

impl<'a> Crawl<'a> {
    pub(crate) fn new(
        api: &'a dyn SocialApi,
        gate: RateGate,
        cancel: CancelSignal,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            api,
            gate,
            cancel,
            relations: config.relation_set(),
            mode: config.relation_mode,
            max_pages: config.max_pages,
            graph: CrawlGraph::new(),
            sink: RecordSink::new(),
            stats: CallStats::default(),
        }
    }

    pub(crate) fn is_crawling(&self) -> bool {
        self.cancel.is_crawling()
    }

    /// Creates and records the seed account
    pub(crate) fn seed(&mut self, screen_name: &str) -> NodeId {
        let id = self.graph.add_account(screen_name, None);
        if let Some(node) = self.graph.get(id) {
            self.sink.record(node, None, 0);
        }
        debug!(seed = screen_name, "seed recorded");
        id
    }

    /// Relations to expand for `id`, in expansion order
    pub(crate) fn relations_for(&self, id: NodeId) -> Vec<Relation> {
        match self.graph.get(id) {
            Some(node) => self.relations.expansions(node.kind(), self.mode),
            None => Vec::new(),
        }
    }

    // Performs the remote call(s) for one relation of one node.
    // Every call is preceded by a gate wait; cancellation during the wait
    // ends the relation with what has been fetched so far.
    pub(crate) async fn fetch(&mut self, id: NodeId, relation: Relation) -> Vec<Discovered> {
        // Copy the reference out so the call futures below borrow the API,
        // not `self` (which fetch_posts needs mutably)
        let api = self.api;

        // Owned key: the graph may grow while we wait on the network
        let key = match self.graph.get(id) {
            Some(node) => node.key(),
            None => return Vec::new(),
        };

        match (relation, key) {
            // The API has no "replies to" listing
            (Relation::RepliesTo, key) => {
                warn!(node = %key, "replies_to cannot be listed through the API, skipping");
                Vec::new()
            }
            // Account lists are paginated
            (Relation::FollowedBy | Relation::Follows, NodeKey::Account(name)) => {
                self.fetch_accounts(relation, &name).await
            }
            // Post lists come back in a single response
            (Relation::Mentions, NodeKey::Account(_)) => {
                self.fetch_posts(relation, api.fetch_mentions()).await
            }
            (Relation::HasPosts, NodeKey::Account(name)) => {
                self.fetch_posts(relation, api.fetch_timeline(&name)).await
            }
            (Relation::Reposts, NodeKey::Post(post_id)) => {
                self.fetch_posts(relation, api.fetch_reposts(post_id)).await
            }
            // relation does not apply to this node kind
            _ => Vec::new(),
        }
    }

    async fn fetch_accounts(&mut self, relation: Relation, screen_name: &str) -> Vec<Discovered> {
        let mut found = Vec::new();
        let mut cursor = Cursor::FIRST;

        // One gated call per page, at most max_pages of them
        for _ in 0..self.max_pages {
            // Wait out the rate interval, then look at the flag once more:
            // the deadline may have fired while we slept
            if self.gate.wait().await.is_err() || !self.cancel.is_crawling() {
                break;
            }
            self.stats.remote_calls += 1;

            let page = if relation == Relation::FollowedBy {
                self.api.fetch_followers(screen_name, cursor).await
            } else {
                self.api.fetch_following(screen_name, cursor).await
            };

            match page {
                Ok(page) => {
                    found.extend(page.items.into_iter().map(Discovered::Account));
                    // No next cursor means this was the last page
                    match page.next_cursor {
                        Some(next) => cursor = next,
                        None => break,
                    }
                }
                Err(e) => {
                    // Keep the pages we already have
                    self.call_failed(relation, &e);
                    break;
                }
            }
        }

        found
    }

    async fn fetch_posts<F>(&mut self, relation: Relation, call: F) -> Vec<Discovered>
    where
        F: Future<Output = Result<Vec<RemotePost>, ApiError>>,
    {
        // Same rule as for account pages: gate, then re-check the flag
        if self.gate.wait().await.is_err() || !self.cancel.is_crawling() {
            return Vec::new();
        }
        self.stats.remote_calls += 1;

        // Only now does the request actually go out
        match call.await {
            Ok(posts) => posts.into_iter().map(Discovered::Post).collect(),
            Err(e) => {
                self.call_failed(relation, &e);
                Vec::new()
            }
        }
    }

    fn call_failed(&mut self, relation: Relation, error: &ApiError) {
        self.stats.failed_calls += 1;
        warn!(%relation, error = %error, "remote call failed, treating relation as empty");
    }

    // Turns a fetched item into a child of `parent`: build the node, attach
    // it, and record it. Nothing here can be interrupted, so a node is
    // either fully present or absent.
    pub(crate) fn adopt(
        &mut self,
        parent: NodeId,
        relation: Relation,
        item: Discovered,
        depth: u32,
    ) -> NodeId {
        // Build: the arena hands out the next sequence number
        let child = match item {
            Discovered::Account(account) => self.graph.add_account(account.screen_name, account.lang),
            Discovered::Post(post) => {
                // A post remembers its author account (or the post it reposts)
                let parent_key = self
                    .graph
                    .get(parent)
                    .map(|p| p.key())
                    .unwrap_or(NodeKey::Post(0));
                self.graph.add_post(post.id, parent_key, &post.text)
            }
        };
        // Attach: the parent lists the child under this relation
        self.graph.attach(parent, relation, child);

        // Record: one entry per discovered node, in discovery order
        if let (Some(node), Some(parent_node)) = (self.graph.get(child), self.graph.get(parent)) {
            self.sink.record(node, Some((parent_node, relation)), depth);
            debug!(node = %node.key(), parent = %parent_node.key(), %relation, depth, "discovered");
        }
        child
    }

    pub(crate) fn finish(self) -> (CrawlGraph, Vec<Record>, CallStats) {
        (self.graph, self.sink.into_batch(), self.stats)
    }
}
