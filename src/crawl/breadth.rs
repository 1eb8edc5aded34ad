// src/crawl/breadth.rs
// =============================================================================
// Breadth-first traversal of the social graph.
//
// How it works:
// 1. Record the seed account and put it in the queue at depth 0
// 2. Pop the front item
// 3. Expand each configured relation (one rate-gated call per page)
// 4. Record every discovered node, then push it at depth + 1
// 5. Repeat until the queue is empty, the depth budget is used up,
//    or the deadline cancels the crawl
//
// Depth travels with each queue item, so it is the real number of hops from
// the seed. Because the queue is level-ordered, the first item at max depth
// means every remaining item is at max depth too.
//
// There is no visited-set: an account reachable from two parents is
// recorded (and expanded) once per parent.
//
// Rust concepts:
// - VecDeque: push_back / pop_front give a FIFO queue, which is what makes
//   the order breadth-first
// - Copy: CrawlItem is two plain numbers, so it is copied, not borrowed
// - &mut Crawl<'_>: the strategy borrows the shared crawl state mutably
//   for the whole run; nothing else can touch it meanwhile
// =============================================================================

use std::collections::VecDeque;
use tracing::{debug, info};

use super::context::Crawl;
use crate::model::NodeId;

// Represents a node waiting in the crawl queue
#[derive(Debug, Clone, Copy)]
struct CrawlItem {
    id: NodeId,
    depth: u32, // Hops from the seed
}

// Crawls breadth-first from `seed`
//
// Parameters:
//   crawl: shared state (graph, sink, rate gate, cancel signal)
//   seed: screen name of the starting account
//   max_depth: how many hops from the seed may be recorded
//
// Example:
//   max_depth=0: only the seed is recorded
//   max_depth=1: the seed + everything directly related to it
//   max_depth=2: ... + everything related to those
pub(crate) async fn breadth_first(crawl: &mut Crawl<'_>, seed: &str, max_depth: u32) {
    // The seed is recorded before anything is fetched
    let mut queue = VecDeque::new();
    queue.push_back(CrawlItem {
        id: crawl.seed(seed),
        depth: 0,
    });

    // Process the queue until empty (or until we are told to stop)
    while let Some(item) = queue.pop_front() {
        // Deadline fired while the previous node was being expanded
        if !crawl.is_crawling() {
            info!(pending = queue.len() + 1, "crawl cancelled, leaving queue");
            break;
        }

        // Items come out level by level, so once one is at the limit
        // every item behind it is too
        if item.depth >= max_depth {
            debug!(depth = item.depth, "depth budget exhausted");
            break;
        }

        // Expand each configured relation in its fixed order
        for relation in crawl.relations_for(item.id) {
            if !crawl.is_crawling() {
                break;
            }

            // Rate-gated remote call(s); a failed call just yields nothing
            let found = crawl.fetch(item.id, relation).await;

            for entry in found {
                // Items returned by a call that outlived the deadline are dropped
                if !crawl.is_crawling() {
                    break;
                }

                // Record first, then queue one level deeper
                let child = crawl.adopt(item.id, relation, entry, item.depth + 1);
                queue.push_back(CrawlItem {
                    id: child,
                    depth: item.depth + 1,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{CrawlerConfig, RelationFlags, Strategy};
    use crate::crawl::testing::{run, ScriptedApi};
    use crate::model::{NodeKey, NodeKind, Relation};

    fn config(depth: u32) -> CrawlerConfig {
        let mut config = CrawlerConfig::new("seed");
        config.strategy = Strategy::BreadthFirst;
        config.depth = depth;
        config.hits_per_hour = 3600;
        config.relations = RelationFlags {
            follows: false,
            followed_by: true,
            ..RelationFlags::default()
        };
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_depth_zero_records_only_seed() {
        let api = ScriptedApi::new().followers("seed", &["a", "b"]);
        let (report, records) = run(&config(0), &api).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, NodeKey::Account("seed".into()));
        assert_eq!(report.remote_calls, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_node_does_not_stop_siblings() {
        let mut cfg = config(2);
        cfg.relations.follows = true;
        cfg.relations.followed_by = true;
        let api = ScriptedApi::new()
            .fail("followers", "seed")
            .following("seed", &["a", "b"])
            .fail("followers", "a")
            .followers("b", &["c"]);

        let (report, records) = run(&cfg, &api).await;
        let names: Vec<String> = records.iter().map(|r| r.key.to_string()).collect();

        assert_eq!(names, vec!["@seed", "@a", "@b", "@c"]);
        assert_eq!(report.failed_calls, 2);
        // the failed followers call on seed did not stop the following call
        assert_eq!(records[1].relation, Some(Relation::Follows));
    }

    #[tokio::test(start_paused = true)]
    async fn test_posts_and_reposts() {
        let mut cfg = config(2);
        cfg.relations = RelationFlags {
            follows: false,
            followed_by: false,
            has_posts: true,
            reposts: true,
            ..RelationFlags::default()
        };
        let api = ScriptedApi::new()
            .timeline("seed", &[(100, "it's my first post")])
            .reposts(100, &[(101, "RT it's my first post")]);

        let (_, records) = run(&cfg, &api).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].kind, NodeKind::Post);
        assert_eq!(records[1].parent_key, Some(NodeKey::Account("seed".into())));
        assert_eq!(records[1].text.as_deref(), Some("its my first post"));
        assert_eq!(records[2].key, NodeKey::Post(101));
        assert_eq!(records[2].parent_key, Some(NodeKey::Post(100)));
        assert_eq!(records[2].relation, Some(Relation::Reposts));
        assert_eq!(records[2].depth, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mentions_hang_off_the_account() {
        let mut cfg = config(1);
        cfg.relations = RelationFlags {
            follows: false,
            followed_by: false,
            mentions: true,
            replies_to: true,
            ..RelationFlags::default()
        };
        let api = ScriptedApi::new().mentions(&[(7, "@seed hello")]);

        let (report, records) = run(&cfg, &api).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].relation, Some(Relation::Mentions));
        // replies_to never reaches the API
        assert_eq!(api.calls(), vec!["mentions"]);
        assert_eq!(report.remote_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_is_capped_by_max_pages() {
        let mut cfg = config(1);
        cfg.max_pages = 2;
        let api = ScriptedApi::new().follower_pages("seed", &[&["a"], &["b"], &["c"]]);

        let (report, records) = run(&cfg, &api).await;

        let names: Vec<String> = records.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(names, vec!["@seed", "@a", "@b"]);
        assert_eq!(report.remote_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_reached_twice_is_recorded_twice() {
        let mut cfg = config(2);
        cfg.relations.follows = true;
        let api = ScriptedApi::new()
            .followers("seed", &["shared"])
            .following("seed", &["shared"]);

        let (_, records) = run(&cfg, &api).await;
        let shared = records
            .iter()
            .filter(|r| r.key == NodeKey::Account("shared".into()))
            .count();
        assert_eq!(shared, 2);
    }
}
