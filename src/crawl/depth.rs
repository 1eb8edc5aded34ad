// src/crawl/depth.rs
// =============================================================================
// Depth-first traversal: follow one branch all the way down before trying
// its siblings.
//
// visit(node, current_depth) starts with the seed at depth 1 and returns at
// once when current_depth > max_depth. Each discovered child is recorded and
// then visited immediately, so records come out in pre-order.
//
// The recursion is async, so each level is boxed (an async fn cannot call
// itself directly because its future would have infinite size).
// =============================================================================

use futures::future::{BoxFuture, FutureExt};

use super::context::Crawl;
use crate::model::NodeId;

pub(crate) async fn depth_first(crawl: &mut Crawl<'_>, seed: &str, max_depth: u32) {
    let seed = crawl.seed(seed);
    visit(crawl, seed, 1, max_depth).await;
}

fn visit<'c, 'a: 'c>(
    crawl: &'c mut Crawl<'a>,
    id: NodeId,
    current_depth: u32,
    max_depth: u32,
) -> BoxFuture<'c, ()> {
    async move {
        if current_depth > max_depth || !crawl.is_crawling() {
            return;
        }

        for relation in crawl.relations_for(id) {
            if !crawl.is_crawling() {
                return;
            }
            let found = crawl.fetch(id, relation).await;

            for entry in found {
                if !crawl.is_crawling() {
                    return;
                }
                // the seed sits at depth 1, so a child is current_depth hops out
                let child = crawl.adopt(id, relation, entry, current_depth);
                visit(crawl, child, current_depth + 1, max_depth).await;
            }
        }
    }
    .boxed()
}
