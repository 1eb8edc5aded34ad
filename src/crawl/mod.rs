// src/crawl/mod.rs
// =============================================================================
// This module runs a crawl from start to finish.
//
// Pieces:
// - cancel: single-fire CancelSignal shared with the deadline timer
// - gate: RateGate, the pause before every remote call
// - deadline: DeadlineTimer, the wall-clock budget
// - context: steps shared by both strategies (fetch, adopt, record)
// - breadth / depth: the two traversal orders
//
// run_crawl():
// 1. Validate the config and build the rate gate (fails fast on bad input)
// 2. Start the deadline timer
// 3. Run the chosen strategy until it finishes or is cancelled
// 4. Stop the timer and commit the batch, exactly once
// =============================================================================

mod breadth;
mod cancel;
mod context;
mod deadline;
mod depth;
mod gate;
#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelSignal;
pub use context::CallStats;
pub use deadline::{DeadlineEvent, DeadlineTimer, ObserverId, TimerState};
pub use gate::{Cancelled, RateGate};

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::api::SocialApi;
use crate::config::{CrawlerConfig, Strategy};
use crate::error::Result;
use crate::model::NodeKind;
use crate::persist::Persister;
use breadth::breadth_first;
use context::Crawl;
use depth::depth_first;

/// Summary of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub strategy: Strategy,
    /// Records handed to the persister
    pub records: usize,
    pub accounts: usize,
    pub posts: usize,
    pub remote_calls: u32,
    pub failed_calls: u32,
    /// True when the crawl was cut short by its deadline (or cancelled)
    pub cancelled: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Runs one crawl with its own cancellation signal
pub async fn run_crawl(
    config: &CrawlerConfig,
    api: &dyn SocialApi,
    persister: &dyn Persister,
) -> Result<CrawlReport> {
    run_crawl_with(config, api, persister, CancelSignal::new()).await
}

// Same as run_crawl, but the caller owns the cancellation signal
// (e.g. to also cancel on Ctrl-C).
pub async fn run_crawl_with(
    config: &CrawlerConfig,
    api: &dyn SocialApi,
    persister: &dyn Persister,
    cancel: CancelSignal,
) -> Result<CrawlReport> {
    config.validate()?;
    let gate = RateGate::new(config.hits_per_hour, cancel.clone())?;

    info!(%config, interval_ms = gate.interval().as_millis() as u64, "starting crawl");
    let started = Instant::now();

    // Observers go in before the ticker starts, so even a zero budget is logged
    let mut timer = DeadlineTimer::new(config.crawl_time, cancel.clone());
    timer.register(|event| info!(info = %event.info, "deadline reached, finishing current step"));
    timer.arm();

    let mut crawl = Crawl::new(api, gate, cancel.clone(), config);
    match config.strategy {
        Strategy::BreadthFirst => breadth_first(&mut crawl, &config.seed, config.depth).await,
        Strategy::DepthFirst => depth_first(&mut crawl, &config.seed, config.depth).await,
    }
    timer.stop();

    let (graph, records, stats) = crawl.finish();
    let report = CrawlReport {
        strategy: config.strategy,
        records: records.len(),
        accounts: graph.count(NodeKind::Account),
        posts: graph.count(NodeKind::Post),
        remote_calls: stats.remote_calls,
        failed_calls: stats.failed_calls,
        cancelled: cancel.is_cancelled(),
        elapsed: started.elapsed(),
    };

    info!(records = report.records, "saving crawl batch");
    persister.commit(&records).await?;
    info!(
        records = report.records,
        remote_calls = report.remote_calls,
        cancelled = report.cancelled,
        "crawl finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::testing::{run, run_with, ScriptedApi};
    use super::*;
    use crate::config::RelationFlags;
    use crate::error::{ConfigError, CrawlError};
    use crate::model::NodeKey;
    use crate::persist::MemoryPersister;
    use crate::sink::Record;
    use std::collections::{BTreeSet, HashSet};

    // seed -> a, b ; a -> a1 ; b -> b1
    fn two_level_graph() -> ScriptedApi {
        ScriptedApi::new()
            .followers("seed", &["a", "b"])
            .followers("a", &["a1"])
            .followers("b", &["b1"])
    }

    fn followers_config(strategy: Strategy, depth: u32) -> CrawlerConfig {
        let mut config = CrawlerConfig::new("seed");
        config.strategy = strategy;
        config.depth = depth;
        config.hits_per_hour = 3600;
        config.relations = RelationFlags {
            follows: false,
            followed_by: true,
            ..RelationFlags::default()
        };
        config
    }

    fn names(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| match &r.key {
                NodeKey::Account(name) => name.clone(),
                NodeKey::Post(id) => id.to_string(),
            })
            .collect()
    }

    // every non-seed record points at a parent recorded before it
    fn assert_consistent(records: &[Record]) {
        let mut seen = HashSet::new();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.seq.0, i as u64);
            match record.parent_seq {
                None => assert_eq!(i, 0, "only the seed has no parent"),
                Some(parent) => assert!(seen.contains(&parent)),
            }
            seen.insert(record.seq);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_breadth_first_level_order() {
        let api = two_level_graph();
        let (report, records) = run(&followers_config(Strategy::BreadthFirst, 2), &api).await;

        assert_eq!(names(&records), vec!["seed", "a", "b", "a1", "b1"]);
        assert_eq!(report.records, 5);
        assert_eq!(report.accounts, 5);
        assert!(!report.cancelled);
        assert_consistent(&records);
    }

    #[tokio::test(start_paused = true)]
    async fn test_depth_first_pre_order() {
        let api = two_level_graph();
        let (_, records) = run(&followers_config(Strategy::DepthFirst, 2), &api).await;

        assert_eq!(names(&records), vec!["seed", "a", "a1", "b", "b1"]);
        assert_consistent(&records);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategies_discover_same_set() {
        let bfs = run(&followers_config(Strategy::BreadthFirst, 2), &two_level_graph()).await.1;
        let dfs = run(&followers_config(Strategy::DepthFirst, 2), &two_level_graph()).await.1;

        let bfs: BTreeSet<String> = names(&bfs).into_iter().collect();
        let dfs: BTreeSet<String> = names(&dfs).into_iter().collect();
        assert_eq!(bfs, dfs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_size_matches_discovered_nodes() {
        let mut config = followers_config(Strategy::BreadthFirst, 3);
        config.relations.has_posts = true;
        config.relations.reposts = true;
        let api = two_level_graph()
            .timeline("seed", &[(1, "hello")])
            .timeline("a1", &[(2, "deep")])
            .reposts(1, &[(3, "RT hello")]);

        let (report, records) = run(&config, &api).await;

        assert_eq!(report.records, records.len());
        assert_eq!(report.accounts + report.posts, records.len());
        assert_eq!(report.posts, 3);
        assert_consistent(&records);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_second_call_stops_crawl() {
        for strategy in [Strategy::BreadthFirst, Strategy::DepthFirst] {
            let cancel = CancelSignal::new();
            let api = two_level_graph().cancel_on_call(2, cancel.clone());
            let config = followers_config(strategy, 5);

            let started = Instant::now();
            let (report, records) = run_with(&config, &api, cancel).await;

            assert_eq!(api.calls().len(), 2, "{}: no call after cancellation", strategy);
            assert!(report.cancelled);
            // two gate intervals for two calls, nothing after
            assert!(started.elapsed() < Duration::from_secs(3));
            // items returned by the interrupted call are dropped
            assert!(!records.is_empty());
            assert!(!names(&records).contains(&"a1".to_string()));
            assert_consistent(&records);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_crawl_and_batch_is_committed() {
        // a long chain: seed -> n0 -> n1 -> ... -> n9
        let mut api = ScriptedApi::new().followers("seed", &["n0"]);
        for i in 0..9 {
            let (from, to) = (format!("n{}", i), format!("n{}", i + 1));
            api = api.followers(&from, &[to.as_str()]);
        }
        let mut config = followers_config(Strategy::BreadthFirst, 20);
        // one call every 2s, deadline at 5s: calls at t=2 and t=4 only
        config.hits_per_hour = 1800;
        config.crawl_time = 5;

        let (report, records) = run(&config, &api).await;

        assert!(report.cancelled);
        assert_eq!(report.remote_calls, 2);
        assert_eq!(names(&records), vec!["seed", "n0", "n1"]);
        assert!(report.elapsed < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_zero_rate_fails_before_any_call() {
        let api = two_level_graph();
        let persister = MemoryPersister::new();
        let mut config = followers_config(Strategy::BreadthFirst, 2);
        config.hits_per_hour = 0;

        let err = run_crawl(&config, &api, &persister).await.unwrap_err();
        assert!(matches!(err, CrawlError::Config(ConfigError::ZeroRate)));
        assert!(api.calls().is_empty());
        assert_eq!(persister.commits(), 0);
    }
}
