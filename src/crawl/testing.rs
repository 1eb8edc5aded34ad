// src/crawl/testing.rs
// =============================================================================
// A scripted SocialApi for the engine tests.
//
// Every call is logged as "<operation>:<argument>" (mentions is just
// "mentions"). Unscripted lookups return an empty result. Scripted failures
// return ApiError::Status 500. `cancel_on_call(n, signal)` fires the signal
// while the n-th call is in flight.
// =============================================================================

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{run_crawl_with, CancelSignal, CrawlReport};
use crate::api::{Cursor, Page, RemoteAccount, RemotePost, SocialApi};
use crate::config::CrawlerConfig;
use crate::error::ApiError;
use crate::persist::MemoryPersister;
use crate::sink::Record;

#[derive(Default)]
pub(crate) struct ScriptedApi {
    followers: HashMap<String, Vec<Vec<RemoteAccount>>>,
    following: HashMap<String, Vec<Vec<RemoteAccount>>>,
    mentions: Vec<RemotePost>,
    timelines: HashMap<String, Vec<RemotePost>>,
    reposts: HashMap<u64, Vec<RemotePost>>,
    failing: HashSet<String>,
    cancel_on: Option<(usize, CancelSignal)>,
    calls: Mutex<Vec<String>>,
}

fn accounts(names: &[&str]) -> Vec<RemoteAccount> {
    names
        .iter()
        .map(|name| RemoteAccount {
            screen_name: name.to_string(),
            lang: Some("en".to_string()),
        })
        .collect()
}

fn posts(items: &[(u64, &str)]) -> Vec<RemotePost> {
    items
        .iter()
        .map(|(id, text)| RemotePost {
            id: *id,
            text: text.to_string(),
        })
        .collect()
}

fn page_at(pages: Option<&Vec<Vec<RemoteAccount>>>, cursor: Cursor) -> Page<RemoteAccount> {
    let pages = match pages {
        Some(pages) => pages,
        None => return Page::last(Vec::new()),
    };
    let index = if cursor == Cursor::FIRST { 0 } else { cursor.0 as usize };
    let items = pages.get(index).cloned().unwrap_or_default();
    let next_cursor = (index + 1 < pages.len()).then(|| Cursor(index as i64 + 1));
    Page { items, next_cursor }
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn followers(mut self, of: &str, names: &[&str]) -> Self {
        self.followers.insert(of.to_string(), vec![accounts(names)]);
        self
    }

    pub(crate) fn follower_pages(mut self, of: &str, pages: &[&[&str]]) -> Self {
        let pages = pages.iter().map(|names| accounts(names)).collect();
        self.followers.insert(of.to_string(), pages);
        self
    }

    pub(crate) fn following(mut self, of: &str, names: &[&str]) -> Self {
        self.following.insert(of.to_string(), vec![accounts(names)]);
        self
    }

    pub(crate) fn mentions(mut self, items: &[(u64, &str)]) -> Self {
        self.mentions = posts(items);
        self
    }

    pub(crate) fn timeline(mut self, of: &str, items: &[(u64, &str)]) -> Self {
        self.timelines.insert(of.to_string(), posts(items));
        self
    }

    pub(crate) fn reposts(mut self, of: u64, items: &[(u64, &str)]) -> Self {
        self.reposts.insert(of, posts(items));
        self
    }

    /// Makes `<operation>:<argument>` fail
    pub(crate) fn fail(mut self, operation: &str, argument: &str) -> Self {
        self.failing.insert(format!("{}:{}", operation, argument));
        self
    }

    pub(crate) fn cancel_on_call(mut self, call: usize, signal: CancelSignal) -> Self {
        self.cancel_on = Some((call, signal));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) -> Result<(), ApiError> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.clone());
            calls.len()
        };
        if let Some((n, signal)) = &self.cancel_on {
            if count == *n {
                signal.cancel();
            }
        }
        if self.failing.contains(&call) {
            return Err(ApiError::Status {
                endpoint: call,
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SocialApi for ScriptedApi {
    async fn fetch_followers(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError> {
        self.log(format!("followers:{}", screen_name))?;
        Ok(page_at(self.followers.get(screen_name), cursor))
    }

    async fn fetch_following(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError> {
        self.log(format!("following:{}", screen_name))?;
        Ok(page_at(self.following.get(screen_name), cursor))
    }

    async fn fetch_mentions(&self) -> Result<Vec<RemotePost>, ApiError> {
        self.log("mentions".to_string())?;
        Ok(self.mentions.clone())
    }

    async fn fetch_timeline(&self, screen_name: &str) -> Result<Vec<RemotePost>, ApiError> {
        self.log(format!("timeline:{}", screen_name))?;
        Ok(self.timelines.get(screen_name).cloned().unwrap_or_default())
    }

    async fn fetch_reposts(&self, post_id: u64) -> Result<Vec<RemotePost>, ApiError> {
        self.log(format!("reposts:{}", post_id))?;
        Ok(self.reposts.get(&post_id).cloned().unwrap_or_default())
    }
}

/// Runs a full crawl against `api` and returns the report and the committed batch
pub(crate) async fn run(config: &CrawlerConfig, api: &ScriptedApi) -> (CrawlReport, Vec<Record>) {
    run_with(config, api, CancelSignal::new()).await
}

pub(crate) async fn run_with(
    config: &CrawlerConfig,
    api: &ScriptedApi,
    cancel: CancelSignal,
) -> (CrawlReport, Vec<Record>) {
    let persister = MemoryPersister::new();
    let report = run_crawl_with(config, api, &persister, cancel)
        .await
        .expect("crawl should succeed");
    assert_eq!(persister.commits(), 1, "batch must be committed exactly once");
    (report, persister.records())
}
