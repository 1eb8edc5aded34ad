// src/api/mod.rs
// =============================================================================
// The remote social API as the crawl engine sees it.
//
// The engine only depends on the `SocialApi` trait. `HttpApi` (http.rs) is
// the real implementation; tests plug in a scripted one.
//
// Follower/following lists are cursor-paginated: start with
// `Cursor::FIRST` and keep going while the page carries a next cursor.
// =============================================================================

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub use http::HttpApi;

/// Position in a paginated list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(pub i64);

impl Cursor {
    /// The service's "start from the beginning" cursor
    pub const FIRST: Cursor = Cursor(-1);
}

/// One page of results plus where to continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// None on the last page
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// An account as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAccount {
    pub screen_name: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// A post as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: u64,
    #[serde(default)]
    pub text: String,
}

/// Capabilities the crawl engine needs from the remote service
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Accounts following `screen_name`
    async fn fetch_followers(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError>;

    /// Accounts `screen_name` follows
    async fn fetch_following(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError>;

    /// Recent posts mentioning the authenticated account
    async fn fetch_mentions(&self) -> Result<Vec<RemotePost>, ApiError>;

    /// Recent posts authored by `screen_name`
    async fn fetch_timeline(&self, screen_name: &str) -> Result<Vec<RemotePost>, ApiError>;

    /// Reposts of the post `post_id`
    async fn fetch_reposts(&self, post_id: u64) -> Result<Vec<RemotePost>, ApiError>;
}
