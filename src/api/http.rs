// src/api/http.rs
// =============================================================================
// SocialApi over HTTP, using the classic v1.1 REST layout.
//
// Endpoints (joined onto the configured base URL):
// - followers/list.json?screen_name=X&cursor=C
// - friends/list.json?screen_name=X&cursor=C
// - statuses/mentions_timeline.json
// - statuses/user_timeline.json?screen_name=X
// - statuses/retweets/{id}.json
//
// Every request carries a static bearer token read once at startup. There is
// no token refresh. Pacing is the RateGate's job, not this client's: a 429
// simply comes back as ApiError::QuotaExceeded.
// =============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Cursor, Page, RemoteAccount, RemotePost, SocialApi};
use crate::error::{ApiError, ConfigError};

// Body of followers/list and friends/list
#[derive(Debug, Deserialize)]
struct AccountList {
    users: Vec<RemoteAccount>,
    #[serde(default)]
    next_cursor: i64,
}

impl From<AccountList> for Page<RemoteAccount> {
    fn from(list: AccountList) -> Self {
        Page {
            items: list.users,
            // 0 marks the last page
            next_cursor: (list.next_cursor != 0).then_some(Cursor(list.next_cursor)),
        }
    }
}

pub struct HttpApi {
    client: Client,
    base: Url,
    token: String,
}

impl HttpApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        // Without a trailing slash Url::join would replace the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    /// Reads the bearer token from the environment variable `token_env`
    pub fn from_env(base_url: &str, token_env: &str) -> Result<Self, ConfigError> {
        let token = std::env::var(token_env)
            .map_err(|_| ConfigError::MissingToken(token_env.to_string()))?;
        Self::new(base_url, token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::Transport {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(endpoint = path, "calling API");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| categorize_error(path, e))?;

        if let Some(err) = status_error(path, response.status()) {
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn account_page(
        &self,
        path: &str,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError> {
        let query = [
            ("screen_name", screen_name.to_string()),
            ("cursor", cursor.0.to_string()),
        ];
        let list: AccountList = self.get_json(path, &query).await?;
        Ok(list.into())
    }
}

#[async_trait]
impl SocialApi for HttpApi {
    async fn fetch_followers(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError> {
        self.account_page("followers/list.json", screen_name, cursor)
            .await
    }

    async fn fetch_following(
        &self,
        screen_name: &str,
        cursor: Cursor,
    ) -> Result<Page<RemoteAccount>, ApiError> {
        self.account_page("friends/list.json", screen_name, cursor)
            .await
    }

    async fn fetch_mentions(&self) -> Result<Vec<RemotePost>, ApiError> {
        self.get_json("statuses/mentions_timeline.json", &[]).await
    }

    async fn fetch_timeline(&self, screen_name: &str) -> Result<Vec<RemotePost>, ApiError> {
        let query = [("screen_name", screen_name.to_string())];
        self.get_json("statuses/user_timeline.json", &query).await
    }

    async fn fetch_reposts(&self, post_id: u64) -> Result<Vec<RemotePost>, ApiError> {
        let path = format!("statuses/retweets/{}.json", post_id);
        self.get_json(&path, &[]).await
    }
}

// Maps a non-success status to an error; None means "carry on"
fn status_error(endpoint: &str, status: StatusCode) -> Option<ApiError> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Some(ApiError::QuotaExceeded {
            endpoint: endpoint.to_string(),
        })
    } else {
        Some(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}

// Categorizes transport errors from reqwest
fn categorize_error(endpoint: &str, error: reqwest::Error) -> ApiError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };

    ApiError::Transport {
        endpoint: endpoint.to_string(),
        message,
    }
}
