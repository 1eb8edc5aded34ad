// src/config.rs
// =============================================================================
// Crawler configuration: what to crawl, how deep, how fast, for how long.
//
// Loaded from a TOML file, e.g.:
//
//   seed = "rustlang"
//   depth = 2
//   hits_per_hour = 180
//   crawl_time = 3600
//   strategy = "breadth-first"
//
//   [relations]
//   followed_by = true
//   follows = true
//   mentions = false
//   replies_to = false
//   has_posts = true
//   reposts = true
//
// Anything missing falls back to a default. Type mismatches (a relation flag
// that is not true/false, a negative depth, an unknown strategy) are parse
// errors. validate() catches the rest before a crawl is allowed to start.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::model::{Relation, RelationMode, RelationSet};

/// Traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    #[serde(alias = "BREADTH_FIRST")]
    BreadthFirst,
    #[serde(alias = "DEPTH_FIRST")]
    DepthFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::BreadthFirst => f.write_str("breadth-first"),
            Strategy::DepthFirst => f.write_str("depth-first"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "breadth-first" | "bfs" => Ok(Strategy::BreadthFirst),
            "depth-first" | "dfs" => Ok(Strategy::DepthFirst),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// One on/off switch per relation, as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelationFlags {
    pub follows: bool,
    pub followed_by: bool,
    pub replies_to: bool,
    pub mentions: bool,
    pub has_posts: bool,
    pub reposts: bool,
}

impl Default for RelationFlags {
    fn default() -> Self {
        Self {
            follows: true,
            followed_by: true,
            replies_to: false,
            mentions: false,
            has_posts: false,
            reposts: false,
        }
    }
}

impl RelationFlags {
    pub fn to_set(&self) -> RelationSet {
        let flags = [
            (self.follows, Relation::Follows),
            (self.followed_by, Relation::FollowedBy),
            (self.replies_to, Relation::RepliesTo),
            (self.mentions, Relation::Mentions),
            (self.has_posts, Relation::HasPosts),
            (self.reposts, Relation::Reposts),
        ];
        flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, rel)| rel)
            .collect()
    }
}

/// Where the remote API lives and how to authenticate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the bearer token
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com/1.1/".to_string(),
            token_env: "SOCIAL_CRAWLER_TOKEN".to_string(),
        }
    }
}

fn default_depth() -> u32 {
    2
}

fn default_hits_per_hour() -> u32 {
    180
}

fn default_crawl_time() -> u64 {
    3600
}

fn default_max_pages() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Screen name the crawl starts from
    pub seed: String,
    /// Maximum number of hops from the seed
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Remote call budget; sets the pause between calls
    #[serde(default = "default_hits_per_hour")]
    pub hits_per_hour: u32,
    /// Wall-clock budget for the whole crawl, in seconds
    #[serde(default = "default_crawl_time")]
    pub crawl_time: u64,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub relation_mode: RelationMode,
    /// Pages followed per followers/following expansion
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub relations: RelationFlags,
    #[serde(default)]
    pub api: ApiConfig,
}

impl CrawlerConfig {
    /// A config with defaults for everything but the seed
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            depth: default_depth(),
            hits_per_hour: default_hits_per_hour(),
            crawl_time: default_crawl_time(),
            strategy: Strategy::default(),
            relation_mode: RelationMode::default(),
            max_pages: default_max_pages(),
            relations: RelationFlags::default(),
            api: ApiConfig::default(),
        }
    }

    /// Reads and parses a TOML config file (does not validate)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes this config as TOML, replacing the file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Rejects configs that cannot be crawled with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed.trim().is_empty() {
            return Err(ConfigError::EmptySeed);
        }
        if self.hits_per_hour == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroPages);
        }
        Ok(())
    }

    pub fn relation_set(&self) -> RelationSet {
        self.relations.to_set()
    }
}

impl fmt::Display for CrawlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relations: Vec<&str> = self.relation_set().iter().map(Relation::label).collect();
        write!(
            f,
            "seed={} depth={} hits_per_hour={} crawl_time={}s strategy={} relations=[{}]",
            self.seed,
            self.depth,
            self.hits_per_hour,
            self.crawl_time,
            self.strategy,
            relations.join(",")
        )
    }
}
