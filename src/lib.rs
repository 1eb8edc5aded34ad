// src/lib.rs
// =============================================================================
// social-crawler: a rate-limited, deadline-bound crawler for a microblogging
// social graph.
//
// Modules:
// - api: the SocialApi trait and its HTTP implementation
// - config: the TOML crawler configuration
// - crawl: rate gate, deadline timer, breadth-first / depth-first traversal
// - model: accounts, posts, relations
// - sink: the ordered record batch a crawl produces
// - persist: where the batch goes (JSON lines, parameterized SQL, memory)
// - error: typed errors for all of the above
// =============================================================================

pub mod api;
pub mod config;
pub mod crawl;
pub mod error;
pub mod model;
pub mod persist;
pub mod sink;

pub use crawl::{run_crawl, run_crawl_with, CrawlReport};
