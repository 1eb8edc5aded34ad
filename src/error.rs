// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// Three families of failure:
// - ConfigError: bad configuration, always fatal and raised before crawling
// - ApiError: one remote call failed; the engine logs it and moves on
// - PersistError: the finished batch could not be written out
// - CrawlError: what run_crawl() can return to the caller
//
// Deadline expiry is NOT an error. It is a control signal (see crawl::cancel).
//
// Rust concepts:
// - thiserror: derive std::error::Error + Display from attributes
// - #[from]: automatic conversion so the ? operator just works
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems, detected before any remote call is made
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for our schema
    /// (unknown strategy, non-boolean relation flag, negative numbers...)
    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// The config could not be written back to disk
    #[error("Failed to write config file '{path}': {message}")]
    Write { path: PathBuf, message: String },

    /// hits_per_hour must be positive, otherwise the gate interval is undefined
    #[error("hits_per_hour must be greater than zero")]
    ZeroRate,

    /// The seed account name is empty
    #[error("seed account must not be empty")]
    EmptySeed,

    /// At least one page has to be fetched per paginated relation
    #[error("max_pages must be greater than zero")]
    ZeroPages,

    /// Unknown strategy name given on the command line
    #[error("Unknown strategy '{0}' (expected breadth-first or depth-first)")]
    UnknownStrategy(String),

    /// The API bearer token environment variable is missing
    #[error("Environment variable '{0}' with the API bearer token is not set")]
    MissingToken(String),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// The API base URL does not parse
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Failure of a single remote call
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network / transport level failure
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The API answered 429 Too Many Requests
    #[error("Quota exceeded on {endpoint}")]
    QuotaExceeded { endpoint: String },

    /// Any other non-success status code
    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// The response body was not what we expected
    #[error("Could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// Failure to hand the finished batch to its destination
#[derive(Error, Debug)]
pub enum PersistError {
    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The database rejected the batch (or could not be reached)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors returned from a whole crawl run
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Configuration was rejected before the crawl started
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The persistence collaborator failed to commit the batch
    #[error("Failed to commit crawl batch: {0}")]
    Persist(#[from] PersistError),
}

/// Shorthand used across the library
pub type Result<T, E = CrawlError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_into_crawl_error() {
        let err: CrawlError = ConfigError::ZeroRate.into();
        assert!(matches!(err, CrawlError::Config(ConfigError::ZeroRate)));
        assert_eq!(
            err.to_string(),
            "Configuration error: hits_per_hour must be greater than zero"
        );
    }

    #[test]
    fn test_api_error_messages_name_the_endpoint() {
        let err = ApiError::Status {
            endpoint: "followers/list.json".to_string(),
            status: 500,
        };
        assert_eq!(err.to_string(), "HTTP 500 from followers/list.json");
    }
}
