// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
//   social-crawler crawl --config crawler.toml --output batch.jsonl
//   social-crawler crawl --seed rustlang --depth 1 --strategy depth-first
//   social-crawler crawl --config crawler.toml --format postgres \
//       --database-url postgres://crawler@localhost/crawl
//   social-crawler init-config crawler.toml --seed rustlang
//
// Flags given to `crawl` override whatever the config file says.
// =============================================================================

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use social_crawler::config::{CrawlerConfig, Strategy};
use social_crawler::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "social-crawler",
    version,
    about = "Crawl a microblogging social graph within a rate limit and a time budget",
    long_about = "social-crawler walks followers, followings, mentions, posts and reposts \
                  starting from a seed account, breadth-first or depth-first, pausing \
                  between API calls to stay under the hourly quota and stopping when the \
                  crawl time runs out."
)]
pub struct Cli {
    /// Log every discovered node (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a crawl and write the discovered records
    ///
    /// Example: social-crawler crawl --config crawler.toml --output batch.jsonl
    Crawl(CrawlArgs),

    /// Write a configuration file with default settings
    ///
    /// Example: social-crawler init-config crawler.toml --seed rustlang
    InitConfig {
        /// Where to write the file
        path: PathBuf,

        /// Seed account to put in the file
        #[arg(long, default_value = "twitter")]
        seed: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// How the batch is written
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON record per line
    Records,
    /// Parameterized SQL statements, one JSON object per line
    Statements,
    /// Commit straight into PostgreSQL (needs --database-url)
    Postgres,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed account (required when no config file is given)
    #[arg(long)]
    pub seed: Option<String>,

    /// Maximum number of hops from the seed
    #[arg(long)]
    pub depth: Option<u32>,

    /// API calls allowed per hour
    #[arg(long)]
    pub hits_per_hour: Option<u32>,

    /// Crawl time budget in seconds
    #[arg(long)]
    pub crawl_time: Option<u64>,

    /// breadth-first or depth-first
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Records)]
    pub format: OutputFormat,

    /// PostgreSQL connection string, used with --format postgres
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Print the crawl report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    // Loads the config file (if any) and applies the command-line overrides
    pub fn to_config(&self) -> Result<CrawlerConfig, ConfigError> {
        let mut config = match (&self.config, &self.seed) {
            (Some(path), _) => CrawlerConfig::load(path)?,
            (None, Some(seed)) => CrawlerConfig::new(seed.clone()),
            (None, None) => return Err(ConfigError::EmptySeed),
        };

        if let Some(seed) = &self.seed {
            config.seed = seed.clone();
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(hits) = self.hits_per_hour {
            config.hits_per_hour = hits;
        }
        if let Some(secs) = self.crawl_time {
            config.crawl_time = secs;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }

        config.validate()?;
        Ok(config)
    }
}
