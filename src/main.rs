// src/main.rs
// =============================================================================
// This is the entry point of the crawler CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, filtered by RUST_LOG or --verbose)
// 3. Dispatch to the subcommand handler
// 4. Exit with proper code (0 = success, 2 = error)
//
// Logs go to stderr so that stdout can carry the crawl output.
// =============================================================================

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CrawlArgs, OutputFormat};
use social_crawler::api::HttpApi;
use social_crawler::config::CrawlerConfig;
use social_crawler::crawl::{run_crawl_with, CancelSignal, CrawlReport};
use social_crawler::persist::{
    JsonLinesPersister, Output, Persister, PgPersister, StatementPersister,
};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::InitConfig { path, seed, force } => handle_init_config(&path, seed, force),
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let config = args.to_config().context("Invalid configuration")?;
    let api = HttpApi::from_env(&config.api.base_url, &config.api.token_env)
        .context("Could not set up the API client")?;

    let output = match &args.output {
        Some(path) => Output::File(path.clone()),
        None => Output::Stdout,
    };
    let persister: Box<dyn Persister> = match args.format {
        OutputFormat::Records => Box::new(JsonLinesPersister::new(output)),
        OutputFormat::Statements => Box::new(StatementPersister::new(output)),
        OutputFormat::Postgres => {
            // Connect before crawling: a bad URL should not cost a whole crawl
            let url = args
                .database_url
                .as_deref()
                .context("--format postgres needs --database-url (or DATABASE_URL)")?;
            Box::new(PgPersister::connect(url).await.context("Could not connect to the database")?)
        }
    };

    // Ctrl-C ends the crawl the same way the deadline does: the batch so far
    // is still written
    let cancel = CancelSignal::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing current step");
                cancel.cancel();
            }
        });
    }

    let report = run_crawl_with(&config, &api, persister.as_ref(), cancel)
        .await
        .context("Crawl failed")?;

    print_report(&report, args.json)?;
    Ok(0)
}

// Handles the 'init-config' subcommand
fn handle_init_config(path: &Path, seed: String, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    CrawlerConfig::new(seed).save(path)?;
    info!(path = %path.display(), "configuration written");
    Ok(0)
}

// The report goes to stderr; stdout may be carrying the batch itself
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    eprintln!();
    eprintln!("📊 Crawl summary ({}):", report.strategy);
    eprintln!("   👤 Accounts: {}", report.accounts);
    eprintln!("   📝 Posts: {}", report.posts);
    eprintln!("   📋 Records: {}", report.records);
    eprintln!(
        "   🌐 API calls: {} ({} failed)",
        report.remote_calls, report.failed_calls
    );
    if report.cancelled {
        eprintln!("   ⏱️  Stopped early after {:.0}s", report.elapsed.as_secs_f64());
    } else {
        eprintln!("   ✅ Finished in {:.0}s", report.elapsed.as_secs_f64());
    }
    Ok(())
}
