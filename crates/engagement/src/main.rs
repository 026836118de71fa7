//! Engagement CLI - extract engagement metrics for lists of Twitter/X posts.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use engagement::cache::{CacheConfig, ResponseCache};
use engagement::export::{self, SourceTable, UrlSelection};
use engagement::pipeline::{Pipeline, PipelineConfig};
use engagement::twitter::{ApiEndpoints, TwitterClient};

/// Engagement CLI - Retweet, like, reply and quote counts for posts.
#[derive(Parser)]
#[command(name = "engagement")]
#[command(about = "Twitter/X engagement extraction")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract metrics for a list of post URLs or a CSV column of them
    #[command(group(ArgGroup::new("source").required(true).args(["urls", "input"])))]
    Extract {
        /// Post URLs to scan, space separated
        #[arg(long, num_args = 1..)]
        urls: Vec<String>,

        /// CSV file whose join column holds the URLs
        #[arg(long, requires = "column_name")]
        input: Option<PathBuf>,

        /// Join column in the input CSV
        #[arg(long, requires = "input")]
        column_name: Option<String>,

        /// Output file, or directory receiving results.csv
        #[arg(long)]
        output: Option<PathBuf>,

        /// Cache entry lifetime in days
        #[arg(long, default_value = "31")]
        cache_expiry: u64,

        /// Cache directory
        #[arg(long, default_value = "uke-cache")]
        cache_path: PathBuf,

        /// URLs fetched concurrently per guest token
        #[arg(long, default_value = "5")]
        bucket: usize,

        /// Delay before each uncached request, in milliseconds
        #[arg(long, default_value = "1000")]
        sleep: u64,

        /// Only scan the first N URLs (-1 for all)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Dump raw responses next to the output file
        #[arg(long)]
        debug: bool,

        /// Bearer credential for the web API
        #[arg(long, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
        bearer_token: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

/// Resolved options for one extraction run.
struct ExtractArgs {
    urls: Vec<String>,
    input: Option<PathBuf>,
    column_name: Option<String>,
    output: Option<PathBuf>,
    cache: CacheConfig,
    pipeline: PipelineConfig,
    limit: Option<i64>,
    bearer_token: String,
    timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("engagement=debug,info")
    } else {
        EnvFilter::new("engagement=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Extract {
            urls,
            input,
            column_name,
            output,
            cache_expiry,
            cache_path,
            bucket,
            sleep,
            limit,
            debug,
            bearer_token,
            timeout,
        } => {
            let output_path = export::resolve_output_path(output.as_deref());
            let debug_dir = debug.then(|| export::output_dir(&output_path));
            let debug_dumps = debug;

            tracing::info!(
                output = %output_path.display(),
                cache = %cache_path.display(),
                bucket,
                sleep_ms = sleep,
                debug_dumps,
                "Starting extraction run"
            );

            run_extract(ExtractArgs {
                urls,
                input,
                column_name,
                output,
                cache: CacheConfig::with_days(cache_path, cache_expiry),
                pipeline: PipelineConfig {
                    bucket_size: bucket,
                    delay: Duration::from_millis(sleep),
                    debug_dir,
                },
                limit,
                bearer_token,
                timeout: Duration::from_secs(timeout),
            })
            .await
        }
    }
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    args.pipeline.validate()?;

    // Load URLs, from the list or the source CSV
    let source = match (&args.input, &args.column_name) {
        (Some(path), Some(column)) => Some(
            SourceTable::load(path, column)
                .with_context(|| format!("Failed to load URLs from {}", path.display()))?,
        ),
        _ => None,
    };
    let UrlSelection { urls, total } = export::select_urls(source.as_ref(), args.urls, args.limit);
    tracing::debug!(total, scanning = urls.len(), "Loaded URLs");

    let endpoints = ApiEndpoints {
        timeout: args.timeout,
        ..ApiEndpoints::default()
    };
    let client = TwitterClient::with_endpoints(args.bearer_token, endpoints)?;
    let cache = Arc::new(
        ResponseCache::open(&args.cache)
            .await
            .context("Failed to open response cache")?,
    );

    let pipeline = Pipeline::new(args.pipeline, Arc::new(client), cache.clone())?;
    let results = pipeline.run(&urls).await.context("Extraction aborted")?;

    let path = export::export(&results, source.as_ref(), args.output.as_deref())
        .context("Failed to write results")?;

    // The pipeline holds the other handle; release it before closing
    drop(pipeline);
    ResponseCache::close_shared(cache).await;

    println!("{}", export::summary_line(results.len(), total, &path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["engagement", "extract", "--bearer-token", "b"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    fn extract_urls(cli: Cli) -> Vec<String> {
        let Commands::Extract { urls, .. } = cli.command;
        urls
    }

    #[test]
    fn test_urls_with_commas_stay_whole() {
        let cli = parse(&[
            "--urls",
            "https://twitter.com/a/status/1?ref=a,b",
            "https://twitter.com/b/status/2",
        ])
        .unwrap();
        assert_eq!(
            extract_urls(cli),
            vec![
                "https://twitter.com/a/status/1?ref=a,b".to_string(),
                "https://twitter.com/b/status/2".to_string()
            ]
        );
    }

    #[test]
    fn test_exactly_one_input_form() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--urls", "u", "--input", "in.csv", "--column-name", "c"]).is_err());
        assert!(parse(&["--urls", "u", "--column-name", "c"]).is_err());
        assert!(parse(&["--input", "in.csv"]).is_err());
        assert!(parse(&["--input", "in.csv", "--column-name", "c"]).is_ok());
    }

    #[test]
    fn test_negative_limit_accepted() {
        let cli = parse(&["--urls", "u", "--limit", "-1"]).unwrap();
        let Commands::Extract { limit, .. } = cli.command;
        assert_eq!(limit, Some(-1));
    }
}
