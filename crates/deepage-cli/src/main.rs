mod config;
mod report;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use ulid::Ulid;

use deepage_core::{
    build_plan, query_specs, render_document, run_comparison, Bucket, IndexBenchmark, Mulberry32,
    RunInfo,
};
use deepage_http::{wait_for_health, HttpService, RetryPolicy, DEFAULT_HEALTH_INTERVAL};

use crate::config::{load_config, show_config_path, Config};
use crate::report::{print_summary, write_reports, BenchmarkReport};

#[derive(Parser)]
#[command(
    name = "deepage",
    version,
    about = "Retrieval-quality and consistency benchmark for memory services"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark two fresh indexes and compare them
    Run(RunArgs),

    /// Print the content plan (no network)
    Plan {
        /// Documents per index
        #[arg(short, long, default_value = "500")]
        iterations: usize,
    },

    /// Print rendered documents as JSON lines (no network)
    Generate {
        /// Documents per index
        #[arg(short, long, default_value = "500")]
        iterations: usize,

        /// Generator seed
        #[arg(short, long, default_value = "42")]
        seed: u32,

        /// Index label embedded in tokens
        #[arg(long, default_value = "alpha")]
        label: String,

        /// Stop after this many documents
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the config path and effective values
    Config,
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Documents written per index
    #[arg(long)]
    iterations: Option<usize>,

    /// Searches issued per index
    #[arg(long)]
    queries: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Retries for transport errors and 429s
    #[arg(long)]
    http_retries: Option<u32>,

    /// Linear backoff step in milliseconds (minimum 100)
    #[arg(long)]
    retry_backoff_ms: Option<u64>,

    /// Results requested per search
    #[arg(long)]
    search_limit: Option<usize>,

    /// Prefix for index and run ids
    #[arg(long)]
    index_prefix: Option<String>,

    /// Seed for index A
    #[arg(long)]
    seed_a: Option<u32>,

    /// Seed for index B
    #[arg(long)]
    seed_b: Option<u32>,

    /// Directory for last-run.json / last-run.md
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// README to update with the results block
    #[arg(long)]
    readme: Option<PathBuf>,

    /// Leave the README untouched
    #[arg(long)]
    skip_readme_update: bool,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.base_url {
            config.http.base_url = v;
        }
        if let Some(v) = self.iterations {
            config.bench.iterations = v;
        }
        if let Some(v) = self.queries {
            config.bench.search_queries = v;
        }
        if let Some(v) = self.timeout_ms {
            config.http.timeout_ms = v;
        }
        if let Some(v) = self.http_retries {
            config.http.retries = v;
        }
        if let Some(v) = self.retry_backoff_ms {
            config.http.retry_backoff_ms = v;
        }
        if let Some(v) = self.search_limit {
            config.bench.search_limit = v;
        }
        if let Some(v) = self.index_prefix {
            config.bench.index_prefix = v;
        }
        if let Some(v) = self.seed_a {
            config.bench.seed_a = v;
        }
        if let Some(v) = self.seed_b {
            config.bench.seed_b = v;
        }
        if let Some(v) = self.results_dir {
            config.report.results_dir = v;
        }
        if let Some(v) = self.readme {
            config.report.readme_path = v;
        }
        if self.skip_readme_update {
            config.report.update_readme = false;
        }
    }
}

fn index_id(prefix: &str, slot: &str) -> String {
    format!("{prefix}-{slot}-{}", Ulid::new().to_string().to_lowercase())
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_config()?;
    args.apply(&mut config);
    config.validate()?;

    let service = HttpService::new(
        &config.http.base_url,
        Duration::from_millis(config.http.timeout_ms),
        RetryPolicy::new(
            config.http.retries,
            Duration::from_millis(config.http.retry_backoff_ms),
        ),
    );
    wait_for_health(
        &service,
        Duration::from_secs(config.http.health_timeout_secs),
        DEFAULT_HEALTH_INTERVAL,
    )?;

    let prefix = &config.bench.index_prefix;
    let run_info = RunInfo::new(prefix);
    let a = IndexBenchmark::new(index_id(prefix, "a"), "alpha", config.bench.seed_a);
    let b = IndexBenchmark::new(index_id(prefix, "b"), "beta", config.bench.seed_b);
    info!(run = %run_info.run_id, "starting benchmark run");
    info!(a = %a.index_id, b = %b.index_id, "using indexes");

    let comparison = run_comparison(&service, &config.settings(), &a, &b, &run_info)?;
    let report = BenchmarkReport::new(&run_info, &config, comparison);

    let readme = config
        .report
        .update_readme
        .then_some(config.report.readme_path.as_path());
    let written = write_reports(&report, &config.report.results_dir, readme)
        .context("failed to write reports")?;

    print_summary(&report);
    println!("JSON report: {}", written.json.display());
    println!("Markdown report: {}", written.markdown.display());
    if let Some(p) = &written.readme {
        println!("README updated: {}", p.display());
    }
    Ok(())
}

fn cmd_plan(iterations: usize) -> Result<()> {
    let plan = build_plan(iterations)?;
    println!("{:>6}  {:<22} {:<7} {:>6}", "iter", "topic", "bucket", "words");
    println!("{}", "─".repeat(46));
    for item in &plan {
        println!(
            "{:>6}  {:<22} {:<7} {:>6}",
            item.iteration,
            item.topic.id,
            item.bucket.to_string(),
            item.target_word_count
        );
    }
    println!("{}", "─".repeat(46));
    let count = |b: Bucket| plan.iter().filter(|p| p.bucket == b).count();
    println!(
        "short {}  medium {}  long {}",
        count(Bucket::Short),
        count(Bucket::Medium),
        count(Bucket::Long)
    );
    Ok(())
}

fn cmd_generate(iterations: usize, seed: u32, label: &str, limit: Option<usize>) -> Result<()> {
    let plan = build_plan(iterations)?;
    let mut rng = Mulberry32::new(seed);
    let take = limit.unwrap_or(plan.len());

    for item in plan.iter().take(take) {
        let doc = render_document(item, label, &mut rng);
        let line = json!({
            "iteration": item.iteration,
            "topic": item.topic.id,
            "bucket": item.bucket,
            "targetWordCount": item.target_word_count,
            "wordCount": doc.word_count,
            "sentenceCount": doc.sentence_count,
            "uniqueToken": doc.unique_token,
            "markers": doc.markers(),
            "querySpecs": query_specs(item, &doc),
            "content": doc.content,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    println!("Config: {}", show_config_path());
    let mut config = load_config()?;
    if let Err(e) = config.validate() {
        println!("Warning: {e}");
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "warn,deepage_core=info,deepage_http=info,deepage_cli=info",
                )
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Plan { iterations } => cmd_plan(iterations),
        Commands::Generate {
            iterations,
            seed,
            label,
            limit,
        } => cmd_generate(iterations, seed, &label, limit),
        Commands::Config => cmd_config(),
    }
}
