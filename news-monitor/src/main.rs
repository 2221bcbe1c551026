use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use news_monitor::digest::compose_digest;
use news_monitor::{MonitorConfig, NewsMonitor};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Poll China / Hong Kong news feeds and email a digest of new policy stories.
#[derive(Debug, Parser)]
#[command(name = "news-monitor", version)]
struct Cli {
    /// Collect and print the digest without sending it or updating state.
    #[arg(long)]
    dry_run: bool,

    /// Path of the processed-articles state file.
    #[arg(long, env = "STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Only keep articles published within this many hours.
    #[arg(long)]
    max_age_hours: Option<i64>,

    /// Skip the model-backed scorers and use keyword rules only.
    #[arg(long)]
    rules_only: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting China Policy News Monitor");
    info!("Date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));

    let mut config = MonitorConfig::from_env().context("invalid configuration")?;
    if let Some(path) = cli.state_file {
        config.dedup.state_file = path;
    }
    if let Some(hours) = cli.max_age_hours {
        config.max_age_hours = hours;
    }
    if cli.rules_only {
        config.scorer.remote = None;
        config.scorer.local = None;
    }

    let monitor = NewsMonitor::from_config(config).context("failed to set up monitor")?;
    info!("Scoring strategies: {}", monitor.scorer_names().join(" -> "));

    let report = monitor.run(cli.dry_run).await;

    if cli.dry_run {
        let digest = compose_digest(&report.articles, Utc::now());
        println!("Subject: {}\n\n{}", digest.subject, digest.text);
    }

    info!(
        "Run complete: {} entries seen, {} already sent, {} off-topic, {} new, email sent: {}",
        report.entries_seen,
        report.already_processed,
        report.irrelevant,
        report.articles.len(),
        report.email_sent
    );
    Ok(())
}
