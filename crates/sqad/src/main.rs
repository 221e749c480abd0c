use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqad_agents::{IntentClassifier, RuleIntentClassifier};
use sqad_models::{QueryRequest, SqadConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sqad", about = "Specialist Query Aggregation Dispatcher")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/sqad.toml")]
    config: String,

    /// Query text; read from stdin when omitted
    #[arg(short, long)]
    query: Option<String>,

    /// Explicit ticker hint, skips extraction from the query text
    #[arg(short, long)]
    ticker: Option<String>,

    /// Comma-separated specialist names; classified from the query when omitted
    #[arg(short, long)]
    specialists: Option<String>,

    /// Cancel the query after this many seconds, keeping completed results
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: SqadConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    let query = if let Some(query) = cli.query {
        query
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read query from stdin")?;
        buf.trim().to_string()
    };

    let (specialist_set, classified_hint) = if let Some(names) = &cli.specialists {
        let set = names
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        (set, None)
    } else {
        let intent = RuleIntentClassifier.classify(&query).await;
        info!(kind = ?intent.kind, specialists = intent.specialist_needs.len(), "classified intent");
        (intent.specialist_needs, intent.ticker_hint)
    };

    let ticker_hint = cli.ticker.or(classified_hint);
    let request = QueryRequest::new(&query, ticker_hint.as_deref(), specialist_set);

    let dispatcher = sqad::build_dispatcher(&config).context("Failed to build dispatcher")?;

    let cancel = CancellationToken::new();
    if let Some(seconds) = cli.timeout {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            trigger.cancel();
        });
    }

    let context = sqad::run_query(&dispatcher, &request, cancel).await?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&context)?
    } else {
        serde_json::to_string(&context)?
    };
    println!("{output}");

    Ok(())
}
