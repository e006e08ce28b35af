mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Client, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries results and downloaded bytes; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if cli.stats {
        config.rate.statistics = true;
    }
    let client = Client::from_config(config).context("failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = match cli.command {
        Command::Search(cmd) => cmd.run(&client, &cancel).await,
        Command::Count(cmd) => cmd.run(&client, &cancel).await,
        Command::Download(cmd) => cmd.run(&client, &cancel).await,
    };

    if cli.stats {
        print_stats(&client);
    }
    result
}

fn print_stats(client: &Client) {
    let cache = client.cache().stats();
    eprintln!(
        "cache: {} entries ({} live), {} hits, {} misses",
        cache.total_entries, cache.live_entries, cache.hits, cache.misses
    );
    for (destination, class, stats) in client.limiter().all_stats() {
        eprintln!(
            "limiter: {destination} {class}: {} requests, {:?} total wait, {:?} average",
            stats.requests,
            stats.total_wait,
            stats.average_wait()
        );
    }
}
