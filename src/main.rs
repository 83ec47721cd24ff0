use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ohlcv_dl::cli::Args;
use ohlcv_dl::client::JobClient;
use ohlcv_dl::form::FormState;
use ohlcv_dl::poller::{self, JobPoller};
use ohlcv_dl::view::TerminalView;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ohlcv_dl=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let client = JobClient::new(&args.server, args.proxy.as_deref())
        .with_context(|| format!("Invalid server configuration for {}", args.server))?;

    let poll_interval = match args.poll_interval_ms {
        0 => poller::DEFAULT_POLL_INTERVAL,
        ms => Duration::from_millis(ms),
    };

    let mut poller = JobPoller::new(client.clone(), TerminalView::new(), poll_interval);
    *poller.form_mut() = FormState::new(&args.symbol, args.timeframe.as_str(), &args.start, &args.end);

    // First Ctrl-C cancels the tracked job; with nothing tracked it exits.
    let handle = poller.cancel_handle();
    let signals = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !handle.cancel() {
                std::process::exit(130);
            }
        }
    });

    tracing::debug!(server = %args.server, ?poll_interval, "Starting session");

    let outcome = poller.run().await?;
    signals.abort();
    tracing::debug!(phase = ?poller.phase(), "Session finished");
    let download_url = outcome
        .into_result()?
        .ok_or_else(|| anyhow!("Cancelled by user"))?;

    if let Some(output) = args.output {
        let job_id = poller
            .current_job()
            .ok_or_else(|| anyhow!("No job tracked for {}", download_url))?;
        // Ctrl-C during the fetch stops it and removes the partial file.
        let stop = CancellationToken::new();
        let trigger = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });
        let saved = client.save_artifact(job_id, Path::new(&output), &stop).await?;
        println!("Saved {}", saved.display());
    }

    Ok(())
}
