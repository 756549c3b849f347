use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use et_updater::siri::{Fetcher, decode};
use et_updater::updater::{EstimatedTimetableSource, PollResult, UpdaterConfig};

#[derive(Parser)]
#[command(name = "et-updater")]
#[command(about = "Poll a SIRI Lite estimated-timetable feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and report each accepted snapshot
    Poll {
        /// JSON updater configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Feed URL, overriding the url in --config
        #[arg(long, env = "ET_URL")]
        url: Option<String>,

        /// Feed identifier handed to consumers
        #[arg(long, env = "ET_FEED_ID")]
        feed_id: Option<String>,

        /// Seconds between polls
        #[arg(long, env = "ET_POLL_INTERVAL_SECS")]
        interval_secs: Option<u64>,

        /// HTTP request timeout in seconds
        #[arg(long, env = "ET_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        /// Poll once and exit
        #[arg(long)]
        once: bool,
    },
    /// Decode a captured feed document and print it as JSON
    Decode {
        /// Path to a SIRI Lite estimated-timetable document
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poll {
            config,
            url,
            feed_id,
            interval_secs,
            timeout_secs,
            once,
        } => {
            let file = config.map(std::fs::read_to_string).transpose()?;
            let overrides = Overrides {
                url,
                feed_id,
                interval_secs,
                timeout_secs,
            };
            let updater_config = resolve_config(file.as_deref(), overrides)?;
            run_poll(updater_config, once).await
        }
        Commands::Decode { file } => {
            let bytes = std::fs::read(&file)?;
            let delivery = decode(&bytes)?;
            info!(
                file = %file.display(),
                journeys = delivery.journey_count(),
                calls = delivery.call_count(),
                "Decoded ET data"
            );
            println!("{}", serde_json::to_string_pretty(&delivery)?);
            Ok(())
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Default)]
struct Overrides {
    url: Option<String>,
    feed_id: Option<String>,
    interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

/// Merge the optional JSON config file with command-line overrides.
fn resolve_config(file: Option<&str>, overrides: Overrides) -> Result<UpdaterConfig, Box<dyn Error>> {
    let mut raw = match file {
        Some(json) => serde_json::from_str::<serde_json::Value>(json)?,
        None => serde_json::json!({}),
    };
    if let Some(object) = raw.as_object_mut() {
        let mut set = |key: &str, value: Option<serde_json::Value>| {
            if let Some(value) = value {
                object.insert(key.to_string(), value);
            }
        };
        set("url", overrides.url.map(Into::into));
        set("feedId", overrides.feed_id.map(Into::into));
        set("pollIntervalSecs", overrides.interval_secs.map(Into::into));
        set("timeoutSecs", overrides.timeout_secs.map(Into::into));
    }
    Ok(UpdaterConfig::from_json(raw)?)
}

async fn run_poll(config: UpdaterConfig, once: bool) -> Result<(), Box<dyn Error>> {
    let poll_interval = config.poll_interval;
    let mut source = EstimatedTimetableSource::from_config(config)?;
    info!(
        %source,
        feed_id = source.feed_id().unwrap_or(""),
        interval_secs = poll_interval.as_secs(),
        "Starting ET updater"
    );

    let shutdown = tokio::signal::ctrl_c();
    if once {
        tokio::select! {
            result = source.poll() => report(result)?,
            _ = shutdown => {}
        }
    } else {
        poll_until(&mut source, poll_interval, shutdown).await?;
    }

    info!("Shutting down");
    Ok(())
}

/// Poll on every tick until `shutdown` completes.
///
/// `shutdown` is raced against the wait for the next tick and against the
/// poll itself, so an in-flight fetch is abandoned as soon as it fires.
async fn poll_until<F: Fetcher>(
    source: &mut EstimatedTimetableSource<F>,
    period: Duration,
    shutdown: impl Future,
) -> Result<(), serde_json::Error> {
    tokio::pin!(shutdown);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => return Ok(()),
        }
        tokio::select! {
            result = source.poll() => report(result)?,
            _ = &mut shutdown => return Ok(()),
        }
    }
}

/// Print a one-line summary of an accepted snapshot to stdout.
fn report(result: PollResult) -> Result<(), serde_json::Error> {
    match result {
        PollResult::Accepted {
            deliveries,
            mode,
            response_timestamp,
            producer_ref,
        } => {
            let journeys: usize = deliveries
                .iter()
                .flat_map(|d| &d.version_frames)
                .map(|f| f.vehicle_journeys.len())
                .sum();
            let summary = serde_json::json!({
                "mode": mode,
                "responseTimestamp": response_timestamp,
                "producerRef": producer_ref,
                "journeys": journeys,
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
        PollResult::NoUpdate(reason) if reason.is_failure() => warn!(%reason, "No update"),
        PollResult::NoUpdate(reason) => info!(%reason, "No update"),
    }
    Ok(())
}
