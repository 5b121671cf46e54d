use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use broadcast_recorder::{
    config::Config,
    models::RecordingInfo,
    recording::{FileType, RecordingStore},
    schedule::ScheduleService,
    utils::{clock::SystemClock, time::to_iso_millis},
};

#[derive(Parser)]
#[command(name = "broadcast-recorder")]
#[command(version)]
#[command(about = "Broadcast schedule cache and recording file lifecycle manager")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Save directory (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the programme airing now
    Current,
    /// List programmes that have not yet ended
    Schedule,
    /// Report whether the current programme is already being (or has been) recorded
    Status,
    /// Move a programme's in-progress file to its terminal state and write metadata
    Finalize {
        /// Any instant strictly inside the recorded programme (RFC 3339)
        #[arg(long, value_name = "INSTANT")]
        at: DateTime<Utc>,

        /// When capture actually started
        #[arg(long, value_name = "INSTANT")]
        recorded_from: Option<DateTime<Utc>>,

        /// When capture actually stopped
        #[arg(long, value_name = "INSTANT")]
        recorded_until: Option<DateTime<Utc>>,

        /// Mark the recording as failed instead of successful
        #[arg(long)]
        failed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("broadcast_recorder={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    if let Some(save_dir) = cli.save_dir {
        config.storage.save_dir = save_dir;
    }

    let clock = Arc::new(SystemClock);
    let schedule = ScheduleService::from_config(&config, clock.clone())?;
    let store = RecordingStore::from_config(&config.storage, clock);

    match cli.command {
        Command::Current => match schedule.current_programme().await? {
            Some(programme) => println!("{}", serde_json::to_string_pretty(&programme)?),
            None => warn!("No programme is airing right now"),
        },
        Command::Schedule => {
            for programme in schedule.upcoming().await? {
                println!(
                    "{}  {}  {}{}",
                    to_iso_millis(programme.start_date),
                    to_iso_millis(programme.end_date),
                    programme.title,
                    programme
                        .episode_title()
                        .map(|s| format!(" - {s}"))
                        .unwrap_or_default()
                );
            }
        }
        Command::Status => {
            let programme = schedule
                .current_programme()
                .await?
                .ok_or_else(|| anyhow!("No programme is airing right now"))?;
            let exists = store.recording_exists(&programme).await;
            println!(
                "{}: {}",
                store.paths().base_path(&programme).display(),
                if exists { "recorded" } else { "not recorded" }
            );
        }
        Command::Finalize {
            at,
            recorded_from,
            recorded_until,
            failed,
        } => {
            let programme = schedule
                .programme_at(at)
                .await?
                .ok_or_else(|| anyhow!("No programme airs at {}", to_iso_millis(at)))?;
            store.ensure_save_dir().await?;

            let (moved, file_type) = if failed {
                (store.mark_failed(&programme).await, FileType::Failed)
            } else {
                (store.mark_successful(&programme).await, FileType::Successful)
            };
            let path = moved.ok_or_else(|| {
                anyhow!(
                    "Could not finalize '{}'",
                    store.in_progress_path(&programme).display()
                )
            })?;
            info!("Recording finalized at {}", path.display());

            let recording = RecordingInfo {
                start: recorded_from,
                end: recorded_until,
                ..Default::default()
            };
            let metadata_path = store
                .write_metadata(&programme, file_type, &recording)
                .await?;
            println!("{}", metadata_path.display());
        }
    }

    Ok(())
}
