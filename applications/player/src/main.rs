/// Aria Player - headless music player daemon
use anyhow::Context;
use aria_core::storage::{load_json, PLAYBACK_PREFERENCES_KEY, QUEUE_STATE_KEY};
use aria_core::{KeyValueStore, ScrobbleSink};
use aria_player::{Command, HeadlessRenderer, PlayerConfig, PlayerService};
use aria_playback::{PersistedQueue, PlaybackPreferences};
use aria_server_client::ScrobbleClient;
use aria_storage::SqliteKeyValueStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aria-player")]
#[command(about = "Aria headless music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the player, reading commands from stdin
    Run,
    /// Print the persisted queue
    ShowQueue,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries events
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aria_player=info,aria_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Run => run(config).await?,
        Commands::ShowQueue => show_queue(config).await?,
    }

    Ok(())
}

async fn open_store(config: &PlayerConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let pool = aria_storage::create_pool(&config.storage.database_url)
        .await
        .context("failed to open database")?;
    aria_storage::run_migrations(&pool).await?;
    tracing::info!("Database connected");
    Ok(Arc::new(SqliteKeyValueStore::new(pool)))
}

async fn run(config: PlayerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Aria player");

    let store = open_store(&config).await?;

    let scrobbler: Option<Arc<dyn ScrobbleSink>> = match config.scrobble.endpoint() {
        Some(endpoint) => {
            let client = ScrobbleClient::new(endpoint)?;
            tracing::info!(endpoint = %client.endpoint(), "Scrobbling enabled");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("Scrobbling disabled");
            None
        }
    };

    let service = PlayerService::start(
        HeadlessRenderer::new(),
        config.playback.clone(),
        store,
        scrobbler,
    )
    .await;
    let (handle, service_task) = service.spawn();

    // Print events as JSON lines
    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Ok(mut line) = serde_json::to_string(&event) else {
                        continue;
                    };
                    line.push('\n');
                    if stdout.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                    let _ = stdout.flush().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };

        if command.is_query() {
            let status = handle.status().await?;
            println!("{}", serde_json::to_string(&status)?);
            continue;
        }

        let quit = command == Command::Quit;
        handle.send(command).await?;
        if quit {
            break;
        }
    }

    // EOF behaves like quit
    let _ = handle.send(Command::Quit).await;
    drop(handle);
    service_task.await?;
    printer.await?;

    tracing::info!("Aria player stopped");
    Ok(())
}

async fn show_queue(config: PlayerConfig) -> anyhow::Result<()> {
    let store = open_store(&config).await?;

    let queue: PersistedQueue = load_json(store.as_ref(), QUEUE_STATE_KEY)
        .await?
        .unwrap_or_default();
    let preferences: PlaybackPreferences = load_json(store.as_ref(), PLAYBACK_PREFERENCES_KEY)
        .await?
        .unwrap_or_default();

    if queue.items.is_empty() {
        println!("Queue is empty");
    } else {
        for (index, track) in queue.items.iter().enumerate() {
            let marker = if index == queue.current { '>' } else { ' ' };
            println!(
                "{} {:>3}. {} - {}",
                marker, index, track.artist.name, track.title
            );
        }
    }
    println!(
        "repeat: {:?}, shuffle: {}",
        preferences.repeat_mode, preferences.shuffle_enabled
    );

    Ok(())
}
