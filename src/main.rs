use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cortex_engine::GameEngine;
use cortex_settings::CortexSettings;
use cortex_store::Database;
use cortex_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "cortex", version, about = "Cognitive-training game server")]
struct Cli {
    /// Settings file (default: ~/.cortex/settings.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the effective settings as JSON.
    Config,
}

fn load(cli: &Cli) -> anyhow::Result<CortexSettings> {
    let path = cli.config.clone().unwrap_or_else(cortex_settings::settings_path);
    cortex_settings::load_settings_from_path(&path)
        .with_context(|| format!("loading settings from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load(&cli)?;

    let (host, port, db) = match cli.command {
        Some(Command::Config) => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            return Ok(());
        }
        Some(Command::Serve { host, port, db }) => (host, port, db),
        None => (None, None, None),
    };
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    let db_path = db.unwrap_or_else(|| cortex_settings::database_path(&settings));

    let telemetry = init_telemetry(TelemetryConfig {
        log_level: settings.logging.log_level(),
        module_levels: settings.logging.module_directives(),
        json: settings.logging.json,
    });
    let metrics = telemetry.metrics();

    let db = Database::open(&db_path).with_context(|| format!("opening database {}", db_path.display()))?;
    let engine = Arc::new(GameEngine::new(db, settings.game_config(), Arc::clone(&metrics)));

    let config = cortex_server::ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };
    let handle = cortex_server::start(config, engine, metrics)
        .await
        .context("starting server")?;
    tracing::info!(port = handle.port, db = %db_path.display(), "cortex ready");

    tokio::signal::ctrl_c().await.context("listening for ctrl-c")?;
    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
