//! ATEM Surface - standalone runner
//!
//! Runs one switcher instance against the console device and the logging host. Useful for trying
//! configurations and watching which commands, variables and feedback checks an input produces.

use anyhow::{Context, Result};
use atem_surface::config::ConfigWatcher;
use atem_surface::device::{ConsoleSwitcher, DeviceEvent};
use atem_surface::host::LoggingHost;
use atem_surface::models::{all_models, get_model_spec, model_choices, ModelId};
use atem_surface::sources::{list_sources, SourceContext};
use atem_surface::state::AtemState;
use atem_surface::AtemInstance;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ATEM Surface - Blackmagic ATEM switchers as buttons, feedbacks and variables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "atem.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List known switcher models
    #[arg(long)]
    list_models: bool,

    /// Print the capability descriptor of one model id as YAML
    #[arg(long, value_name = "MODEL_ID")]
    show_model: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_models {
        for (id, label) in model_choices() {
            println!("{:>3}  {}", id, label);
        }
        return Ok(());
    }

    if let Some(id) = args.show_model {
        let spec = get_model_spec(ModelId(id))
            .with_context(|| format!("Unknown model id {} ({} known)", id, all_models().len()))?;
        print!("{}", serde_yaml::to_string(spec)?);
        println!("# Sources");
        for source in list_sources(spec, None, SourceContext::All) {
            println!("{:>6}  {:<5} {}", source.id, source.short_name, source.long_name);
        }
        return Ok(());
    }

    info!("Starting ATEM Surface...");
    info!("Configuration file: {}", args.config);

    let (mut config_watcher, config) = ConfigWatcher::new(args.config.clone()).await?;
    info!("Configuration loaded successfully with hot-reload enabled");

    let host = Arc::new(LoggingHost::new());
    let device = Arc::new(ConsoleSwitcher::new(config.host.clone()));
    let model = get_model_spec(config.model_id);
    let instance = AtemInstance::new(host, device, config);

    let (event_tx, event_rx) = mpsc::channel(64);
    let (config_tx, config_rx) = mpsc::channel(4);

    tokio::spawn(async move {
        while let Some(config) = config_watcher.next_config().await {
            if config_tx.send(config).await.is_err() {
                break;
            }
        }
    });

    // The console device has no protocol client; seed a default state so values are visible
    match model {
        Some(model) => {
            event_tx.send(DeviceEvent::Connected).await?;
            event_tx
                .send(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))))
                .await?;
        }
        None => warn!("Auto-detect needs a device; no state will be synced"),
    }

    instance.run(event_rx, config_rx, shutdown_signal()).await;
    drop(event_tx);

    info!("ATEM Surface shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
