//! Empire Progression - Engine Host

use std::path::PathBuf;

use empire_core::prelude::*;
use empire_server::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting empire engine host");

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load server config: {e}");
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to start engine: {e}");
            std::process::exit(1);
        }
    };

    let (handle, join) = empire_server::spawn(engine, &config);
    let logger = tokio::spawn(empire_server::log_events(handle.subscribe()));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to wait for ctrl-c: {e}");
    }
    tracing::info!("Shutting down");

    match handle.shutdown().await {
        Ok(save) => {
            if let Some(path) = &config.save_path {
                if let Err(e) = save.save(path) {
                    tracing::error!("Failed to write save: {e}");
                }
            }
        }
        Err(e) => tracing::error!("Engine stopped early: {e}"),
    }
    drop(handle);
    let _ = join.await;
    logger.abort();
}

fn build_engine(config: &ServerConfig) -> Result<Engine> {
    let ruleset = match &config.ruleset {
        Some(path) => Ruleset::load(path)?,
        None => Ruleset::standard(),
    };
    match &config.save_path {
        Some(path) if path.exists() => {
            Engine::from_save(SaveGame::load(path)?, ruleset, config.engine.clone())
        }
        _ => Engine::new(ruleset, config.engine.clone()),
    }
}
