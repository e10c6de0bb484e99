//! Empire Progression - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use empire_tools::simulate::{run_simulation, SimulateOptions};

#[derive(Parser)]
#[command(name = "empire-tools")]
#[command(about = "Development tools for the empire progression engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a ruleset file
    Validate {
        /// Path to the ruleset
        #[arg(default_value = "assets/data/ruleset.ron")]
        path: PathBuf,
    },

    /// Run a headless simulation and print a JSON summary
    Simulate {
        /// Ruleset file (built-in standard ruleset if omitted)
        #[arg(long)]
        ruleset: Option<PathBuf>,

        /// Engine config file in RON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Continue from a save instead of a new game
        #[arg(long)]
        load: Option<PathBuf>,

        /// RON list of commands applied before ticking
        #[arg(long)]
        script: Option<PathBuf>,

        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u32,

        /// Seconds per tick
        #[arg(long, default_value = "1")]
        dt: u32,

        /// Write the final state to this save file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Print a save file as JSON
    Inspect {
        /// Save file path
        path: PathBuf,
    },
}

fn main() {
    // Logs go to stderr, stdout carries JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating ruleset: {}", path.display());
            match empire_tools::validate::validate_ruleset_file(&path) {
                Ok(summary) => tracing::info!(
                    units = summary.units,
                    buildings = summary.buildings,
                    technologies = summary.technologies,
                    advantages = summary.advantages,
                    "Validation passed"
                ),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Simulate {
            ruleset,
            config,
            load,
            script,
            ticks,
            dt,
            save,
        } => {
            let options = SimulateOptions {
                ruleset,
                config,
                load,
                script,
                ticks,
                dt,
                save,
            };
            match run_simulation(&options).map(|summary| serde_json::to_string_pretty(&summary)) {
                Ok(Ok(json)) => println!("{json}"),
                Ok(Err(e)) => {
                    tracing::error!("Failed to render summary: {e}");
                    std::process::exit(1);
                }
                Err(e) => {
                    tracing::error!("Simulation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Inspect { path } => match empire_tools::inspect::inspect_save(&path) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("Inspect failed: {e}");
                std::process::exit(1);
            }
        },
    }
}
