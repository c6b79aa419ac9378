//! Handpad CLI: replay recorded hand frames, simulate gestures, inspect config.
//!
//! Usage:
//!   handpad replay <FRAMES>        Run a recorded frame stream through the core
//!   handpad simulate --scenario    Synthesize a frame stream
//!   handpad config                 Show effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::simulate::Scenario;

mod commands;

#[derive(Parser)]
#[command(
    name = "handpad",
    about = "Turn a webcam view of your hand into a virtual trackpad",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded JSONL frame stream
    Replay {
        /// Path to the frame stream
        frames: PathBuf,

        /// Write fired gestures and state changes to this JSONL file
        #[arg(long)]
        events: Option<PathBuf>,

        /// Screen width (defaults to the app config)
        #[arg(long)]
        screen_width: Option<u32>,

        /// Screen height (defaults to the app config)
        #[arg(long)]
        screen_height: Option<u32>,

        /// Core tuning JSON file
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Pace frames at the recorded rate through the latest-wins slot
        #[arg(long)]
        realtime: bool,
    },

    /// Synthesize a gesture scenario
    Simulate {
        /// Scenario to synthesize
        #[arg(long, value_enum, default_value = "tap")]
        scenario: Scenario,

        /// Number of frames
        #[arg(long, default_value = "60")]
        frames: usize,

        /// Write the frame stream here instead of running it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Core tuning JSON file
        #[arg(long)]
        tuning: Option<PathBuf>,
    },

    /// Show the effective app config and default core tuning
    Config {
        /// Save the app config to its default location
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = handpad_common::config::AppConfig::load();
    let mut logging = app.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    handpad_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Replay {
            frames,
            events,
            screen_width,
            screen_height,
            tuning,
            realtime,
        } => {
            let options = commands::replay::ReplayOptions {
                frames,
                events,
                screen_width,
                screen_height,
                tuning,
                realtime,
            };
            commands::replay::run(&app, options).await
        }
        Commands::Simulate {
            scenario,
            frames,
            output,
            tuning,
        } => commands::simulate::run(&app, scenario, frames, output, tuning),
        Commands::Config { write } => commands::config::run(&app, write),
    }
}
