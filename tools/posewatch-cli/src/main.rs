//! PoseWatch CLI: replay pose streams through the action pipeline.
//!
//! Usage:
//!   posewatch replay <POSES> --results <RESULTS>   Count actions in a recorded session
//!   posewatch encode <POSES>                       Print one window's feature tensor
//!   posewatch config                               Show and validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use posewatch_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "posewatch",
    about = "Count debounced body actions in keypoint streams",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded pose stream through the pipeline
    Replay {
        /// Pose stream (JSONL)
        poses: PathBuf,

        /// Pre-computed classification results, one per full window (JSONL)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Observations per classification window
        #[arg(long)]
        window: Option<usize>,

        /// Minimum seconds between counted events
        #[arg(long)]
        cooldown_secs: Option<f64>,

        /// Activation threshold in percent
        #[arg(long)]
        threshold: Option<f64>,

        /// Label counted as the target action
        #[arg(long)]
        target: Option<String>,

        /// Print every published state as a JSON line
        #[arg(long)]
        json: bool,

        /// Pace the replay by observation timestamps
        #[arg(long)]
        realtime: bool,

        /// Re-record consumed observations to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Print the feature tensor of one window as JSON
    Encode {
        /// Pose stream (JSONL)
        poses: PathBuf,

        /// Observations per window
        #[arg(long)]
        window: Option<usize>,

        /// Index of the first observation in the window
        #[arg(long, default_value = "0")]
        frame_offset: usize,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        // `config --write-default` may target a file that does not exist yet
        Some(path) if !path.exists() && matches!(cli.command, Commands::Config { .. }) => {
            AppConfig::default()
        }
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    posewatch_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Replay {
            poses,
            results,
            window,
            cooldown_secs,
            threshold,
            target,
            json,
            realtime,
            record,
        } => {
            if let Some(window) = window {
                config.pipeline.window_size = window;
            }
            if let Some(cooldown_secs) = cooldown_secs {
                config.pipeline.cooldown_secs = cooldown_secs;
            }
            if let Some(threshold) = threshold {
                config.pipeline.activation_threshold_pct = threshold;
            }
            if let Some(target) = target {
                config.pipeline.target_label = target;
            }
            commands::replay::run(
                config,
                commands::replay::ReplayOptions {
                    poses,
                    results,
                    json,
                    realtime,
                    record,
                },
            )
            .await
        }
        Commands::Encode {
            poses,
            window,
            frame_offset,
        } => {
            if let Some(window) = window {
                config.pipeline.window_size = window;
            }
            commands::encode::run(&config, poses, frame_offset)
        }
        Commands::Config { write_default } => {
            commands::config::run(&config, cli.config, write_default)
        }
    }
}
