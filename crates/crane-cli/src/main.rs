//! `crane-cli` – command line entry point for the crane stack.
//!
//! This binary:
//!
//! 1. Loads `~/.crane/config.toml` (or `--config <path>`), falling back to
//!    defaults, then applies `CRANE_*` environment overrides.
//! 2. `crane serve` runs the cockpit WebSocket server until **Ctrl-C**.
//! 3. `crane simulate` runs the closed-loop controller offline and writes its
//!    tracking log as JSON lines.
//! 4. `crane config` prints the effective configuration, optionally saving it.

mod config;
mod simulate;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crane_cockpit::CockpitServer;
use crane_runtime::init_tracing;
use crane_types::CraneError;
use thiserror::Error;
use tracing::{error, info, warn};

use config::{Config, ConfigError};
use simulate::SimulateArgs;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Crane(#[from] CraneError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("time step must be a positive number of seconds, got {0}")]
    InvalidStep(f64),
}

#[derive(Debug, Parser)]
#[command(name = "crane", version, about = "Crane manipulator kinematics, planning and control")]
struct Cli {
    /// Config file to use instead of ~/.crane/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve crane sessions over WebSocket.
    Serve {
        /// Listening port; overrides the configured one.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the control simulator offline for a base move.
    Simulate(SimulateArgs),
    /// Print the effective configuration as TOML.
    Config {
        /// Also write it to the config file.
        #[arg(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Spans are flushed to the exporter when the guard drops.
    let _tracing = init_tracing("crane");

    let result = tokio::runtime::Runtime::new()
        .map_err(AppError::from)
        .and_then(|rt| rt.block_on(run(cli)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "crane failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = match config::load_from(&path)? {
        Some(cfg) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        None => {
            info!(path = %path.display(), "no config file, using defaults");
            Config::default()
        }
    };
    config::apply_env_overrides(&mut cfg);

    match cli.command {
        Command::Serve { port } => serve(&cfg, port.unwrap_or(cfg.port)).await,
        Command::Simulate(args) => {
            let report = match &args.output {
                Some(out) => {
                    let mut file = BufWriter::new(File::create(out)?);
                    simulate::run(&args, &cfg, &mut file)?
                }
                None => simulate::run(&args, &cfg, &mut io::stdout().lock())?,
            };
            info!(steps = report.steps, final_error = report.final_error, "tracking log written");
            Ok(())
        }
        Command::Config { save } => {
            let raw = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(raw.as_bytes())?;
            if save {
                config::save_to(&cfg, &path)?;
                info!(path = %path.display(), "config saved");
            }
            Ok(())
        }
    }
}

async fn serve(cfg: &Config, port: u16) -> Result<(), AppError> {
    let server = CockpitServer::new(cfg.session_settings()).with_port(port);
    tokio::select! {
        result = server.run() => result?,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        },
    }
    Ok(())
}
