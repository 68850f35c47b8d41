//! Timelane CLI
//!
//! Headless front end for the Timelane layout engine.
//!
//! `layout` computes a single frame and prints it; `run` serves a
//! line-delimited JSON event loop on stdin/stdout for an embedding
//! renderer.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use timelane_core_layout::{DateValue, ModePreset, ProjectRecord, ViewPreset};
use timelane_engine::{config_paths, Config, Engine};
use timelane_protocol::{EngineOutput, TimelineEvent};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "timelane")]
#[command(author, version, about = "Compute timeline layout frames")]
struct Cli {
    /// Path to a config file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one layout frame and print it as JSON
    Layout {
        /// JSON file with raw project records
        #[arg(short, long)]
        projects: PathBuf,

        /// Anchor date (RFC 3339 or YYYY-MM-DD); defaults to the config
        /// anchor, then to today
        #[arg(short, long)]
        date: Option<String>,

        /// View preset (week, month, year)
        #[arg(long)]
        view: Option<String>,

        /// Mode preset (regular, collapsed)
        #[arg(long)]
        mode: Option<String>,

        /// Container width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Pretty-print the frame
        #[arg(long)]
        pretty: bool,
    },
    /// Read timeline events from stdin, write one frame per line to stdout
    Run {
        /// JSON file with raw project records to preload
        #[arg(short, long)]
        projects: Option<PathBuf>,
    },
    /// Print the config file search paths in priority order
    ConfigPaths,
}

fn load_records(path: &PathBuf) -> Result<Vec<ProjectRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read projects file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse projects file: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}. Using defaults.", e);
            Config::default()
        }),
    };

    let log_level = match config.behavior.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Layout {
            projects,
            date,
            view,
            mode,
            width,
            pretty,
        } => {
            let mut engine = Engine::from_config(&config)?;
            engine.set_projects(&load_records(&projects)?)?;

            // Command-line selections override the config; unknown
            // preset names are rejected here, before any layout runs.
            if let Some(name) = view {
                engine.apply(TimelineEvent::ChangeView {
                    view: ViewPreset::parse(&name)?,
                })?;
            }
            if let Some(name) = mode {
                if ModePreset::parse(&name)? != engine.mode() {
                    engine.apply(TimelineEvent::ToggleCollapse)?;
                }
            }
            if let Some(width) = width {
                engine.apply(TimelineEvent::Resize {
                    width,
                    height: config.viewport.height,
                })?;
            }
            if let Some(text) = date {
                engine.apply(TimelineEvent::NavigateTo {
                    date: DateValue::Calendar(text),
                })?;
            }

            let frame = engine.render();
            let json = if pretty {
                serde_json::to_string_pretty(&frame)?
            } else {
                serde_json::to_string(&frame)?
            };
            println!("{json}");
        }
        Commands::Run { projects } => {
            let mut engine = Engine::from_config(&config)?;
            if let Some(path) = projects {
                engine.set_projects(&load_records(&path)?)?;
            }
            serve(&mut engine)?;
        }
        Commands::ConfigPaths => {
            for path in config_paths() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

/// One frame (or error) line out per event line in. Parse and layout
/// failures are reported on the wire and never kill the loop.
fn serve(engine: &mut Engine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read event line")?;
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<TimelineEvent>(&line) {
            Ok(event) => match engine.apply(event) {
                Ok(frame) => EngineOutput::Frame(frame),
                Err(e) => {
                    warn!("event rejected: {e}");
                    EngineOutput::error(e.to_string())
                }
            },
            Err(e) => {
                warn!("unreadable event line: {e}");
                EngineOutput::error(e.to_string())
            }
        };

        serde_json::to_writer(&mut stdout, &output)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }

    Ok(())
}
