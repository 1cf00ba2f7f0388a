#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the shape grid editor.
//!
//! Scripts drive a placement session line by line and print every resulting
//! event, so layouts can be built, inspected and exchanged without a UI.

mod board;
mod config;
mod layout_transfer;
mod script;

use std::{
    fs, io,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shape_grid_core::{Command, Event};
use shape_grid_session::{apply, PlacementSession};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::EditorConfig, layout_transfer::LayoutSnapshot, script::ScriptRunner};

#[derive(Debug, Parser)]
#[command(name = "shape-grid", version, about = "Place polyomino shapes on a fixed grid")]
struct Cli {
    /// TOML file overriding the grid size, cell geometry and shape palette.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the shapes available for placement.
    Catalog,
    /// Run an editor script and print what happens.
    Run {
        /// Script file; one command per line.
        script: PathBuf,
    },
    /// Render a layout string produced by `export`.
    Show {
        /// Layout string starting with `grid:v1:`.
        layout: String,
    },
}

/// Entry point for the shape grid command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = EditorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Catalog => print!("{}", board::render_catalog(&config.catalog)),
        Commands::Run { script } => {
            let contents = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script at {}", script.display()))?;
            let mut runner = ScriptRunner::new(&config, wall_clock);
            let stdout = io::stdout();
            runner.run(&contents, &mut stdout.lock())?;
            debug!(
                shapes = runner.session().shapes().len(),
                overlapping = runner.session().overlapping_count(),
                "script finished"
            );
        }
        Commands::Show { layout } => {
            let snapshot = LayoutSnapshot::decode(&layout).context("invalid layout string")?;
            let mut session = PlacementSession::new(snapshot.rows, snapshot.columns);
            let mut events = Vec::new();
            apply(
                &mut session,
                Command::ImportState {
                    grid: snapshot.state.grid,
                    shapes: snapshot.state.shapes,
                },
                &mut events,
            );
            if let Some(Event::ImportRejected { reason }) = events.first() {
                bail!("layout could not be imported: {reason}");
            }
            print!("{}", board::render(&session, config.geometry));
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn wall_clock() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}
