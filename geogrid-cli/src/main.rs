use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use config::Config;
use error::CliError;

#[derive(Parser)]
#[command(name = "geogrid")]
#[command(about = "GeoGrid - screen-space grid aggregation for map viewports")]
#[command(version)]
#[command(long_about = "
GeoGrid partitions a map viewport into square pixel cells, bins geo-located
points into them and emits the cell rectangles and per-cell glyphs a map
surface would draw, in the order and at the offsets it would draw them.

Examples:
  geogrid draw --points shops.json --center 48.85,2.35 --zoom 12 --size 1280x800
  geogrid draw --points shops.json --bounds 48.8,2.2,48.9,2.5 --size 800x600 --out grid.json
  geogrid draw --points shops.json --center 0,0 --then 5,5 --then 5,5,4
  geogrid config --example > geogrid.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run draw cycles over a point set and write the emitted render commands
    Draw {
        /// Point set (JSON array of {id, location})
        #[arg(short, long, required = true)]
        points: PathBuf,

        /// Output file (JSON); stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Viewport center as 'lat,lng'
        #[arg(long, conflicts_with = "bounds", allow_hyphen_values = true)]
        center: Option<String>,

        /// Zoom level used with --center
        #[arg(long, default_value = "0")]
        zoom: f64,

        /// Viewport bounds as 'south,west,north,east'; the viewport is fitted around them
        #[arg(long, allow_hyphen_values = true)]
        bounds: Option<String>,

        /// Viewport size in pixels as 'WIDTHxHEIGHT'
        #[arg(long, default_value = "1024x768")]
        size: String,

        /// Follow-up viewport as 'lat,lng' (move) or 'lat,lng,zoom' (zoom); repeatable
        #[arg(long, allow_hyphen_values = true)]
        then: Vec<String>,

        /// Override the configured cell size (pixels)
        #[arg(long)]
        cell_size: Option<f64>,

        /// Override the configured emission delay (milliseconds)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Label glyphs with their point count instead of the default pin
        #[arg(long)]
        count_badges: bool,
    },

    /// Show or write the configuration
    Config {
        /// Print an example geogrid.toml
        #[arg(long)]
        example: bool,

        /// Write the effective configuration to this file
        #[arg(long, conflicts_with = "example")]
        save: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Draw {
            points,
            out,
            center,
            zoom,
            bounds,
            size,
            then,
            cell_size,
            delay_ms,
            count_badges,
        } => {
            // one event loop, no worker threads: emissions interleave but never overlap
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("Failed to start event loop")?;

            runtime.block_on(commands::draw::execute(
                &config,
                commands::draw::DrawArgs {
                    points,
                    out,
                    center,
                    zoom,
                    bounds,
                    size,
                    then,
                    cell_size,
                    delay_ms,
                    count_badges,
                },
            ))?;
        }

        Commands::Config { example, save } => {
            commands::config::execute(&config, example, save)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet)?;

    if let Err(err) = run(cli) {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            error::print_error_and_exit(cli_err);
        }
        return Err(err);
    }

    Ok(())
}
