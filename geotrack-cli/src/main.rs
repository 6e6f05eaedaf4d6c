//! Geotrack CLI - Command-line interface
//!
//! Drives the geotrack position-update scheduler against a simulated device
//! and exposes the distance and configuration helpers.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::simulate::SimulateArgs;

#[derive(Parser)]
#[command(name = "geotrack", version, about = "Adaptive position-update scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tracking session against a simulated moving device
    Simulate {
        /// Config file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// How long to run before stopping
        #[arg(long, default_value = "60")]
        duration_secs: u64,

        /// Device speed in meters per second
        #[arg(long, default_value = "5.0")]
        speed_mps: f64,

        /// Device heading in degrees (0 = north, 90 = east)
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        heading: f64,

        /// Start latitude in decimal degrees
        #[arg(long, default_value = "25.0330", allow_negative_numbers = true)]
        start_lat: f64,

        /// Start longitude in decimal degrees
        #[arg(long, default_value = "121.5654", allow_negative_numbers = true)]
        start_lon: f64,

        /// Override the periodic refresh interval
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print updates and the final summary as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the great-circle distance and bearing between two points
    Distance {
        /// Latitude of the first point
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        /// Longitude of the first point
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        /// Latitude of the second point
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        /// Longitude of the second point
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
    },

    /// Print the effective tracking options as INI
    Config {
        /// Config file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only print the config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            duration_secs,
            speed_mps,
            heading,
            start_lat,
            start_lon,
            interval_ms,
            json,
        } => commands::simulate::run(SimulateArgs {
            config,
            duration_secs,
            speed_mps,
            heading,
            start_lat,
            start_lon,
            interval_ms,
            json,
        }),
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => commands::distance::run(lat1, lon1, lat2, lon2),
        Commands::Config { config, path } => commands::config::run(config, path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
