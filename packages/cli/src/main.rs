#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the air quality toolkit.
//!
//! ```text
//! air_quality project 180000 665000
//! air_quality nearby --city "Tel Aviv" [--radius 20] [--geojson]
//! air_quality seasons --pollutant O3
//! air_quality pollutants O3 NOx PM2.5
//! air_quality monthly --pollutant O3 --stations A,B [--from ..] [--to ..] [--max]
//! air_quality config
//! ```
//!
//! Running with no subcommand enters interactive mode. The dataset layout
//! comes from `--config` (or `AIR_QUALITY_CONFIG`) and falls back to the
//! built-in defaults.

mod commands;
mod format;
mod interactive;

use std::path::PathBuf;

use air_quality_data::{DataStore, DatasetConfig};
use air_quality_geo_models::Pollutant;
use air_quality_stats_models::PValueMethod;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "air_quality",
    about = "Station proximity search and statistical comparison of air quality data"
)]
struct Cli {
    /// Dataset config file (TOML)
    #[arg(long, global = true, env = "AIR_QUALITY_CONFIG")]
    config: Option<PathBuf>,
    /// Override the data directory from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an ITM (EPSG:2039) coordinate to WGS84
    Project {
        /// Easting in metres
        x: f64,
        /// Northing in metres
        y: f64,
    },
    /// List all stations with usable coordinates
    Stations,
    /// List stations within a radius of a city, nearest first
    Nearby {
        /// City name as it appears in the city table
        #[arg(long)]
        city: String,
        /// Search radius in km (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
        /// Print a `GeoJSON` feature collection of the city and all stations
        #[arg(long)]
        geojson: bool,
    },
    /// Compare a pollutant's readings between every pair of seasons
    Seasons {
        /// Pollutant column (e.g. O3, PM2.5)
        #[arg(long)]
        pollutant: Pollutant,
        /// p-value method: auto, exact or asymptotic
        #[arg(long, default_value = "auto")]
        method: PValueMethod,
    },
    /// Compare every pair of the given pollutants
    Pollutants {
        /// Two or more pollutants
        #[arg(required = true, num_args = 2..)]
        pollutants: Vec<Pollutant>,
        /// p-value method: auto, exact or asymptotic
        #[arg(long, default_value = "auto")]
        method: PValueMethod,
    },
    /// Monthly mean (or max) per station for one pollutant
    Monthly {
        #[arg(long)]
        pollutant: Pollutant,
        /// Comma-separated station names
        #[arg(long, value_delimiter = ',', required = true)]
        stations: Vec<String>,
        /// Start date (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<String>,
        /// Aggregate with the monthly maximum instead of the mean
        #[arg(long)]
        max: bool,
    },
    /// Mean reading by hour of day and weekday
    Profile {
        #[arg(long)]
        pollutant: Pollutant,
    },
    /// Correlation matrix of min-max scaled pollutant columns
    Correlations {
        /// Comma-separated pollutants (defaults to every available one)
        #[arg(long)]
        pollutants: Option<String>,
    },
    /// Print the effective dataset configuration as TOML
    Config,
}

fn load_config(cli: &Cli) -> Result<DatasetConfig, air_quality_data::DataError> {
    let mut config = match &cli.config {
        Some(path) => DatasetConfig::from_path(path)?,
        None => {
            log::debug!("No config file given, using defaults");
            DatasetConfig::default()
        }
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let store = DataStore::new(load_config(&cli)?);
    let json = cli.json;

    let Some(command) = cli.command else {
        return interactive::run(&store);
    };

    match command {
        Commands::Project { x, y } => commands::project(x, y, json)?,
        Commands::Stations => commands::stations(&store, json)?,
        Commands::Nearby {
            city,
            radius,
            geojson,
        } => commands::nearby_stations(&store, &city, radius, geojson, json)?,
        Commands::Seasons { pollutant, method } => {
            commands::seasons(&store, pollutant, method, json)?;
        }
        Commands::Pollutants { pollutants, method } => {
            commands::pollutants(&store, &pollutants, method, json)?;
        }
        Commands::Monthly {
            pollutant,
            stations,
            from,
            to,
            max,
        } => {
            let params = commands::monthly_params(stations, from, to, max)?;
            commands::monthly(&store, pollutant, &params, json)?;
        }
        Commands::Profile { pollutant } => commands::profile(&store, pollutant, json)?,
        Commands::Correlations { pollutants } => {
            let pollutants = pollutants
                .as_deref()
                .map(commands::parse_pollutant_list)
                .transpose()?
                .unwrap_or_default();
            commands::correlations(&store, &pollutants, json)?;
        }
        Commands::Config => commands::config(&store)?,
    }

    Ok(())
}
