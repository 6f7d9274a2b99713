#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the road risk map.
//!
//! ```text
//! road_risk status
//! road_risk heatmap [--grid-size 0.1] [--severity high]
//! road_risk predict <LAT> <LON>
//! ```
//!
//! Running `road_risk` with no subcommand enters an interactive session
//! that behaves like clicking around the map.
//!
//! Uses `indicatif-log-bridge` (via [`road_risk_cli_utils::init_logger`])
//! so log lines and spinners never fight for the terminal.

mod interactive;
mod render;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use road_risk_cli_utils::{MultiProgress, Spinner};
use road_risk_gateway::{GatewayConfig, HttpGateway, RiskGateway};
use road_risk_map::{MapConfig, MapEvent, RiskMap};
use road_risk_models::{GridSize, SeverityBucket};

#[derive(Parser)]
#[command(name = "road_risk", about = "Explore road accident risk from the terminal")]
struct Cli {
    /// Prediction API base URL (overrides `ROAD_RISK_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Heatmap clustering cell size in degrees (overrides `ROAD_RISK_GRID_SIZE`)
    #[arg(long, global = true, value_parser = parse_grid_size)]
    grid_size: Option<GridSize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the prediction API is reachable
    Status,
    /// Print the clustered accident heatmap
    Heatmap {
        /// Severity bucket to show (all, low, medium, high)
        #[arg(long, default_value = "all", value_parser = parse_severity)]
        severity: SeverityBucket,
    },
    /// Predict accident risk at a location
    Predict {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

fn parse_grid_size(value: &str) -> Result<GridSize, String> {
    let degrees: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    GridSize::new(degrees).map_err(|e| e.to_string())
}

fn parse_severity(value: &str) -> Result<SeverityBucket, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not one of all, low, medium, high"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = road_risk_cli_utils::init_logger();
    let cli = Cli::parse();

    let gateway_config = cli
        .api_url
        .map_or_else(GatewayConfig::from_env, GatewayConfig::new);
    let mut map_config = MapConfig::from_env();
    if let Some(grid_size) = cli.grid_size {
        map_config.grid_size = grid_size;
    }

    let http = HttpGateway::new(gateway_config);
    log::debug!(
        "Using prediction API at {} (grid size {})",
        http.base_url(),
        map_config.grid_size
    );
    let gateway: Arc<dyn RiskGateway> = Arc::new(http);

    let Some(command) = cli.command else {
        let mut map = RiskMap::new(gateway, &map_config);
        return interactive::run(&mut map, &multi).await;
    };

    match command {
        Commands::Status => {
            let spinner = Spinner::start(&multi, "Contacting prediction API...");
            match gateway.status().await {
                Ok(message) => {
                    spinner.clear();
                    println!("{message}");
                }
                Err(e) => {
                    spinner.clear();
                    return Err(e.user_message().into());
                }
            }
        }
        Commands::Heatmap { severity } => {
            let mut map = RiskMap::new(gateway, &map_config);
            map.set_severity_bucket(severity);
            load_heatmap(&mut map, &multi).await?;
            print!("{}", render::markers(&map.scene()));
        }
        Commands::Predict { lat, lon } => {
            let mut map = RiskMap::new(gateway, &map_config);
            map.click(lat, lon)?;
            await_prediction(&mut map, &multi).await?;
            print!("{}", render::view(&map.view()));
        }
    }

    Ok(())
}

/// Loads the heatmap at the map's grid size behind a spinner.
async fn load_heatmap(map: &mut RiskMap, multi: &MultiProgress) -> Result<(), String> {
    let spinner = Spinner::start(multi, road_risk_map::view::HEATMAP_LOADING_TEXT);
    map.load_heatmap(map.grid_size());

    for event in map.settle().await {
        if let MapEvent::HeatmapFailed { message } = event {
            spinner.clear();
            return Err(message);
        }
    }

    spinner.clear();
    Ok(())
}

/// Waits behind a spinner for the prediction of the clicked location.
async fn await_prediction(map: &mut RiskMap, multi: &MultiProgress) -> Result<(), String> {
    let message = map.state().coordinate().map_or_else(
        || "Analyzing location risk...".to_string(),
        |coordinate| format!("Analyzing location risk at {coordinate}..."),
    );
    let spinner = Spinner::start(multi, &message);

    for event in map.settle().await {
        if let MapEvent::PredictionFailed { failure, .. } = event {
            spinner.clear();
            return Err(failure.message);
        }
    }

    spinner.clear();
    Ok(())
}
