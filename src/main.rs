use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use roadrouter_core::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::AppConfig;

/// Road route optimizer over CSV map data
#[derive(Parser, Debug)]
#[command(name = "roadrouter", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file with [engine] and [map] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding nodes.csv and edges.csv, used when no config file is given
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate a single route
    Route(RouteArgs),
    /// Calculate every request in a JSON lines file and report statistics
    Batch {
        /// One `{"source", "destination", "via", "options"}` object per line
        requests: PathBuf,
    },
    /// Closest network node to a point
    Nearest {
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        at: Coordinate,
    },
    /// Network nodes within a radius of a point, closest first
    Radius {
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        at: Coordinate,
        /// Kilometers
        radius: f64,
    },
    /// Node and edge counts of the loaded network
    GraphStats,
}

#[derive(Args, Debug)]
struct RouteArgs {
    /// Start point as `lat,lng`
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    from: Coordinate,

    /// End point as `lat,lng`
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    to: Coordinate,

    /// Intermediate stop as `lat,lng`, repeatable
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    via: Vec<Coordinate>,

    #[arg(long, default_value_t = OptimizationCriteria::Distance)]
    criteria: OptimizationCriteria,

    #[arg(long)]
    avoid_tolls: bool,

    #[arg(long)]
    avoid_highways: bool,

    #[arg(long)]
    vehicle_type: Option<String>,

    #[arg(long)]
    max_distance: Option<f64>,

    /// Also compute up to three alternative routes
    #[arg(long)]
    alternatives: bool,

    /// Print the route as a GeoJSON FeatureCollection
    #[arg(long)]
    geojson: bool,
}

impl RouteArgs {
    fn options(&self) -> RouteOptions {
        RouteOptions {
            optimization_criteria: self.criteria,
            avoid_tolls: self.avoid_tolls,
            avoid_highways: self.avoid_highways,
            vehicle_type: self.vehicle_type.clone(),
            max_distance: self.max_distance,
            include_alternatives: self.alternatives,
            use_cache: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    source: Coordinate,
    destination: Coordinate,
    #[serde(default)]
    via: Vec<Coordinate>,
    #[serde(default)]
    options: RouteOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReport {
    succeeded: usize,
    failed: usize,
    calculation_statistics: CalculationStatistics,
    route_statistics: RouteStatistics,
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got '{raw}'"))?;
    let latitude: f64 = lat.trim().parse().map_err(|e| format!("latitude '{lat}': {e}"))?;
    let longitude: f64 = lng.trim().parse().map_err(|e| format!("longitude '{lng}': {e}"))?;
    let coordinate = Coordinate::new(latitude, longitude);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(format!("coordinate {coordinate} is out of range"))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_batch(optimizer: &RouteOptimizer, requests: &Path) -> anyhow::Result<BatchReport> {
    let raw = fs::read_to_string(requests)
        .with_context(|| format!("reading requests from {}", requests.display()))?;

    let mut succeeded = 0;
    let mut failed = 0;
    for (line_no, line) in raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let request: BatchRequest = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed request", requests.display(), line_no + 1))?;
        match optimizer.calculate_route(
            request.source,
            request.destination,
            &request.via,
            &request.options,
        ) {
            Ok(_) => succeeded += 1,
            Err(err) => {
                tracing::warn!("Request on line {} failed: {err}", line_no + 1);
                failed += 1;
            }
        }
    }

    Ok(BatchReport {
        succeeded,
        failed,
        calculation_statistics: optimizer.calculation_statistics()?,
        route_statistics: optimizer.route_statistics()?,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::with_data_dir(&cli.data_dir),
    };
    info!(
        "Loading map data from {} and {}",
        config.map.nodes_path.display(),
        config.map.edges_path.display()
    );

    let map_data = Arc::new(CsvMapData::new(config.map.clone()));
    let optimizer = RouteOptimizer::in_memory(config.engine.clone(), map_data)
        .context("failed to load the road network")?;

    match cli.command {
        Command::Route(args) => {
            let route = optimizer
                .calculate_route(args.from, args.to, &args.via, &args.options())
                .context("route calculation failed")?;
            if args.geojson {
                print_json(&route.to_geojson()?)?;
            } else {
                print_json(&route)?;
            }
        }
        Command::Batch { requests } => {
            let report = run_batch(&optimizer, &requests)?;
            print_json(&report)?;
        }
        Command::Nearest { at } => match optimizer.nearest_node(&at) {
            Some(node) => print_json(&node)?,
            None => anyhow::bail!("the road network is empty"),
        },
        Command::Radius { at, radius } => {
            let nodes: Vec<_> = optimizer
                .nodes_within_radius(&at, radius)
                .into_iter()
                .map(|(node, distance)| json!({ "node": node, "distanceKm": distance }))
                .collect();
            print_json(&nodes)?;
        }
        Command::GraphStats => print_json(&optimizer.graph_statistics())?,
    }

    Ok(())
}
