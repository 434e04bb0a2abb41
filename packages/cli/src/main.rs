#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for the site selector.
//!
//! Runs the boundary derivation and the location search headlessly against
//! a recording map surface, printing what an interactive map would show.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use geofence_boundary::{DrawCoordinator, Transition};
use geofence_geometry::{feature_from_geojson_str, format_coordinates};
use geofence_map::recording::RecordingSurface;
use geofence_map::styles::{DEFAULT_STYLE_ID, all_styles};
use geofence_session::{GeofenceConfig, SiteSelector};

#[derive(Parser)]
#[command(name = "geofence", about = "Site boundary selection tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the site boundary of a drawn polygon
    Derive {
        /// `GeoJSON` file holding a Feature, FeatureCollection, or Polygon
        path: PathBuf,
    },
    /// Search for a location (requires `MAPBOX_TOKEN`)
    Search {
        /// Free-text query (e.g., "Okhla Phase 2")
        query: String,
        /// Fly to the result at this position in the list
        #[arg(long)]
        select: Option<usize>,
    },
    /// List the available base map styles
    Styles,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Derive { path } => derive(&path)?,
        Commands::Search { query, select } => search(&query, select).await?,
        Commands::Styles => styles(),
    }

    Ok(())
}

fn derive(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let feature = feature_from_geojson_str(&text)?;

    let mut coordinator = DrawCoordinator::new();
    if let Transition::Rejected(e) = coordinator.create(&feature) {
        return Err(format!("{}: {e}", path.display()).into());
    }

    let boundary = coordinator.boundary();
    if let Some(snapshot) = boundary.current_snapshot() {
        let center = snapshot.bounding_box.center;
        println!("Points:  {}", snapshot.point_count());
        println!("Area:    {} km²", snapshot.area.display_km2());
        println!(
            "Bounds:  {:.6}° x {:.6}°",
            snapshot.bounding_box.width(),
            snapshot.bounding_box.height()
        );
        println!(
            "Center:  {}",
            format_coordinates(center.longitude, center.latitude)
        );
    }

    if let Some(summary) = boundary.summary() {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&boundary.build_handoff_payload()?)?
    );

    Ok(())
}

async fn search(query: &str, select: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeofenceConfig::from_env()?;
    let (surface, _handle) = RecordingSurface::new();
    let mut selector = SiteSelector::connect(&config, Box::new(surface))?;

    selector.search_input(query);
    for update in selector.settle_search().await {
        log::debug!("{update:?}");
    }

    let results = selector.search().results();
    if results.is_empty() {
        println!("No results found");
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{i:>2}. {} ({})",
            result.place_name,
            format_coordinates(result.center.longitude, result.center.latitude)
        );
    }

    if let Some(index) = select {
        let Some(options) = selector.select_result(index) else {
            return Err(format!("No result at position {index}").into());
        };
        println!("{}", serde_json::to_string_pretty(&options)?);
    }

    selector.teardown();
    Ok(())
}

fn styles() {
    for style in all_styles() {
        let marker = if style.id == DEFAULT_STYLE_ID { "*" } else { " " };
        println!("{marker} {:<18} {:<20} {}", style.id, style.name, style.url);
    }
}
