use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use graphnav_viz::imaging::DEFAULT_JPEG_QUALITY;
use graphnav_viz::{MapService, ServiceConfig};

#[derive(Parser)]
#[command(name = "graphnav-viz")]
#[command(about = "Query a recorded GraphNav map: positions, snapshot images and object labels")]
#[command(version)]
struct Cli {
    /// Map directory containing `graph` and `waypoint_snapshots/`.
    #[arg(long, default_value = "./assets/maps/chair_v3")]
    map_path: PathBuf,

    /// Directory of `metadata_*.json` annotation documents.
    #[arg(long, default_value = "./assets/database/chair_v3")]
    annotations_path: PathBuf,

    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary counts for the loaded map.
    Check,
    /// Waypoints, edges and objects with positions.
    Map {
        /// Report positions in the seed frame instead of the traversal frame.
        #[arg(long)]
        anchoring: bool,
    },
    /// All waypoints with labels.
    Waypoints,
    /// Details of one waypoint.
    Waypoint {
        id: String,
        #[arg(long)]
        anchoring: bool,
    },
    /// Forward camera images of a waypoint.
    Images {
        id: String,
        /// Write `<id>_left.jpg` / `<id>_right.jpg` here instead of printing base64.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Sorted catalog of annotated objects.
    Objects,
    /// Rename a waypoint and save the graph.
    SetLabel { id: String, label: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig {
        map_path: cli.map_path,
        annotations_path: cli.annotations_path,
        jpeg_quality: cli.jpeg_quality,
        ..ServiceConfig::default()
    };
    let service = MapService::load(config.clone())
        .with_context(|| format!("Failed to load map from {}", config.map_path.display()))?;

    match cli.command {
        Commands::Check => print_json(&service.check()),
        Commands::Map { anchoring } => print_json(&service.map(anchoring)),
        Commands::Waypoints => print_json(&service.waypoints()),
        Commands::Waypoint { id, anchoring } => print_json(&service.waypoint(&id, anchoring)?),
        Commands::Images { id, out_dir } => run_images(&service, &id, out_dir.as_deref()),
        Commands::Objects => print_json(&service.objects()),
        Commands::SetLabel { id, label } => print_json(&service.update_label(&id, &label)?),
    }
}

fn run_images(service: &MapService, id: &str, out_dir: Option<&Path>) -> Result<()> {
    let images = service.waypoint_images(id)?;

    let Some(out_dir) = out_dir else {
        return print_json(&images.to_response());
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    for (side, image) in [("left", &images.left), ("right", &images.right)] {
        match image {
            Some(image) => {
                let path = out_dir.join(format!("{}_{}.jpg", id, side));
                std::fs::write(&path, &image.jpeg)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("{} image written to {}", side, path.display());
            }
            None => tracing::warn!("No {} image for waypoint {}", side, id),
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
