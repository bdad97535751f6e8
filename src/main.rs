//! Geo Scatter - 3D scatter of geotagged, timestamped records
//!
//! CLI commands:
//! - view: Launch the interactive viewer
//! - inspect: Print the normalized point set
//! - snapshot: Render the point set to a PNG

mod camera;
mod color;
mod config;
mod dataset;
mod gui;
mod hover;
mod ingest;
mod logging;
mod normalize;
mod snapshot;
mod state;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::color::HexColor;
use crate::dataset::Dataset;
use crate::ingest::format_local;

#[derive(Parser)]
#[command(name = "geoscatter")]
#[command(version, about = "3D scatter of geotagged, timestamped records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to viewer.yaml config
    #[arg(short, long, default_value = "viewer.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive viewer
    View {
        /// CSV file to load on startup
        file: Option<PathBuf>,
    },

    /// Print the normalized points of a file
    Inspect {
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render a file to a PNG image
    Snapshot {
        file: PathBuf,

        /// Output image
        #[arg(short, long, default_value = "snapshot.png")]
        output: PathBuf,

        /// Image width and height in pixels
        #[arg(long, default_value = "800")]
        size: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let env = config::Env::load();
    let _log_guard = logging::init_logging(&env.log_dir)?;
    tracing::info!("Geo Scatter starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let config = config::Config::load_or_default(&cli.config)
        .with_context(|| format!("Invalid config {:?}", cli.config))?;

    match cli.command {
        Commands::View { file } => {
            tracing::info!("Launching native GUI viewer");
            gui::run_viewer(config, file.or(env.data_file))?;
        }

        Commands::Inspect { file, json } => {
            let dataset = load(&file, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dataset)?);
            } else {
                print_dataset(&file, &dataset);
            }
        }

        Commands::Snapshot { file, output, size } => {
            let dataset = load(&file, &config)?;
            let pose = camera::center_pose(&dataset.points, config.viewer.camera_distance)
                .ok_or_else(|| anyhow::anyhow!("{:?} has no data rows to render", file))?;
            let background = HexColor::parse(&config.viewer.background)
                .ok_or_else(|| anyhow::anyhow!("Invalid background color: {}", config.viewer.background))?;

            snapshot::render_png(
                &dataset.points,
                pose,
                snapshot::SnapshotSettings {
                    size,
                    fov_degrees: config.viewer.fov_degrees,
                    background,
                },
                &output,
            )?;
        }
    }

    Ok(())
}

fn load(file: &Path, config: &config::Config) -> anyhow::Result<Dataset> {
    Dataset::from_path(file, config.ingest.malformed_rows)
        .with_context(|| format!("Failed to load {:?}", file))
}

/// Human-readable dump of a loaded file
fn print_dataset(file: &Path, dataset: &Dataset) {
    println!("{} ({} points)", file.display(), dataset.points.len());

    if let Some(bounds) = &dataset.bounds {
        let flat = |degenerate: bool| if degenerate { " (flat, centered)" } else { "" };
        println!();
        println!(
            "  latitude:  {} .. {}{}",
            bounds.latitude.min,
            bounds.latitude.max,
            flat(bounds.latitude.is_degenerate())
        );
        println!(
            "  longitude: {} .. {}{}",
            bounds.longitude.min,
            bounds.longitude.max,
            flat(bounds.longitude.is_degenerate())
        );
        println!(
            "  timestamp: {} .. {}{}",
            format_local(bounds.timestamp.min as i64),
            format_local(bounds.timestamp.max as i64),
            flat(bounds.timestamp.is_degenerate())
        );
    }

    if !dataset.issues.is_empty() {
        println!();
        println!("Rejected rows ({}):", dataset.issues.len());
        for issue in &dataset.issues {
            println!("  line {}: {}", issue.line, issue.kind);
        }
    }

    println!();
    for p in &dataset.points {
        println!(
            "  {} {} ({:.4}, {:.4}, {:.4}) lat={} lon={} time={}",
            p.color,
            p.id,
            p.position[0],
            p.position[1],
            p.position[2],
            p.latitude,
            p.longitude,
            format_local(p.timestamp_millis)
        );
    }
}
