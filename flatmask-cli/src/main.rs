use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flatmask_core::{classify_tile, GlobeRectangle, TileClassification, TileRequest, WorkerPool};
use glam::DVec2;
use std::path::PathBuf;

mod config;
mod error;
mod export;

use config::{Config, ProjectionKind};
use error::{print_error_and_exit, CliError, CliResult};

#[derive(Parser)]
#[command(name = "flatmask")]
#[command(about = "flatmask - flatten-polygon mask tiles for terrain overlays")]
#[command(version)]
#[command(long_about = "
flatmask classifies terrain tiles against a set of flattening polygons and
rasterizes coverage/height masks for the tiles that need them.

Examples:
  flatmask example-config > flatmask.toml
  flatmask classify --west 8.52 --south 47.45 --east 8.54 --north 47.46
  flatmask render --west 8.4 --south 47.4 --east 8.6 --north 47.5 --output tile.png
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of worker threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Tile bounds in degrees
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct TileBounds {
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,
}

impl TileBounds {
    fn to_globe_rectangle(self) -> CliResult<GlobeRectangle> {
        if !(self.west < self.east && self.south < self.north) {
            return Err(CliError::validation(format!(
                "empty tile bounds: west {} east {} south {} north {}",
                self.west, self.east, self.south, self.north
            )));
        }
        Ok(GlobeRectangle::from_degrees(
            self.west, self.south, self.east, self.north,
        ))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce one mask tile through the worker pool and write it as PNG
    Render {
        #[command(flatten)]
        bounds: TileBounds,

        /// Output PNG file
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Override the projection from the configuration
        #[arg(long)]
        projection: Option<ProjectionKind>,

        /// On-screen width of the tile in pixels
        #[arg(long, default_value = "512")]
        screen_width: u32,

        /// On-screen height of the tile in pixels
        #[arg(long, default_value = "512")]
        screen_height: u32,
    },

    /// Print how a tile classifies against the configured polygons
    Classify {
        #[command(flatten)]
        bounds: TileBounds,
    },

    /// Print an example configuration file
    ExampleConfig,
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

fn render(
    config: &Config,
    threads: Option<usize>,
    bounds: TileBounds,
    output: PathBuf,
    projection: Option<ProjectionKind>,
    screen_size: (u32, u32),
) -> Result<()> {
    if screen_size.0 == 0 || screen_size.1 == 0 {
        return Err(CliError::validation("screen width and height must be positive").into());
    }

    let mut config = config.clone();
    if let Some(projection) = projection {
        config.overlay.projection = projection;
    }
    if let Some(threads) = threads {
        config.worker.threads = threads;
    }

    let overlay = config.build_overlay()?;
    let pool = WorkerPool::new(&config.worker).map_err(CliError::from)?;
    let provider = overlay.create_tile_provider(pool);

    let rectangle = bounds.to_globe_rectangle()?;
    let request = TileRequest::new(
        provider.projection().project_rectangle_simple(&rectangle),
        DVec2::new(screen_size.0 as f64, screen_size.1 as f64),
    );

    log::info!(
        "Producing tile for '{}' with {} polygons",
        overlay.name(),
        overlay.polygons().len()
    );
    let loaded = pollster::block_on(provider.produce_tile(&request)).map_err(CliError::from)?;

    log::info!(
        "Tile classified as {}, {:.1}% covered, more detail available: {}",
        describe(&loaded.classification, &config),
        export::coverage_fraction(&loaded.image) * 100.0,
        loaded.more_detail_available
    );

    export::write_mask_png(&loaded.image, &output)
        .with_context(|| format!("Failed to export tile to {}", output.display()))?;
    Ok(())
}

fn classify(config: &Config, bounds: TileBounds) -> Result<()> {
    let overlay = config.build_overlay()?;
    let rectangle = bounds.to_globe_rectangle()?;
    let classification = classify_tile(&rectangle, overlay.polygons());

    println!("{}", describe(&classification, config));
    Ok(())
}

fn describe(classification: &TileClassification, config: &Config) -> String {
    match *classification {
        TileClassification::WhollyInside(index) => {
            let polygon = &config.polygons[index];
            format!(
                "wholly inside polygon {} (height {} m)",
                polygon.label(index),
                polygon.height
            )
        }
        TileClassification::WhollyOutside => "wholly outside".to_string(),
        TileClassification::Mixed => "mixed".to_string(),
    }
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::ExampleConfig => {
            print!("{}", Config::example_toml()?);
        }

        Commands::Render {
            bounds,
            output,
            projection,
            screen_width,
            screen_height,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            render(
                &config,
                cli.threads,
                bounds,
                output,
                projection,
                (screen_width, screen_height),
            )?;
        }

        Commands::Classify { bounds } => {
            let config = Config::load(cli.config.as_deref())?;
            classify(&config, bounds)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_negative_bounds() {
        let cli = Cli::try_parse_from([
            "flatmask", "-vv", "render", "--west", "-10", "--south", "-5", "--east", "10",
            "--north", "5", "--output", "tile.png", "--projection", "web-mercator",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Render { bounds, projection, screen_width, .. } => {
                assert_eq!(bounds.west, -10.0);
                assert_eq!(projection, Some(ProjectionKind::WebMercator));
                assert_eq!(screen_width, 512);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_empty_bounds_rejected() {
        let bounds = TileBounds { west: 1.0, south: 0.0, east: 1.0, north: 1.0 };
        assert!(matches!(
            bounds.to_globe_rectangle(),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn test_describe_names_polygon() {
        let config = Config::example();
        assert_eq!(
            describe(&TileClassification::WhollyInside(0), &config),
            "wholly inside polygon airfield (height 112.5 m)"
        );
        assert_eq!(describe(&TileClassification::Mixed, &config), "mixed");
    }
}
