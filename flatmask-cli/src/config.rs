//! Configuration handling for the flatmask CLI
//!
//! An overlay is described in a flatmask.toml file: general overlay settings,
//! tile resolution options, worker pool sizing and the flattening polygons.

use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use flatmask_core::{FlattenOverlay, OverlayOptions, Polygon, Projection, WorkerConfig};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub options: OverlayOptions,

    #[serde(default)]
    pub worker: WorkerConfig,

    /// Flattening regions. A tile wholly inside several takes the first one;
    /// in partially covered tiles later entries overwrite earlier ones per pixel
    #[serde(default)]
    pub polygons: Vec<PolygonConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Overlay name used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Projection of tile rectangles
    #[serde(default)]
    pub projection: ProjectionKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionKind {
    #[default]
    Geographic,
    WebMercator,
}

impl ProjectionKind {
    pub fn to_projection(self) -> Projection {
        match self {
            ProjectionKind::Geographic => Projection::geographic(),
            ProjectionKind::WebMercator => Projection::web_mercator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Flatten height in metres
    pub height: f32,

    /// Outline as [longitude, latitude] pairs in degrees
    pub vertices: Vec<[f64; 2]>,

    /// Explicit triangulation; the outline is ear-clipped when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl PolygonConfig {
    /// Name used in error messages, falling back to the position in the file.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", index))
    }

    pub fn to_polygon(&self, index: usize) -> CliResult<Polygon> {
        let vertices: Vec<DVec2> = self
            .vertices
            .iter()
            .map(|&[lon, lat]| DVec2::new(lon.to_radians(), lat.to_radians()))
            .collect();

        let polygon = match &self.indices {
            Some(indices) => Polygon::new(vertices, indices.clone()),
            None => Polygon::from_outline(vertices),
        };

        polygon.map_err(|e| CliError::polygon(self.label(index), e.to_string()))
    }
}

fn default_name() -> String {
    "flatten".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            projection: ProjectionKind::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("flatmask.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: flatmask.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::file_not_found(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Small configuration with one flattened square, used for `example-config`
    pub fn example() -> Self {
        Self {
            polygons: vec![PolygonConfig {
                name: Some("airfield".to_string()),
                height: 112.5,
                vertices: vec![[8.50, 47.44], [8.58, 47.44], [8.58, 47.48], [8.50, 47.48]],
                indices: None,
            }],
            ..Self::default()
        }
    }

    /// Generate example configuration file content
    pub fn example_toml() -> CliResult<String> {
        Ok(toml::to_string_pretty(&Self::example())?)
    }

    /// Validate polygons and options and assemble the overlay.
    pub fn build_overlay(&self) -> CliResult<FlattenOverlay> {
        let polygons = self
            .polygons
            .iter()
            .enumerate()
            .map(|(index, polygon)| polygon.to_polygon(index))
            .collect::<CliResult<Vec<_>>>()?;
        let heights = self.polygons.iter().map(|p| p.height).collect();

        let overlay = FlattenOverlay::new(
            self.overlay.name.clone(),
            polygons,
            heights,
            self.overlay.projection.to_projection(),
            self.options,
        )?;
        Ok(overlay)
    }
}
