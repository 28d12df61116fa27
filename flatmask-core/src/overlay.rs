//! Flatten overlay: a named polygon set with one height per polygon
//!
//! The overlay owns the validated inputs and hands out tile providers that
//! share them read-only with the worker pool.

use crate::coords::Projection;
use crate::error::{OverlayError, OverlayResult};
use crate::provider::FlattenTileProvider;
use crate::types::{Polygon, TextureSize};
use crate::worker::WorkerPool;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Resolution controls for mask tiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayOptions {
    /// Screen pixels per texel; larger values give coarser masks
    #[serde(default = "default_maximum_screen_space_error")]
    pub maximum_screen_space_error: f64,
    /// Upper bound on each texture dimension
    #[serde(default = "default_maximum_texture_size")]
    pub maximum_texture_size: u32,
}

fn default_maximum_screen_space_error() -> f64 {
    2.0
}

fn default_maximum_texture_size() -> u32 {
    2048
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            maximum_screen_space_error: default_maximum_screen_space_error(),
            maximum_texture_size: default_maximum_texture_size(),
        }
    }
}

impl OverlayOptions {
    pub fn validate(&self) -> OverlayResult<()> {
        if !self.maximum_screen_space_error.is_finite() || self.maximum_screen_space_error <= 0.0 {
            return Err(OverlayError::InvalidOptions(format!(
                "maximum_screen_space_error must be positive and finite, got {}",
                self.maximum_screen_space_error
            )));
        }

        if self.maximum_texture_size == 0 {
            return Err(OverlayError::InvalidOptions(
                "maximum_texture_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Texture size for a tile covering `target_screen_pixels` on screen.
///
/// Each dimension is divided by the screen-space error, clamped to the maximum
/// texture size and rounded to the nearest integer. A dimension that rounds to
/// zero is bumped to 1.
pub fn compute_texture_size(target_screen_pixels: DVec2, options: &OverlayOptions) -> TextureSize {
    let scaled = (target_screen_pixels / options.maximum_screen_space_error)
        .min(DVec2::splat(options.maximum_texture_size as f64))
        .round();

    // Saturating casts: negatives and NaN become 0
    let width = scaled.x as u32;
    let height = scaled.y as u32;

    if width == 0 || height == 0 {
        log::warn!(
            "Texture size for {} screen pixels rounds to {}x{}, using at least 1x1",
            target_screen_pixels,
            width,
            height
        );
    }

    TextureSize::new(width.max(1), height.max(1))
}

/// Polygon set, index-aligned heights and the settings used to produce tiles
#[derive(Debug, Clone)]
pub struct FlattenOverlay {
    name: String,
    polygons: Arc<[Polygon]>,
    heights: Arc<[f32]>,
    projection: Projection,
    options: OverlayOptions,
}

impl FlattenOverlay {
    pub fn new(
        name: impl Into<String>,
        polygons: Vec<Polygon>,
        heights: Vec<f32>,
        projection: Projection,
        options: OverlayOptions,
    ) -> OverlayResult<Self> {
        if polygons.len() != heights.len() {
            return Err(OverlayError::HeightCountMismatch {
                polygons: polygons.len(),
                heights: heights.len(),
            });
        }
        options.validate()?;

        let name = name.into();
        log::debug!(
            "Created flatten overlay '{}' with {} polygons",
            name,
            polygons.len()
        );

        Ok(Self {
            name,
            polygons: polygons.into(),
            heights: heights.into(),
            projection,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Provider that produces this overlay's tiles on `pool`.
    pub fn create_tile_provider(&self, pool: WorkerPool) -> FlattenTileProvider {
        FlattenTileProvider::new(
            self.name.clone(),
            Arc::clone(&self.polygons),
            Arc::clone(&self.heights),
            self.projection,
            self.options,
            pool,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Polygon {
        Polygon::from_degrees(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_default_options() {
        let options = OverlayOptions::default();
        assert_eq!(options.maximum_screen_space_error, 2.0);
        assert_eq!(options.maximum_texture_size, 2048);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        let zero_error = OverlayOptions {
            maximum_screen_space_error: 0.0,
            ..OverlayOptions::default()
        };
        assert!(matches!(zero_error.validate(), Err(OverlayError::InvalidOptions(_))));

        let nan_error = OverlayOptions {
            maximum_screen_space_error: f64::NAN,
            ..OverlayOptions::default()
        };
        assert!(nan_error.validate().is_err());

        let zero_size = OverlayOptions {
            maximum_texture_size: 0,
            ..OverlayOptions::default()
        };
        assert!(zero_size.validate().is_err());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: OverlayOptions =
            serde_json::from_str(r#"{ "maximum_texture_size": 512 }"#).unwrap();
        assert_eq!(options.maximum_screen_space_error, 2.0);
        assert_eq!(options.maximum_texture_size, 512);
    }

    #[test]
    fn test_texture_size_divides_and_clamps() {
        let options = OverlayOptions::default();
        assert_eq!(
            compute_texture_size(DVec2::new(512.0, 256.0), &options),
            TextureSize::new(256, 128)
        );
        assert_eq!(
            compute_texture_size(DVec2::new(10_000.0, 3.0), &options),
            TextureSize::new(2048, 2)
        );
    }

    #[test]
    fn test_texture_size_rounds_to_nearest() {
        let options = OverlayOptions {
            maximum_screen_space_error: 3.0,
            ..OverlayOptions::default()
        };
        // 100 / 3 = 33.3, 101 / 3 = 33.7
        assert_eq!(
            compute_texture_size(DVec2::new(100.0, 101.0), &options),
            TextureSize::new(33, 34)
        );
    }

    #[test]
    fn test_texture_size_never_zero() {
        let options = OverlayOptions::default();
        assert_eq!(
            compute_texture_size(DVec2::new(0.0, 0.5), &options),
            TextureSize::new(1, 1)
        );
        assert_eq!(
            compute_texture_size(DVec2::new(-8.0, 64.0), &options),
            TextureSize::new(1, 32)
        );
    }

    #[test]
    fn test_overlay_rejects_height_mismatch() {
        let result = FlattenOverlay::new(
            "mismatch",
            vec![triangle(), triangle()],
            vec![1.0],
            Projection::geographic(),
            OverlayOptions::default(),
        );
        assert!(matches!(
            result,
            Err(OverlayError::HeightCountMismatch { polygons: 2, heights: 1 })
        ));
    }

    #[test]
    fn test_overlay_accessors() {
        let overlay = FlattenOverlay::new(
            "site",
            vec![triangle()],
            vec![12.5],
            Projection::web_mercator(),
            OverlayOptions::default(),
        )
        .unwrap();

        assert_eq!(overlay.name(), "site");
        assert_eq!(overlay.polygons().len(), 1);
        assert_eq!(overlay.heights(), &[12.5]);
        assert_eq!(overlay.projection(), &Projection::web_mercator());
        assert_eq!(overlay.options(), &OverlayOptions::default());
    }
}
