//! flatmask Core Library
//!
//! Flatten-polygon tile classification, coverage/height mask rasterization,
//! the 24-bit height codec and asynchronous tile production on a worker pool.

pub mod types;
pub mod coords;
pub mod codec;
pub mod classify;
pub mod raster;
pub mod worker;
pub mod overlay;
pub mod provider;
pub mod error;

// Re-export commonly used types and functions
pub use types::{GlobeRectangle, Polygon, Radians, Rectangle, TextureSize};
pub use coords::{pixel_center, whole_globe_rectangle, Projection};
pub use codec::{decode_f24, decode_height_rgb, encode_f24, encode_height_rgb};
pub use classify::{classify_tile, rectangle_within_polygon, TileClassification};
pub use raster::{rasterize_polygons, MaskImage, RasterizedMask};
pub use worker::{WorkerConfig, WorkerFuture, WorkerPool};
pub use overlay::{compute_texture_size, FlattenOverlay, OverlayOptions};
pub use provider::{FlattenTileProvider, LoadedMaskImage, ProviderStats, TileRequest};
pub use error::{OverlayError, OverlayResult, TileError, TileResult};

/// Version information for the flatmask core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
