//! Asynchronous tile production for a flatten overlay

use crate::classify::TileClassification;
use crate::coords::{whole_globe_rectangle, Projection};
use crate::overlay::{compute_texture_size, OverlayOptions};
use crate::raster::{rasterize_polygons, MaskImage};
use crate::types::{Polygon, Rectangle, TextureSize};
use crate::worker::{WorkerFuture, WorkerPool};
use glam::DVec2;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// One tile to produce: a projected rectangle and its on-screen footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub rectangle: Rectangle,
    pub target_screen_pixels: DVec2,
}

impl TileRequest {
    pub fn new(rectangle: Rectangle, target_screen_pixels: DVec2) -> Self {
        Self {
            rectangle,
            target_screen_pixels,
        }
    }
}

/// Mask delivered for a [`TileRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMaskImage {
    pub image: MaskImage,
    /// The requested projected rectangle, echoed back
    pub rectangle: Rectangle,
    pub more_detail_available: bool,
    pub classification: TileClassification,
}

/// Snapshot of tiles produced per classification outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderStats {
    pub wholly_inside: u64,
    pub wholly_outside: u64,
    pub mixed: u64,
}

impl ProviderStats {
    pub fn total(&self) -> u64 {
        self.wholly_inside + self.wholly_outside + self.mixed
    }
}

#[derive(Debug, Default)]
struct ProviderCounters {
    wholly_inside: AtomicU64,
    wholly_outside: AtomicU64,
    mixed: AtomicU64,
}

impl ProviderCounters {
    fn record(&self, classification: TileClassification) {
        let counter = match classification {
            TileClassification::WhollyInside(_) => &self.wholly_inside,
            TileClassification::WhollyOutside => &self.wholly_outside,
            TileClassification::Mixed => &self.mixed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ProviderStats {
        ProviderStats {
            wholly_inside: self.wholly_inside.load(Ordering::Relaxed),
            wholly_outside: self.wholly_outside.load(Ordering::Relaxed),
            mixed: self.mixed.load(Ordering::Relaxed),
        }
    }
}

/// Produces mask tiles on a worker pool.
///
/// Polygons and heights are shared with every in-flight task; nothing is
/// mutated after construction except the statistics counters.
#[derive(Debug, Clone)]
pub struct FlattenTileProvider {
    name: String,
    polygons: Arc<[Polygon]>,
    heights: Arc<[f32]>,
    projection: Projection,
    options: OverlayOptions,
    coverage_rectangle: Rectangle,
    pool: WorkerPool,
    counters: Arc<ProviderCounters>,
}

impl FlattenTileProvider {
    pub(crate) fn new(
        name: String,
        polygons: Arc<[Polygon]>,
        heights: Arc<[f32]>,
        projection: Projection,
        options: OverlayOptions,
        pool: WorkerPool,
    ) -> Self {
        Self {
            name,
            polygons,
            heights,
            coverage_rectangle: whole_globe_rectangle(&projection),
            projection,
            options,
            pool,
            counters: Arc::new(ProviderCounters::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Projected extent the provider can produce tiles for
    pub fn coverage_rectangle(&self) -> &Rectangle {
        &self.coverage_rectangle
    }

    pub fn texture_size_for(&self, target_screen_pixels: DVec2) -> TextureSize {
        compute_texture_size(target_screen_pixels, &self.options)
    }

    pub fn stats(&self) -> ProviderStats {
        self.counters.snapshot()
    }

    /// Classify and rasterize `request` on the worker pool.
    ///
    /// Returns immediately; the future resolves once with the mask or with a
    /// [`crate::TileError`] if the worker task failed.
    pub fn produce_tile(&self, request: &TileRequest) -> WorkerFuture<LoadedMaskImage> {
        let texture_size = self.texture_size_for(request.target_screen_pixels);
        let rectangle = request.rectangle;
        let projection = self.projection;
        let polygons = Arc::clone(&self.polygons);
        let heights = Arc::clone(&self.heights);
        let counters = Arc::clone(&self.counters);
        let name = self.name.clone();

        self.pool.run_in_worker_thread(move || {
            let start = Instant::now();
            let globe_rectangle = projection.unproject_rectangle_simple(&rectangle);
            let mask = rasterize_polygons(&globe_rectangle, texture_size, &polygons, &heights);
            counters.record(mask.classification);

            log::debug!(
                "[{}] tile {:?} -> {:?}, {}x{} in {:?}",
                name,
                globe_rectangle,
                mask.classification,
                mask.image.width,
                mask.image.height,
                start.elapsed()
            );

            LoadedMaskImage {
                image: mask.image,
                rectangle,
                more_detail_available: mask.more_detail_available,
                classification: mask.classification,
            }
        })
    }
}
