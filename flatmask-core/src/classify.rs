//! Tile classification against the polygon set
//!
//! Most tiles of a wide-area overlay are either fully inside one flattening
//! region or far away from all of them. Detecting both cases up front lets the
//! tile collapse to a single pixel instead of a full rasterization.

use crate::raster::TriangleTest;
use crate::types::{GlobeRectangle, Polygon};
use glam::DVec2;

/// Outcome of classifying a tile rectangle against the polygon set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClassification {
    /// The tile lies entirely within the polygon at this index
    WhollyInside(usize),
    /// No polygon bounding rectangle touches the tile
    WhollyOutside,
    /// The tile needs per-pixel rasterization
    Mixed,
}

impl TileClassification {
    /// Whether finer tiles could differ from this one
    pub fn more_detail_available(&self) -> bool {
        matches!(self, TileClassification::Mixed)
    }
}

/// Classify `rectangle` against `polygons`.
///
/// The lowest-index polygon containing the whole tile wins when regions overlap.
/// Polygons without a bounding rectangle never count as touching the tile in the
/// exclusion pass, so an empty set always yields `WhollyOutside`.
pub fn classify_tile(rectangle: &GlobeRectangle, polygons: &[Polygon]) -> TileClassification {
    if let Some(index) = polygons
        .iter()
        .position(|polygon| rectangle_within_polygon(rectangle, polygon))
    {
        return TileClassification::WhollyInside(index);
    }

    let touches_any = polygons.iter().any(|polygon| {
        polygon
            .bounding_rectangle()
            .map_or(false, |bounds| rectangle.compute_intersection(bounds).is_some())
    });

    if touches_any {
        TileClassification::Mixed
    } else {
        TileClassification::WhollyOutside
    }
}

/// True when every point of `rectangle` lies inside `polygon`.
///
/// The polygon outline may touch the tile boundary but must not reach into the
/// open tile. Once no edge does, the tile interior is either wholly inside or
/// wholly outside the polygon, and the tile center decides which.
pub fn rectangle_within_polygon(rectangle: &GlobeRectangle, polygon: &Polygon) -> bool {
    if let Some(bounds) = polygon.bounding_rectangle() {
        if !bounds.contains_rectangle(rectangle) {
            return false;
        }
    }

    if polygon
        .edges()
        .any(|(start, end)| edge_enters_rectangle(rectangle, start, end))
    {
        return false;
    }

    let center = (rectangle.southwest() + rectangle.northeast()) * 0.5;
    polygon
        .triangles()
        .any(|triangle| TriangleTest::new(triangle).contains(center))
}

/// Whether any point of the segment lies strictly inside `rectangle`.
fn edge_enters_rectangle(rectangle: &GlobeRectangle, start: DVec2, end: DVec2) -> bool {
    match clip_segment(rectangle, start, end) {
        // A chord of the closed rectangle stays on the boundary only if its
        // midpoint does
        Some((a, b)) => rectangle.contains_strictly((a + b) * 0.5),
        None => false,
    }
}

/// Liang-Barsky clip of a segment against the closed rectangle.
fn clip_segment(rectangle: &GlobeRectangle, start: DVec2, end: DVec2) -> Option<(DVec2, DVec2)> {
    let delta = end - start;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let boundaries = [
        (-delta.x, start.x - rectangle.west),
        (delta.x, rectangle.east - start.x),
        (-delta.y, start.y - rectangle.south),
        (delta.y, rectangle.north - start.y),
    ];

    for (p, q) in boundaries {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((start + delta * t0, start + delta * t1))
}
