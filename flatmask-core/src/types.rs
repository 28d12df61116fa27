use crate::error::{OverlayError, OverlayResult};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Longitude / latitude angle in radians.
pub type Radians = f64;

/// Axis-aligned rectangle in projected coordinates (metres for the built-in projections).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub minimum_x: f64,
    pub minimum_y: f64,
    pub maximum_x: f64,
    pub maximum_y: f64,
}

impl Rectangle {
    pub fn new(minimum_x: f64, minimum_y: f64, maximum_x: f64, maximum_y: f64) -> Self {
        Self {
            minimum_x,
            minimum_y,
            maximum_x,
            maximum_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.maximum_x - self.minimum_x
    }

    pub fn height(&self) -> f64 {
        self.maximum_y - self.minimum_y
    }

    pub fn minimum(&self) -> DVec2 {
        DVec2::new(self.minimum_x, self.minimum_y)
    }

    pub fn maximum(&self) -> DVec2 {
        DVec2::new(self.maximum_x, self.maximum_y)
    }
}

/// Geographic bounding box in radians.
///
/// Not antimeridian aware: `west < east` is assumed everywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobeRectangle {
    pub west: Radians,
    pub south: Radians,
    pub east: Radians,
    pub north: Radians,
}

impl GlobeRectangle {
    /// The whole globe.
    pub const MAXIMUM: GlobeRectangle = GlobeRectangle {
        west: -PI,
        south: -FRAC_PI_2,
        east: PI,
        north: FRAC_PI_2,
    };

    pub fn new(west: Radians, south: Radians, east: Radians, north: Radians) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(
            west.to_radians(),
            south.to_radians(),
            east.to_radians(),
            north.to_radians(),
        )
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn southwest(&self) -> DVec2 {
        DVec2::new(self.west, self.south)
    }

    pub fn southeast(&self) -> DVec2 {
        DVec2::new(self.east, self.south)
    }

    pub fn northeast(&self) -> DVec2 {
        DVec2::new(self.east, self.north)
    }

    pub fn northwest(&self) -> DVec2 {
        DVec2::new(self.west, self.north)
    }

    /// Corners in counter-clockwise order starting at the south-west.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.southwest(),
            self.southeast(),
            self.northeast(),
            self.northwest(),
        ]
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.west && point.x <= self.east && point.y >= self.south && point.y <= self.north
    }

    /// Point containment that excludes the boundary.
    pub fn contains_strictly(&self, point: DVec2) -> bool {
        point.x > self.west && point.x < self.east && point.y > self.south && point.y < self.north
    }

    pub fn contains_rectangle(&self, other: &GlobeRectangle) -> bool {
        other.west >= self.west
            && other.east <= self.east
            && other.south >= self.south
            && other.north <= self.north
    }

    /// Overlapping area of two rectangles, `None` when they are disjoint or only share an edge.
    pub fn compute_intersection(&self, other: &GlobeRectangle) -> Option<GlobeRectangle> {
        let west = self.west.max(other.west);
        let east = self.east.min(other.east);
        if east <= west {
            return None;
        }

        let south = self.south.max(other.south);
        let north = self.north.min(other.north);
        if north <= south {
            return None;
        }

        Some(GlobeRectangle::new(west, south, east, north))
    }

    /// Smallest rectangle enclosing every point, `None` for an empty slice.
    pub fn from_points(points: &[DVec2]) -> Option<GlobeRectangle> {
        let first = points.first()?;
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(GlobeRectangle::new(min.x, min.y, max.x, max.y))
    }
}

/// Integer resolution of a mask texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

impl TextureSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A flattening region on the ground.
///
/// `vertices` is the outline ring in order (radians, x = longitude, y = latitude);
/// `indices` triangulates it, three indices per triangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolygonData")]
pub struct Polygon {
    vertices: Vec<DVec2>,
    indices: Vec<u32>,
    bounding_rectangle: Option<GlobeRectangle>,
}

/// Unvalidated wire form of [`Polygon`].
#[derive(Deserialize)]
struct PolygonData {
    vertices: Vec<DVec2>,
    indices: Vec<u32>,
    #[serde(default)]
    bounding_rectangle: Option<GlobeRectangle>,
}

impl TryFrom<PolygonData> for Polygon {
    type Error = OverlayError;

    fn try_from(data: PolygonData) -> OverlayResult<Self> {
        Self::with_bounding_rectangle(data.vertices, data.indices, data.bounding_rectangle)
    }
}

impl Polygon {
    /// Build a polygon from an outline and its triangulation, computing the bounding rectangle.
    pub fn new(vertices: Vec<DVec2>, indices: Vec<u32>) -> OverlayResult<Self> {
        let bounding_rectangle = GlobeRectangle::from_points(&vertices);
        Self::with_bounding_rectangle(vertices, indices, bounding_rectangle)
    }

    /// Build a polygon with an explicit (possibly absent) bounding rectangle.
    pub fn with_bounding_rectangle(
        vertices: Vec<DVec2>,
        indices: Vec<u32>,
        bounding_rectangle: Option<GlobeRectangle>,
    ) -> OverlayResult<Self> {
        if vertices.len() < 3 {
            return Err(OverlayError::InvalidPolygon(format!(
                "at least 3 vertices are required, got {}",
                vertices.len()
            )));
        }

        if indices.len() % 3 != 0 {
            return Err(OverlayError::InvalidPolygon(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }

        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(OverlayError::InvalidPolygon(format!(
                "index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }

        Ok(Self {
            vertices,
            indices,
            bounding_rectangle,
        })
    }

    /// Triangulate a simple outline (no holes) by ear clipping.
    pub fn from_outline(vertices: Vec<DVec2>) -> OverlayResult<Self> {
        if vertices.len() < 3 {
            return Err(OverlayError::InvalidPolygon(format!(
                "at least 3 vertices are required, got {}",
                vertices.len()
            )));
        }

        let flat: Vec<f64> = vertices.iter().flat_map(|v| [v.x, v.y]).collect();
        let triangles = earcutr::earcut(&flat, &[], 2)
            .map_err(|e| OverlayError::Triangulation(format!("{:?}", e)))?;

        if triangles.is_empty() {
            return Err(OverlayError::Triangulation(
                "outline produced no triangles (degenerate polygon?)".to_string(),
            ));
        }

        let indices = triangles.into_iter().map(|i| i as u32).collect();
        Self::new(vertices, indices)
    }

    /// Outline given as `(longitude, latitude)` pairs in degrees.
    pub fn from_degrees(outline: &[(f64, f64)]) -> OverlayResult<Self> {
        let vertices = outline
            .iter()
            .map(|&(lon, lat)| DVec2::new(lon.to_radians(), lat.to_radians()))
            .collect();
        Self::from_outline(vertices)
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounding_rectangle(&self) -> Option<&GlobeRectangle> {
        self.bounding_rectangle.as_ref()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangle corners in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [DVec2; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Outline edges, including the closing edge from the last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}
