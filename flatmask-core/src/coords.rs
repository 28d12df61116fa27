use crate::types::*;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// WGS84 semi-major axis in metres.
pub const WGS84_SEMIMAJOR_AXIS: f64 = 6_378_137.0;

/// Latitude at which Web Mercator maps to a square (about 85.05 degrees).
pub const WEB_MERCATOR_MAXIMUM_LATITUDE: f64 = 1.484_422_229_745_332_4;

/// Map projection used for tile rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Projection {
    /// Equirectangular: x = longitude * a, y = latitude * a.
    Geographic { semimajor_axis: f64 },
    /// Spherical Web Mercator.
    WebMercator { semimajor_axis: f64 },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::geographic()
    }
}

impl Projection {
    pub fn geographic() -> Self {
        Projection::Geographic {
            semimajor_axis: WGS84_SEMIMAJOR_AXIS,
        }
    }

    pub fn web_mercator() -> Self {
        Projection::WebMercator {
            semimajor_axis: WGS84_SEMIMAJOR_AXIS,
        }
    }

    pub fn semimajor_axis(&self) -> f64 {
        match *self {
            Projection::Geographic { semimajor_axis } => semimajor_axis,
            Projection::WebMercator { semimajor_axis } => semimajor_axis,
        }
    }

    /// Geographic position (radians) to projected coordinates.
    pub fn project(&self, cartographic: DVec2) -> DVec2 {
        match *self {
            Projection::Geographic { semimajor_axis } => cartographic * semimajor_axis,
            Projection::WebMercator { semimajor_axis } => {
                let latitude = cartographic
                    .y
                    .clamp(-WEB_MERCATOR_MAXIMUM_LATITUDE, WEB_MERCATOR_MAXIMUM_LATITUDE);
                DVec2::new(
                    cartographic.x * semimajor_axis,
                    geodetic_latitude_to_mercator_angle(latitude) * semimajor_axis,
                )
            }
        }
    }

    /// Projected coordinates back to a geographic position (radians).
    pub fn unproject(&self, projected: DVec2) -> DVec2 {
        match *self {
            Projection::Geographic { semimajor_axis } => projected / semimajor_axis,
            Projection::WebMercator { semimajor_axis } => DVec2::new(
                projected.x / semimajor_axis,
                mercator_angle_to_geodetic_latitude(projected.y / semimajor_axis),
            ),
        }
    }

    /// Project the south-west and north-east corners of a geographic rectangle.
    pub fn project_rectangle_simple(&self, rectangle: &GlobeRectangle) -> Rectangle {
        let sw = self.project(rectangle.southwest());
        let ne = self.project(rectangle.northeast());
        Rectangle::new(sw.x, sw.y, ne.x, ne.y)
    }

    /// Unproject the corners of a projected rectangle into a geographic rectangle.
    pub fn unproject_rectangle_simple(&self, rectangle: &Rectangle) -> GlobeRectangle {
        let sw = self.unproject(rectangle.minimum());
        let ne = self.unproject(rectangle.maximum());
        GlobeRectangle::new(sw.x, sw.y, ne.x, ne.y)
    }
}

fn geodetic_latitude_to_mercator_angle(latitude: f64) -> f64 {
    let sin_latitude = latitude.sin();
    0.5 * ((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln()
}

fn mercator_angle_to_geodetic_latitude(angle: f64) -> f64 {
    FRAC_PI_2 - 2.0 * (-angle).exp().atan()
}

/// Projected extent of the whole globe, the coverage of every flatten overlay.
pub fn whole_globe_rectangle(projection: &Projection) -> Rectangle {
    projection.project_rectangle_simple(&GlobeRectangle::new(-PI, -FRAC_PI_2, PI, FRAC_PI_2))
}

/// Geographic center of pixel `(column, row)` of a `size` texture laid over `rectangle`.
///
/// Row 0 is the northern edge, column 0 the western edge.
pub fn pixel_center(rectangle: &GlobeRectangle, size: TextureSize, column: u32, row: u32) -> DVec2 {
    let x = rectangle.west
        + rectangle.width() * (column as f64 + 0.5) / size.width as f64;
    let y = rectangle.south
        + rectangle.height() * (1.0 - (row as f64 + 0.5) / size.height as f64);
    DVec2::new(x, y)
}
