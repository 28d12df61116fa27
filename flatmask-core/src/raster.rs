use crate::classify::{classify_tile, TileClassification};
use crate::codec::{decode_height_rgb, encode_height_rgb};
use crate::coords::pixel_center;
use crate::types::*;
use glam::DVec2;

/// RGBA: height in RGB, coverage in A.
pub const MASK_CHANNELS: u32 = 4;
pub const MASK_BYTES_PER_CHANNEL: u32 = 1;

const INSIDE_ALPHA: u8 = 0xFF;
const OUTSIDE_ALPHA: u8 = 0x00;

/// Coverage / height mask for one tile.
///
/// Row-major RGBA8, row 0 is the northern edge. A = 255 marks a covered pixel
/// whose RGB holds the big-endian 24-bit encoded flatten height; A = 0 marks an
/// uncovered pixel with zeroed RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskImage {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub bytes_per_channel: u32,
    pub pixel_data: Vec<u8>,
}

impl MaskImage {
    /// Fully uncovered image.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * (MASK_CHANNELS * MASK_BYTES_PER_CHANNEL) as usize;
        Self {
            width,
            height,
            channels: MASK_CHANNELS,
            bytes_per_channel: MASK_BYTES_PER_CHANNEL,
            pixel_data: vec![0; len],
        }
    }

    /// 1x1 image, covered with `height` or uncovered when `None`.
    pub fn solid(height: Option<f32>) -> Self {
        let mut image = Self::new(1, 1);
        if let Some(height) = height {
            image.cover(0, encode_height_rgb(height));
        }
        image
    }

    fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * MASK_CHANNELS as usize)
    }

    fn cover(&mut self, offset: usize, rgb: [u8; 3]) {
        self.pixel_data[offset..offset + 3].copy_from_slice(&rgb);
        self.pixel_data[offset + 3] = INSIDE_ALPHA;
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.pixel_offset(x, y)?;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixel_data[offset..offset + 4]);
        Some(rgba)
    }

    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y)
            .map_or(false, |rgba| rgba[3] == INSIDE_ALPHA)
    }

    /// Decoded flatten height of a covered pixel.
    pub fn height_at(&self, x: u32, y: u32) -> Option<f32> {
        let rgba = self.pixel(x, y)?;
        if rgba[3] == OUTSIDE_ALPHA {
            return None;
        }
        Some(decode_height_rgb([rgba[0], rgba[1], rgba[2]]))
    }

    pub fn covered_pixel_count(&self) -> usize {
        self.pixel_data
            .chunks_exact(MASK_CHANNELS as usize)
            .filter(|rgba| rgba[3] == INSIDE_ALPHA)
            .count()
    }
}

/// Result of rasterizing one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedMask {
    pub image: MaskImage,
    pub classification: TileClassification,
    pub more_detail_available: bool,
}

/// Winding-agnostic point-in-triangle test via edge perpendiculars.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriangleTest {
    a: DVec2,
    c: DVec2,
    ab_perp: DVec2,
    bc_perp: DVec2,
    ca_perp: DVec2,
}

impl TriangleTest {
    pub(crate) fn new([a, b, c]: [DVec2; 3]) -> Self {
        Self {
            a,
            c,
            ab_perp: (b - a).perp(),
            bc_perp: (c - b).perp(),
            ca_perp: (a - c).perp(),
        }
    }

    /// Inclusive of the edges: all projections >= 0 or all <= 0.
    pub(crate) fn contains(&self, point: DVec2) -> bool {
        let av = point - self.a;
        let cv = point - self.c;

        let ab = av.dot(self.ab_perp);
        let bc = cv.dot(self.bc_perp);
        let ca = cv.dot(self.ca_perp);

        (ab >= 0.0 && bc >= 0.0 && ca >= 0.0) || (ab <= 0.0 && bc <= 0.0 && ca <= 0.0)
    }
}

/// Classify the tile and produce its mask.
///
/// Homogeneous tiles collapse to a 1x1 image; mixed tiles are rasterized at
/// `texture_size`.
///
/// # Panics
///
/// `heights` must be index-aligned with `polygons`. A length mismatch is a
/// caller bug and panics rather than being clamped.
pub fn rasterize_polygons(
    rectangle: &GlobeRectangle,
    texture_size: TextureSize,
    polygons: &[Polygon],
    heights: &[f32],
) -> RasterizedMask {
    assert_eq!(
        polygons.len(),
        heights.len(),
        "flatten heights must be index-aligned with polygons"
    );

    let classification = classify_tile(rectangle, polygons);
    let image = match classification {
        TileClassification::WhollyInside(index) => MaskImage::solid(Some(heights[index])),
        TileClassification::WhollyOutside => MaskImage::solid(None),
        TileClassification::Mixed => rasterize_mixed(rectangle, texture_size, polygons, heights),
    };

    log::trace!(
        "Rasterized tile {:?} as {:?} ({}x{})",
        rectangle,
        classification,
        image.width,
        image.height
    );

    RasterizedMask {
        image,
        classification,
        more_detail_available: classification.more_detail_available(),
    }
}

/// Per-pixel rasterization of every triangle of every polygon.
///
/// Polygons and triangles are visited in index order and a covered pixel is
/// overwritten by every later hit, so the last polygon touching a pixel decides
/// its height.
pub fn rasterize_mixed(
    rectangle: &GlobeRectangle,
    texture_size: TextureSize,
    polygons: &[Polygon],
    heights: &[f32],
) -> MaskImage {
    let mut image = MaskImage::new(texture_size.width, texture_size.height);

    // TODO: walk triangle edges per row instead of testing every pixel of the tile
    for (polygon_index, polygon) in polygons.iter().enumerate() {
        let mut encoded: Option<[u8; 3]> = None;

        for triangle in polygon.triangles() {
            let Some(bounds) = GlobeRectangle::from_points(&triangle) else {
                continue;
            };
            if rectangle.compute_intersection(&bounds).is_none() {
                continue;
            }

            let test = TriangleTest::new(triangle);
            let rgb = *encoded.get_or_insert_with(|| encode_height_rgb(heights[polygon_index]));

            for row in 0..texture_size.height {
                for column in 0..texture_size.width {
                    let center = pixel_center(rectangle, texture_size, column, row);
                    if test.contains(center) {
                        let offset = (row as usize * texture_size.width as usize + column as usize)
                            * MASK_CHANNELS as usize;
                        image.cover(offset, rgb);
                    }
                }
            }
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(west: f64, south: f64, east: f64, north: f64) -> Polygon {
        Polygon::new(
            vec![
                DVec2::new(west, south),
                DVec2::new(east, south),
                DVec2::new(east, north),
                DVec2::new(west, north),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    /// Single triangle covering the western column of pixel centers of (0,0)-(2,2).
    fn left_half_triangle() -> Polygon {
        Polygon::new(
            vec![
                DVec2::new(-1.0, -2.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(-1.0, 4.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_test_is_winding_agnostic() {
        let ccw = TriangleTest::new([
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ]);
        let cw = TriangleTest::new([
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 0.0),
        ]);
        for test in [ccw, cw] {
            assert!(test.contains(DVec2::new(0.25, 0.25)));
            assert!(test.contains(DVec2::new(0.5, 0.5)));
            assert!(!test.contains(DVec2::new(0.75, 0.75)));
            assert!(!test.contains(DVec2::new(-0.1, 0.5)));
        }
    }

    #[test]
    fn test_mask_image_layout() {
        let image = MaskImage::new(3, 2);
        assert_eq!(image.pixel_data.len(), 3 * 2 * 4);
        assert_eq!(image.channels, 4);
        assert_eq!(image.bytes_per_channel, 1);
        assert_eq!(image.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.covered_pixel_count(), 0);
    }

    #[test]
    fn test_wholly_inside_produces_single_covered_pixel() {
        let polygons = vec![square(0.0, 0.0, 4.0, 4.0), square(0.0, 0.0, 4.0, 4.0)];
        let heights = vec![120.5, -3.0];
        let tile = GlobeRectangle::new(1.0, 1.0, 2.0, 2.0);

        let mask = rasterize_polygons(&tile, TextureSize::new(64, 64), &polygons, &heights);
        assert_eq!(mask.classification, TileClassification::WhollyInside(0));
        assert!(!mask.more_detail_available);
        assert_eq!((mask.image.width, mask.image.height), (1, 1));

        let [r, g, b] = encode_height_rgb(120.5);
        assert_eq!(mask.image.pixel_data, vec![r, g, b, 255]);
        assert_eq!(mask.image.height_at(0, 0), Some(120.5));
    }

    #[test]
    fn test_wholly_outside_produces_single_empty_pixel() {
        let polygons = vec![square(0.0, 0.0, 1.0, 1.0)];
        let tile = GlobeRectangle::new(5.0, 5.0, 6.0, 6.0);

        let mask = rasterize_polygons(&tile, TextureSize::new(64, 64), &polygons, &[10.0]);
        assert_eq!(mask.classification, TileClassification::WhollyOutside);
        assert!(!mask.more_detail_available);
        assert_eq!(mask.image.pixel_data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_mixed_tile_left_half() {
        let polygons = vec![left_half_triangle()];
        let tile = GlobeRectangle::new(0.0, 0.0, 2.0, 2.0);

        let mask = rasterize_polygons(&tile, TextureSize::new(2, 2), &polygons, &[75.0]);
        assert_eq!(mask.classification, TileClassification::Mixed);
        assert!(mask.more_detail_available);
        assert_eq!((mask.image.width, mask.image.height), (2, 2));

        let [r, g, b] = encode_height_rgb(75.0);
        for row in 0..2 {
            assert_eq!(mask.image.pixel(0, row), Some([r, g, b, 255]));
            assert_eq!(mask.image.pixel(1, row), Some([0, 0, 0, 0]));
        }
        assert_eq!(mask.image.covered_pixel_count(), 2);
    }

    #[test]
    fn test_row_zero_is_north() {
        // Covers only the northern half of the tile
        let polygons = vec![square(-1.0, 1.0, 3.0, 3.0)];
        let tile = GlobeRectangle::new(0.0, 0.0, 2.0, 2.0);

        let image = rasterize_mixed(&tile, TextureSize::new(2, 2), &polygons, &[1.0]);
        assert!(image.is_covered(0, 0));
        assert!(image.is_covered(1, 0));
        assert!(!image.is_covered(0, 1));
        assert!(!image.is_covered(1, 1));
    }

    #[test]
    fn test_overlap_last_polygon_wins() {
        let polygons = vec![square(-1.0, -1.0, 3.0, 3.0), square(1.0, -1.0, 3.0, 3.0)];
        let tile = GlobeRectangle::new(0.0, 0.0, 2.0, 2.0);

        let image = rasterize_mixed(&tile, TextureSize::new(2, 2), &polygons, &[10.0, 20.0]);
        assert_eq!(image.height_at(0, 0), Some(10.0));
        assert_eq!(image.height_at(1, 0), Some(20.0));
        assert_eq!(image.height_at(1, 1), Some(20.0));
    }

    #[test]
    fn test_triangles_outside_tile_are_skipped() {
        let polygons = vec![square(10.0, 10.0, 11.0, 11.0), left_half_triangle()];
        let tile = GlobeRectangle::new(0.0, 0.0, 2.0, 2.0);

        let image = rasterize_mixed(&tile, TextureSize::new(4, 4), &polygons, &[1.0, 2.0]);
        assert_eq!(image.height_at(0, 0), Some(2.0));
        assert_eq!(image.height_at(3, 3), None);
    }

    #[test]
    fn test_rasterization_is_deterministic() {
        let polygons = vec![left_half_triangle(), square(0.5, 0.5, 1.5, 1.5)];
        let tile = GlobeRectangle::new(0.0, 0.0, 2.0, 2.0);
        let size = TextureSize::new(16, 16);

        let first = rasterize_polygons(&tile, size, &polygons, &[1.0, 2.0]);
        let second = rasterize_polygons(&tile, size, &polygons, &[1.0, 2.0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tile_across_concave_notch_is_rasterized() {
        // "C" opening to the east; the tile's north and south sides run along the notch
        let c_shape = Polygon::from_outline(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(3.0, 2.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(0.0, 3.0),
        ])
        .unwrap();
        let tile = GlobeRectangle::new(0.5, 1.0, 2.5, 2.0);

        let mask = rasterize_polygons(&tile, TextureSize::new(4, 4), &[c_shape], &[9.0]);
        assert_eq!(mask.classification, TileClassification::Mixed);
        assert_eq!((mask.image.width, mask.image.height), (4, 4));
        // Only the western column falls inside the spine
        assert_eq!(mask.image.covered_pixel_count(), 4);
        for row in 0..4 {
            assert!(mask.image.is_covered(0, row));
            assert!(!mask.image.is_covered(1, row));
        }
    }

    #[test]
    #[should_panic(expected = "index-aligned")]
    fn test_height_count_mismatch_panics() {
        let polygons = vec![square(0.0, 0.0, 1.0, 1.0)];
        let tile = GlobeRectangle::new(0.0, 0.0, 1.0, 1.0);
        rasterize_polygons(&tile, TextureSize::new(2, 2), &polygons, &[]);
    }
}
