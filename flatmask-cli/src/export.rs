//! PNG export of mask tiles

use crate::error::{CliError, CliResult};
use flatmask_core::MaskImage;
use image::{ImageFormat, RgbaImage};
use std::path::Path;

/// Write the raw RGBA mask (encoded height in RGB, coverage in A) as a PNG.
pub fn write_mask_png(mask: &MaskImage, path: &Path) -> CliResult<()> {
    let image = RgbaImage::from_raw(mask.width, mask.height, mask.pixel_data.clone())
        .ok_or_else(|| {
            CliError::export(format!(
                "pixel buffer of {} bytes does not match {}x{} RGBA",
                mask.pixel_data.len(),
                mask.width,
                mask.height
            ))
        })?;

    image.save_with_format(path, ImageFormat::Png)?;
    log::info!(
        "Wrote {}x{} mask to {}",
        mask.width,
        mask.height,
        path.display()
    );
    Ok(())
}

/// Fraction of covered pixels, 0.0 for an empty image.
pub fn coverage_fraction(mask: &MaskImage) -> f64 {
    let total = mask.width as usize * mask.height as usize;
    if total == 0 {
        return 0.0;
    }
    mask.covered_pixel_count() as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_png_preserves_pixels() -> CliResult<()> {
        let mask = MaskImage::solid(Some(42.0));
        let dir = tempdir()?;
        let path = dir.path().join("tile.png");

        write_mask_png(&mask, &path)?;

        let decoded = image::open(&path)?.to_rgba8();
        assert_eq!(decoded.dimensions(), (1, 1));
        assert_eq!(decoded.into_raw(), mask.pixel_data);
        Ok(())
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let mut mask = MaskImage::new(2, 2);
        mask.pixel_data.truncate(3);
        let dir = tempdir().unwrap();
        let result = write_mask_png(&mask, &dir.path().join("bad.png"));
        assert!(matches!(result, Err(CliError::Export { .. })));
    }

    #[test]
    fn test_coverage_fraction() {
        assert_eq!(coverage_fraction(&MaskImage::solid(None)), 0.0);
        assert_eq!(coverage_fraction(&MaskImage::solid(Some(1.0))), 1.0);
        assert_eq!(coverage_fraction(&MaskImage::new(0, 0)), 0.0);
    }
}
