use std::ops::Range;

use crate::color::Rgba;
use crate::raster::RasterImage;
use crate::SkyboxError;

/// The floor band covers `1 / FLOOR_BAND_DIVISOR` of the panorama height.
pub const FLOOR_BAND_DIVISOR: u32 = 12;

/// Rows sampled for the floor tint: the bottom twelfth, at least one row.
pub fn floor_band_rows(height: u32) -> Range<u32> {
    0..(height / FLOOR_BAND_DIVISOR).max(1).min(height)
}

/// Averages the floor band of `image` per channel.
///
/// The bottom of an equirectangular panorama approximates the ground colour,
/// which is what the floor plane under the viewer should blend into.
pub fn sample_floor_tint(image: Option<&RasterImage>) -> Result<Rgba, SkyboxError> {
    let image = image.ok_or(SkyboxError::MissingImage)?;
    let band = floor_band_rows(image.height());
    let pixels = image.rows(band.start, band.end);
    if pixels.is_empty() {
        return Err(SkyboxError::MissingImage);
    }

    let mut sums = [0.0f64; 4];
    for pixel in pixels {
        for (sum, channel) in sums.iter_mut().zip(pixel.to_array()) {
            *sum += f64::from(channel);
        }
    }
    let count = pixels.len() as f64;
    let [r, g, b, a] = sums.map(|sum| (sum / count) as f32);
    Ok(Rgba::new(r, g, b, a).clamped())
}

/// Floor tint for `image`, or `default` when there is nothing to sample.
pub fn compute_floor_tint(image: Option<&RasterImage>, default: Rgba) -> Rgba {
    match sample_floor_tint(image) {
        Ok(tint) => tint,
        Err(error) => {
            tracing::debug!(error = %error, %default, "using default floor tint");
            default
        }
    }
}
