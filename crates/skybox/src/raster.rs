use std::fs;
use std::path::Path;

use image::imageops::flip_vertical_in_place;
use image::DynamicImage;

use crate::color::Rgba;

/// Decoded raster with RGBA channels in `[0, 1]`.
///
/// Rows are stored bottom-up: row 0 is the bottom edge of the picture, the same
/// orientation a texture has once it is uploaded for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl RasterImage {
    /// Builds an image by evaluating `f(x, y)` with `y = 0` at the bottom row.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y).clamped());
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Contiguous pixels of rows `start..end`, clipped to the image height.
    pub fn rows(&self, start: u32, end: u32) -> &[Rgba] {
        let end = end.min(self.height);
        let start = start.min(end);
        let stride = self.width as usize;
        &self.pixels[start as usize * stride..end as usize * stride]
    }

    fn from_dynamic(image: DynamicImage) -> Self {
        let mut buffer = image.to_rgba32f();
        flip_vertical_in_place(&mut buffer);
        let (width, height) = buffer.dimensions();
        let pixels = buffer
            .pixels()
            .map(|pixel| {
                let [r, g, b, a] = pixel.0;
                Rgba::new(r, g, b, a).clamped()
            })
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Decodes an encoded picture (PNG, JPEG, BMP, GIF).
///
/// Failures are logged and reported as "no image available".
pub fn decode_texture(bytes: &[u8]) -> Option<RasterImage> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let raster = RasterImage::from_dynamic(decoded);
            tracing::debug!(
                width = raster.width,
                height = raster.height,
                "decoded panorama texture"
            );
            Some(raster)
        }
        Err(error) => {
            tracing::warn!(
                bytes = bytes.len(),
                error = %error,
                "failed to decode texture; treating as missing image"
            );
            None
        }
    }
}

pub fn decode_texture_file(path: &Path) -> Option<RasterImage> {
    match fs::read(path) {
        Ok(bytes) => decode_texture(&bytes),
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read texture file; treating as missing image"
            );
            None
        }
    }
}
