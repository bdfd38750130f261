use std::sync::Arc;

use crate::color::Rgba;
use crate::raster::RasterImage;
use crate::SkyboxError;

/// Exposure assumed for materials that do not carry one.
pub const DEFAULT_EXPOSURE: f32 = 1.0;

/// Yaw applied to scene panoramas so the illustration's centre faces the reader.
pub const PANORAMA_ROTATION_DEGREES: f32 = 90.0;

/// What the background draws.
#[derive(Debug, Clone)]
pub enum BackgroundKind {
    /// Equirectangular 360° image.
    Panoramic(Arc<RasterImage>),
    /// Flat colour dome, used when no menu panorama is configured.
    Solid(Rgba),
}

/// Resolved background material.
///
/// Whether the material can be faded is decided once, when the descriptor is
/// built: `exposure` is `None` for materials without an exposure control.
#[derive(Debug, Clone)]
pub struct SkyboxMaterial {
    name: String,
    kind: BackgroundKind,
    exposure: Option<f32>,
    rotation_degrees: f32,
}

impl SkyboxMaterial {
    /// Scene panorama: rotated by [`PANORAMA_ROTATION_DEGREES`], natural exposure 1.0.
    pub fn panorama(name: impl Into<String>, image: Arc<RasterImage>) -> Self {
        Self {
            name: name.into(),
            kind: BackgroundKind::Panoramic(image),
            exposure: Some(DEFAULT_EXPOSURE),
            rotation_degrees: PANORAMA_ROTATION_DEGREES,
        }
    }

    /// Solid dome without an exposure control.
    pub fn solid(name: impl Into<String>, color: Rgba) -> Self {
        Self {
            name: name.into(),
            kind: BackgroundKind::Solid(color.clamped()),
            exposure: None,
            rotation_degrees: 0.0,
        }
    }

    /// Overrides the natural exposure. Negative values clamp to zero; non-finite
    /// values drop the exposure control entirely.
    pub fn with_exposure(mut self, exposure: Option<f32>) -> Self {
        self.exposure = match exposure {
            Some(value) if value.is_finite() => Some(value.max(0.0)),
            Some(value) => {
                tracing::warn!(
                    material = %self.name,
                    exposure = value,
                    "ignoring non-finite exposure"
                );
                None
            }
            None => None,
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BackgroundKind {
        &self.kind
    }

    pub fn exposure(&self) -> Option<f32> {
        self.exposure
    }

    pub fn supports_exposure(&self) -> bool {
        self.exposure.is_some()
    }

    /// Exposure the material has when applied without any fade.
    pub fn natural_exposure(&self) -> f32 {
        self.exposure.unwrap_or(DEFAULT_EXPOSURE)
    }

    pub fn require_exposure(&self) -> Result<f32, SkyboxError> {
        self.exposure
            .ok_or_else(|| SkyboxError::UnsupportedExposureProperty(self.name.clone()))
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }
}
