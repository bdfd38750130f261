//! Skybox crate for the Genie VR reader.
//!
//! The crate owns everything between a decoded panorama and the values a
//! renderer needs each frame: the live background material, its exposure, and
//! the tint of the floor plane underneath the viewer. The overall flow is:
//!
//! ```text
//!   decode_texture(bytes) ──▶ RasterImage ──▶ compute_floor_tint()
//!                                 │                   │
//!                                 ▼                   ▼
//!                          SkyboxMaterial ──▶ TransitionRequest
//!                                                     │
//!   frame loop ── update(delta) ──▶ SkyboxTransitioner ──▶ visual_state()
//! ```
//!
//! `SkyboxTransitioner` is a plain state machine. Nothing in here spawns
//! threads or sleeps; the caller owns the frame loop and feeds it frame deltas.

mod color;
mod material;
mod raster;
mod timeline;
mod tint;
mod transition;

pub use color::Rgba;
pub use material::{BackgroundKind, SkyboxMaterial, DEFAULT_EXPOSURE, PANORAMA_ROTATION_DEGREES};
pub use raster::{decode_texture, decode_texture_file, RasterImage};
pub use timeline::MIN_HALF_DURATION;
pub use tint::{compute_floor_tint, floor_band_rows, sample_floor_tint, FLOOR_BAND_DIVISOR};
pub use transition::{
    SkyboxTransitioner, TransitionDefaults, TransitionPhase, TransitionRequest, VisualState,
    DEFAULT_TRANSITION_DURATION,
};

/// Degraded inputs reported by the fallible building blocks.
///
/// None of these ever reach the person wearing the headset. The transitioner
/// resolves each of them to a documented fallback and logs the cause.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkyboxError {
    #[error("no decoded image available")]
    MissingImage,
    #[error("transition duration must be positive and finite (got {0}s)")]
    InvalidDuration(f32),
    #[error("material '{0}' has no exposure property")]
    UnsupportedExposureProperty(String),
}
