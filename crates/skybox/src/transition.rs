use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::color::Rgba;
use crate::material::{SkyboxMaterial, DEFAULT_EXPOSURE};
use crate::raster::RasterImage;
use crate::timeline::{lerp, FadeClock, MIN_HALF_DURATION};
use crate::tint::compute_floor_tint;
use crate::SkyboxError;

/// Default fade-out plus fade-in time for scene changes.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_millis(750);

/// What the renderer should draw this frame.
#[derive(Debug, Clone)]
pub struct VisualState {
    pub background: Arc<SkyboxMaterial>,
    pub exposure: f32,
    pub floor_tint: Rgba,
}

impl VisualState {
    fn settled(background: Arc<SkyboxMaterial>, floor_tint: Rgba) -> Self {
        Self {
            exposure: background.natural_exposure(),
            background,
            floor_tint,
        }
    }
}

/// Target of a fade. Immutable once built.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    target_background: Arc<SkyboxMaterial>,
    target_floor_tint: Rgba,
    duration: Duration,
}

impl TransitionRequest {
    pub fn new(
        target_background: Arc<SkyboxMaterial>,
        target_floor_tint: Rgba,
        duration: Duration,
    ) -> Result<Self, SkyboxError> {
        if duration.is_zero() {
            return Err(SkyboxError::InvalidDuration(0.0));
        }
        Ok(Self {
            target_background,
            target_floor_tint: target_floor_tint.clamped(),
            duration,
        })
    }

    /// Same as [`TransitionRequest::new`] for a duration in seconds; rejects
    /// zero, negative, and non-finite values.
    pub fn from_secs(
        target_background: Arc<SkyboxMaterial>,
        target_floor_tint: Rgba,
        seconds: f32,
    ) -> Result<Self, SkyboxError> {
        let duration = Duration::try_from_secs_f32(seconds)
            .map_err(|_| SkyboxError::InvalidDuration(seconds))?;
        if duration.is_zero() {
            return Err(SkyboxError::InvalidDuration(seconds));
        }
        Self::new(target_background, target_floor_tint, duration)
    }

    pub fn half_duration(&self) -> Duration {
        (self.duration / 2).max(MIN_HALF_DURATION)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    FadingOut,
    FadingIn,
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPhase::Idle => f.write_str("idle"),
            TransitionPhase::FadingOut => f.write_str("fading-out"),
            TransitionPhase::FadingIn => f.write_str("fading-in"),
        }
    }
}

/// Values the transitioner falls back to: the menu background, the floor tint
/// used when a panorama has nothing to sample, and the scene-change duration.
#[derive(Debug, Clone)]
pub struct TransitionDefaults {
    pub menu: Arc<SkyboxMaterial>,
    pub floor_tint: Rgba,
    pub duration: Duration,
}

impl TransitionDefaults {
    pub fn new(menu: Arc<SkyboxMaterial>, floor_tint: Rgba, duration: Duration) -> Self {
        let minimum = MIN_HALF_DURATION * 2;
        let duration = if duration < minimum {
            tracing::warn!(
                requested_ms = duration.as_millis(),
                minimum_us = minimum.as_micros(),
                "transition duration too short; using minimum"
            );
            minimum
        } else {
            duration
        };
        Self {
            menu,
            floor_tint: floor_tint.clamped(),
            duration,
        }
    }
}

#[derive(Debug)]
struct FadeOut {
    clock: FadeClock,
    start_exposure: Option<f32>,
    start_tint: Rgba,
    request: TransitionRequest,
}

#[derive(Debug)]
struct FadeIn {
    clock: FadeClock,
    target_exposure: Option<f32>,
}

#[derive(Debug)]
enum Fade {
    Idle,
    Out(FadeOut),
    In(FadeIn),
}

/// Owns the live skybox and floor tint and fades between them.
///
/// A transition fades the current background's exposure to zero while the
/// floor tint blends to the target, swaps backgrounds at zero exposure, then
/// fades the new background up to its natural exposure. Each half takes
/// `duration / 2` of simulated time, accumulated from `update` deltas.
#[derive(Debug)]
pub struct SkyboxTransitioner {
    state: VisualState,
    fade: Fade,
    defaults: TransitionDefaults,
}

impl SkyboxTransitioner {
    /// Starts idle on the menu background with the default floor tint.
    pub fn new(defaults: TransitionDefaults) -> Self {
        let state = VisualState::settled(defaults.menu.clone(), defaults.floor_tint);
        Self {
            state,
            fade: Fade::Idle,
            defaults,
        }
    }

    pub fn visual_state(&self) -> &VisualState {
        &self.state
    }

    pub fn phase(&self) -> TransitionPhase {
        match self.fade {
            Fade::Idle => TransitionPhase::Idle,
            Fade::Out(_) => TransitionPhase::FadingOut,
            Fade::In(_) => TransitionPhase::FadingIn,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.fade, Fade::Idle)
    }

    /// Cancels any running fade and starts a new one from the live values.
    pub fn request_transition(&mut self, request: TransitionRequest) {
        if !self.is_idle() {
            tracing::debug!(
                phase = ?self.phase(),
                background = %self.state.background.name(),
                exposure = self.state.exposure,
                "cancelling in-flight skybox transition"
            );
        }

        let start_exposure = match self.state.background.require_exposure() {
            Ok(_) => Some(self.state.exposure),
            Err(error) => {
                tracing::debug!(error = %error, "outgoing background fades without exposure");
                None
            }
        };

        tracing::info!(
            from = %self.state.background.name(),
            to = %request.target_background.name(),
            floor_tint = %request.target_floor_tint,
            duration_ms = request.duration.as_millis(),
            "starting skybox transition"
        );

        self.fade = Fade::Out(FadeOut {
            clock: FadeClock::new(request.half_duration()),
            start_exposure,
            start_tint: self.state.floor_tint,
            request,
        });
    }

    /// Fades to `background` with `floor_tint` using the default duration.
    pub fn transition_to(&mut self, background: Arc<SkyboxMaterial>, floor_tint: Rgba) {
        self.request_transition(TransitionRequest {
            target_background: background,
            target_floor_tint: floor_tint.clamped(),
            duration: self.defaults.duration,
        });
    }

    /// Fades to a scene panorama, tinting the floor from its bottom band.
    ///
    /// `None` or an empty image returns to the menu background.
    pub fn show_image(&mut self, name: impl Into<String>, image: Option<RasterImage>) {
        let Some(image) = image.filter(|image| !image.is_empty()) else {
            tracing::debug!("no panorama available; resetting skybox");
            self.reset();
            return;
        };
        let floor_tint = compute_floor_tint(Some(&image), self.defaults.floor_tint);
        let material = SkyboxMaterial::panorama(name, Arc::new(image));
        self.transition_to(Arc::new(material), floor_tint);
    }

    /// Fades back to the menu background and default floor tint.
    pub fn reset(&mut self) {
        let menu = self.defaults.menu.clone();
        let tint = self.defaults.floor_tint;
        self.transition_to(menu, tint);
    }

    /// Advances the running fade by one frame's worth of time.
    pub fn update(&mut self, delta: Duration) -> TransitionPhase {
        let mut remaining = delta;
        loop {
            match std::mem::replace(&mut self.fade, Fade::Idle) {
                Fade::Idle => break,
                Fade::Out(mut out) => {
                    remaining = out.clock.advance(remaining);
                    let u = out.clock.progress();
                    if let Some(start) = out.start_exposure {
                        self.state.exposure = lerp(start, 0.0, u);
                    }
                    self.state.floor_tint =
                        out.start_tint.lerp(out.request.target_floor_tint, u);
                    tracing::trace!(
                        u,
                        exposure = self.state.exposure,
                        floor_tint = %self.state.floor_tint,
                        "fading out"
                    );

                    if out.clock.is_finished() {
                        self.swap(out.request);
                    } else {
                        self.fade = Fade::Out(out);
                        break;
                    }
                }
                Fade::In(mut fade_in) => {
                    fade_in.clock.advance(remaining);
                    let u = fade_in.clock.progress();
                    if let Some(target) = fade_in.target_exposure {
                        self.state.exposure = lerp(0.0, target, u);
                    }
                    tracing::trace!(u, exposure = self.state.exposure, "fading in");

                    if fade_in.clock.is_finished() {
                        self.state.exposure = self.state.background.natural_exposure();
                        tracing::debug!(
                            background = %self.state.background.name(),
                            exposure = self.state.exposure,
                            "skybox transition complete"
                        );
                    } else {
                        self.fade = Fade::In(fade_in);
                    }
                    break;
                }
            }
        }
        self.phase()
    }

    fn swap(&mut self, request: TransitionRequest) {
        let target_exposure = match request.target_background.require_exposure() {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(error = %error, "incoming background appears without exposure fade");
                None
            }
        };
        let half = request.half_duration();

        self.state.background = request.target_background;
        self.state.floor_tint = request.target_floor_tint;
        self.state.exposure = if target_exposure.is_some() {
            0.0
        } else {
            DEFAULT_EXPOSURE
        };
        tracing::debug!(
            background = %self.state.background.name(),
            "swapped skybox background"
        );

        self.fade = Fade::In(FadeIn {
            clock: FadeClock::new(half),
            target_exposure,
        });
    }
}
