use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use skybox::{BackgroundKind, Rgba, SkyboxMaterial, SkyboxTransitioner, TransitionPhase};

/// Upper bound on frames spent waiting for one transition.
const MAX_FRAMES_PER_TRANSITION: u64 = 1_000_000;

/// What the renderer would present for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub frame: u64,
    pub time: Duration,
    pub phase: TransitionPhase,
    pub background: String,
    pub exposure: f32,
    pub floor_tint: Rgba,
}

impl fmt::Display for FrameSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6} {:>9.3}s  {:<10}  {:<24}  exposure={:.3}  floor={}",
            self.frame,
            self.time.as_secs_f64(),
            self.phase.to_string(),
            self.background,
            self.exposure,
            self.floor_tint
        )
    }
}

/// One-line summary of what a background draws.
pub fn describe_background(material: &SkyboxMaterial) -> String {
    match material.kind() {
        BackgroundKind::Panoramic(image) => format!(
            "{} ({}x{} panorama, yaw {}°)",
            material.name(),
            image.width(),
            image.height(),
            material.rotation_degrees()
        ),
        BackgroundKind::Solid(color) => format!("{} (flat {color})", material.name()),
    }
}

/// Fixed-step render loop driving a [`SkyboxTransitioner`].
///
/// In realtime mode each frame sleeps for whatever is left of its step, so a
/// transition plays at wall-clock speed; otherwise frames are simulated.
pub struct FrameLoop {
    step: Duration,
    realtime: bool,
    frame: u64,
    time: Duration,
}

impl FrameLoop {
    pub fn new(step: Duration, realtime: bool) -> Self {
        Self {
            step: step.max(Duration::from_micros(100)),
            realtime,
            frame: 0,
            time: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Advances the transitioner by one frame and samples the result.
    pub fn tick(&mut self, skybox: &mut SkyboxTransitioner) -> FrameSample {
        let started = Instant::now();
        let phase = skybox.update(self.step);
        self.frame += 1;
        self.time = self.time.saturating_add(self.step);

        let state = skybox.visual_state();
        let sample = FrameSample {
            frame: self.frame,
            time: self.time,
            phase,
            background: state.background.name().to_string(),
            exposure: state.exposure,
            floor_tint: state.floor_tint,
        };
        tracing::trace!(
            frame = sample.frame,
            phase = %sample.phase,
            exposure = sample.exposure,
            "presented frame"
        );

        if self.realtime {
            if let Some(remaining) = self.step.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
        sample
    }

    /// Ticks until the transitioner is idle, handing every frame to `on_frame`.
    pub fn run_until_idle(
        &mut self,
        skybox: &mut SkyboxTransitioner,
        mut on_frame: impl FnMut(&FrameSample),
    ) -> Option<FrameSample> {
        let mut last = None;
        let mut frames = 0u64;
        while !skybox.is_idle() {
            let sample = self.tick(skybox);
            on_frame(&sample);
            last = Some(sample);
            frames += 1;
            if frames >= MAX_FRAMES_PER_TRANSITION {
                tracing::warn!(frames, "transition did not settle; giving up");
                break;
            }
        }
        last
    }

    /// Keeps rendering a settled scene for `duration`.
    pub fn hold(&mut self, skybox: &mut SkyboxTransitioner, duration: Duration) {
        let mut held = Duration::ZERO;
        while held < duration {
            self.tick(skybox);
            held = held.saturating_add(self.step);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use skybox::{RasterImage, SkyboxMaterial, TransitionDefaults};

    fn transitioner(duration: Duration) -> SkyboxTransitioner {
        let menu = Arc::new(SkyboxMaterial::solid("menu", Rgba::BLACK).with_exposure(Some(1.0)));
        SkyboxTransitioner::new(TransitionDefaults::new(menu, Rgba::GREY, duration))
    }

    #[test]
    fn runs_a_transition_to_completion() {
        let mut skybox = transitioner(Duration::from_millis(200));
        skybox.show_image("scene", Some(RasterImage::solid(2, 12, Rgba::WHITE)));
        let mut frames = FrameLoop::new(Duration::from_millis(10), false);
        let mut seen = Vec::new();
        let last = frames
            .run_until_idle(&mut skybox, |sample| seen.push(sample.phase))
            .expect("at least one frame");

        assert_eq!(seen.len(), 20);
        assert_eq!(last.phase, TransitionPhase::Idle);
        assert_eq!(last.background, "scene");
        assert_eq!(last.exposure, 1.0);
        assert_eq!(last.floor_tint, Rgba::WHITE);
        assert_eq!(last.time, Duration::from_millis(200));
        assert!(seen.contains(&TransitionPhase::FadingOut));
        assert!(seen.contains(&TransitionPhase::FadingIn));
    }

    #[test]
    fn describes_panoramas_and_flat_domes() {
        let image = Arc::new(RasterImage::solid(8, 4, Rgba::WHITE));
        let pano = SkyboxMaterial::panorama("alice/0.png", image);
        assert_eq!(
            describe_background(&pano),
            "alice/0.png (8x4 panorama, yaw 90°)"
        );
        let dome = SkyboxMaterial::solid("menu", Rgba::BLACK);
        assert_eq!(
            describe_background(&dome),
            "menu (flat (0.000, 0.000, 0.000, 1.000))"
        );
    }

    #[test]
    fn idle_transitioner_produces_no_frames() {
        let mut skybox = transitioner(Duration::from_millis(200));
        let mut frames = FrameLoop::new(Duration::from_millis(10), false);
        assert!(frames.run_until_idle(&mut skybox, |_| {}).is_none());

        frames.hold(&mut skybox, Duration::from_millis(35));
        let sample = frames.tick(&mut skybox);
        assert_eq!(sample.frame, 5);
        assert_eq!(sample.phase, TransitionPhase::Idle);
    }
}
