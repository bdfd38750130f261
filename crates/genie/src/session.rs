use std::path::Path;

use anyhow::{bail, Context, Result};
use library::{LibraryClient, Reader, SceneView, SkyboxCue};
use skybox::{decode_texture, decode_texture_file, SkyboxTransitioner, TransitionDefaults};
use tracing::{debug, info, warn};

use crate::bootstrap::Settings;
use crate::cli::{PreviewArgs, ReadArgs};
use crate::frames::{describe_background, FrameLoop};

/// Fetches a book and pages through it the way the headset reader would.
pub fn read_book(settings: &Settings, args: &ReadArgs) -> Result<()> {
    let client = settings.build_client()?;
    let book = client
        .fetch_book(&args.book)
        .with_context(|| format!("failed to fetch book '{}'", args.book))?;

    println!("{} by {}", book.title, book.author_label());

    let mut skybox = SkyboxTransitioner::new(settings.transition_defaults());
    let mut frames = frame_loop(settings, args.fps, args.realtime)?;
    debug!(step_us = frames.step().as_micros(), realtime = args.realtime, "frame loop ready");

    let limit = args.scenes.unwrap_or(usize::MAX);
    let mut reader = Reader::new();
    let mut view = reader.open(book);
    if view.is_none() {
        println!("(book has no scenes)");
    }

    let mut shown = 0;
    while let Some(scene) = view {
        present_scene(&scene);
        apply_cue(&client, &mut skybox, &scene.cue);
        frames.run_until_idle(&mut skybox, |_| {});
        let state = skybox.visual_state();
        println!(
            "  skybox: {}  floor: {}",
            describe_background(&state.background),
            state.floor_tint
        );
        frames.hold(&mut skybox, settings.config.playback.scene_hold);

        shown += 1;
        if shown >= limit {
            info!(shown, "scene limit reached");
            break;
        }
        view = reader.next();
    }

    let cue = reader.menu();
    apply_cue(&client, &mut skybox, &cue);
    frames.run_until_idle(&mut skybox, |_| {});
    println!("back at menu  floor: {}", skybox.visual_state().floor_tint);
    Ok(())
}

/// Frame loop at `fps` when given, else at the configured `playback.fps`.
fn frame_loop(settings: &Settings, fps: Option<f32>, realtime: bool) -> Result<FrameLoop> {
    let step = match fps {
        Some(fps) => readerconfig::step_for_fps(fps)
            .with_context(|| format!("frame rate {fps} does not give a usable frame step"))?,
        None => settings.config.frame_step()?,
    };
    Ok(FrameLoop::new(step, realtime))
}

fn present_scene(scene: &SceneView) {
    let prev = if scene.has_prev { "<" } else { " " };
    let next = if scene.has_next { ">" } else { " " };
    println!();
    println!("{prev} scene {}/{} {next}", scene.index + 1, scene.count);
    println!("{}", scene.text.trim());
}

fn apply_cue(client: &LibraryClient, skybox: &mut SkyboxTransitioner, cue: &SkyboxCue) {
    match cue {
        SkyboxCue::Panorama(path) => {
            let image = match client.fetch_static(path) {
                Ok(bytes) => decode_texture(&bytes),
                Err(error) => {
                    warn!(path = %path, error = %error, "failed to load skybox texture");
                    None
                }
            };
            skybox.show_image(path.as_str(), image);
        }
        SkyboxCue::Reset => skybox.reset(),
    }
}

/// Fades through local panoramas and prints every sampled frame.
pub fn preview(settings: &Settings, args: &PreviewArgs) -> Result<()> {
    if args.every == 0 {
        bail!("--every must be at least 1");
    }

    let mut defaults = settings.transition_defaults();
    if let Some(duration) = args.duration {
        defaults = TransitionDefaults::new(defaults.menu, defaults.floor_tint, duration);
    }
    let mut skybox = SkyboxTransitioner::new(defaults);
    let mut frames = frame_loop(settings, args.fps, false)?;

    for path in &args.images {
        println!("-> {}", path.display());
        skybox.show_image(image_label(path), decode_texture_file(path));

        let every = u64::from(args.every);
        let last = frames.run_until_idle(&mut skybox, |sample| {
            if sample.frame % every == 0 {
                println!("{sample}");
            }
        });
        if let Some(last) = last {
            if last.frame % every != 0 {
                println!("{last}");
            }
        }
    }
    Ok(())
}

fn image_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
