use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use skybox::Rgba;

#[derive(Parser, Debug)]
#[command(
    name = "genie",
    author,
    version,
    about = "Genie VR book reader client",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub struct GlobalArgs {
    /// Reader configuration TOML (defaults to `<config dir>/config.toml`).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Book server base URL; overrides `server.base_url` from the config.
    #[arg(long, global = true, env = "GENIE_SERVER", value_name = "URL")]
    pub server: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the books available on the server.
    Books,
    /// Page through a book, fading the skybox to each scene's panorama.
    Read(ReadArgs),
    /// Print the floor tint sampled from a local panorama.
    Tint(TintArgs),
    /// Simulate transitions between local panoramas and print the timeline.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Book identifier as listed by `genie books`.
    #[arg(value_name = "BOOK_ID")]
    pub book: String,

    /// Stop after this many scenes.
    #[arg(long, value_name = "COUNT")]
    pub scenes: Option<usize>,

    /// Frame rate of the simulated render loop; overrides `playback.fps`.
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Sleep between frames so transitions play at wall-clock speed.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Parser, Debug)]
pub struct TintArgs {
    /// Panorama image (PNG, JPEG, BMP, GIF).
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Tint reported when the image cannot be decoded, as `r,g,b[,a]`.
    #[arg(long, value_name = "RGBA", value_parser = parse_rgba)]
    pub default: Option<Rgba>,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Panoramas to fade through in order; unreadable files fade to the menu.
    #[arg(value_name = "IMAGE", required = true)]
    pub images: Vec<PathBuf>,

    /// Transition duration (e.g. `750ms`, `2s`); overrides `transition.duration`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Frame rate of the simulated render loop; overrides `playback.fps`.
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Print every Nth frame.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub every: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_rgba(value: &str) -> Result<Rgba, String> {
    value.parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if readerconfig::step_for_fps(fps).is_none() {
        return Err(format!(
            "frame rate {fps} must be positive and give a usable frame step"
        ));
    }
    Ok(fps)
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".to_string());
    }
    let duration = match trimmed.parse::<f64>() {
        Ok(seconds) if seconds.is_sign_negative() => {
            return Err("duration must be non-negative".to_string())
        }
        Ok(seconds) => Duration::try_from_secs_f64(seconds)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?,
        Err(_) => humantime::parse_duration(trimmed)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?,
    };
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}
