use anyhow::Result;
use skybox::{decode_texture_file, floor_band_rows, sample_floor_tint};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{load_settings, Settings};
use crate::cli::{Cli, Command, TintArgs};
use crate::paths::AppPaths;
use crate::session;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved genie paths");
    let settings = load_settings(&args.global, &paths)?;

    match args.command {
        Command::Books => list_books(&settings),
        Command::Read(read) => session::read_book(&settings, &read),
        Command::Tint(tint) => print_tint(&settings, &tint),
        Command::Preview(preview) => session::preview(&settings, &preview),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn list_books(settings: &Settings) -> Result<()> {
    let client = settings.build_client()?;
    let books = client.fetch_books()?;
    if books.is_empty() {
        println!("no books available");
        return Ok(());
    }

    for book in &books {
        println!(
            "{:<20} {}  |  Author: {}  |  {}",
            book.id,
            book.title,
            book.author_label(),
            book.scenes_label()
        );
    }
    tracing::info!(count = books.len(), "listed books");
    Ok(())
}

fn print_tint(settings: &Settings, args: &TintArgs) -> Result<()> {
    let default = args.default.unwrap_or_else(|| settings.default_floor_tint());
    let image = decode_texture_file(&args.image);

    match sample_floor_tint(image.as_ref()) {
        Ok(tint) => {
            let (width, height) = image
                .as_ref()
                .map(|image| (image.width(), image.height()))
                .unwrap_or_default();
            let band = floor_band_rows(height);
            println!("image: {} ({width}x{height})", args.image.display());
            println!("sampled rows: {}..{} of {height}", band.start, band.end);
            println!("floor tint: {tint}");
        }
        Err(error) => {
            tracing::warn!(image = %args.image.display(), error = %error, "using default floor tint");
            println!("image: {} (unavailable)", args.image.display());
            println!("floor tint: {default} (default)");
        }
    }
    Ok(())
}
