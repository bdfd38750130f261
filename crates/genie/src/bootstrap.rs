use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use library::{LibraryClient, LibraryConfig};
use readerconfig::ReaderConfig;
use skybox::{decode_texture_file, Rgba, SkyboxMaterial, TransitionDefaults};
use tracing::{debug, info};

use crate::cli::GlobalArgs;
use crate::paths::AppPaths;

/// Effective configuration plus the directory relative paths resolve against.
pub struct Settings {
    pub config: ReaderConfig,
    pub base_dir: PathBuf,
    pub server_override: Option<String>,
}

pub fn load_settings(args: &GlobalArgs, paths: &AppPaths) -> Result<Settings> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.config_file());
    let config = ReaderConfig::load_or_default(&path)
        .with_context(|| format!("failed to load reader config from {}", path.display()))?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_dir().to_path_buf());
    debug!(
        path = %path.display(),
        base = %base_dir.display(),
        exists = path.exists(),
        "resolved reader config"
    );
    let settings = Settings {
        config,
        base_dir,
        server_override: args.server.clone(),
    };
    settings.library_config()?;
    Ok(settings)
}

impl Settings {
    pub fn default_floor_tint(&self) -> Rgba {
        Rgba::from(self.config.floor.default_tint)
    }

    /// Menu background: the configured panorama when it decodes, else a flat dome.
    ///
    /// Both fade through exposure, at `menu.exposure` or the default of 1.0.
    pub fn menu_material(&self) -> SkyboxMaterial {
        let menu = &self.config.menu;
        let exposure = menu.exposure.or(Some(skybox::DEFAULT_EXPOSURE));
        if let Some(path) = self.config.menu_skybox(&self.base_dir) {
            if let Some(image) = decode_texture_file(&path) {
                info!(path = %path.display(), "loaded menu panorama");
                return SkyboxMaterial::panorama("menu", Arc::new(image)).with_exposure(exposure);
            }
            tracing::warn!(path = %path.display(), "menu panorama unavailable; using flat dome");
        }
        SkyboxMaterial::solid("menu", Rgba::from(menu.color)).with_exposure(exposure)
    }

    pub fn transition_defaults(&self) -> TransitionDefaults {
        TransitionDefaults::new(
            Arc::new(self.menu_material()),
            self.default_floor_tint(),
            self.config.transition.duration,
        )
    }

    /// Book server settings; `--server` wins over the config file.
    pub fn library_config(&self) -> Result<LibraryConfig> {
        let base_url = self
            .server_override
            .as_deref()
            .unwrap_or(&self.config.server.base_url);
        LibraryConfig::new(base_url, self.config.server.timeout)
            .context("invalid book server configuration")
    }

    pub fn build_client(&self) -> Result<LibraryClient> {
        let config = self.library_config()?;
        info!(server = %config.base_url, "using book server");
        LibraryClient::new(config).context("failed to construct book server client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(toml: &str) -> Settings {
        Settings {
            config: ReaderConfig::from_toml_str(toml).expect("config"),
            base_dir: PathBuf::from("/nonexistent"),
            server_override: None,
        }
    }

    #[test]
    fn missing_menu_panorama_falls_back_to_flat_dome() {
        let settings = settings(
            r#"
version = 1
[menu]
skybox = "missing.png"
color = [0.1, 0.1, 0.1, 1.0]
"#,
        );
        let menu = settings.menu_material();
        assert_eq!(menu.name(), "menu");
        assert!(matches!(menu.kind(), skybox::BackgroundKind::Solid(_)));
        assert_eq!(menu.exposure(), Some(skybox::DEFAULT_EXPOSURE));
    }

    #[test]
    fn flat_menu_dome_fades_through_exposure() {
        let settings = settings("version = 1");
        let scene = skybox::RasterImage::solid(2, 12, Rgba::WHITE);
        let mut fader = skybox::SkyboxTransitioner::new(settings.transition_defaults());
        fader.show_image("scene", Some(scene));
        fader.update(Duration::from_millis(750));
        fader.reset();

        // A quarter of the way in, the scene has faded halfway out.
        fader.update(Duration::from_micros(187_500));
        assert!((fader.visual_state().exposure - 0.5).abs() < 1e-3);

        // Past the swap, the dome is coming up from zero.
        fader.update(Duration::from_micros(262_500));
        let state = fader.visual_state();
        assert_eq!(state.background.name(), "menu");
        assert!((state.exposure - 0.2).abs() < 1e-3, "{}", state.exposure);
    }

    #[test]
    fn rejects_unusable_server_urls() {
        let mut settings = settings("version = 1");
        for url in ["ftp://books", "http://:", "not a url"] {
            settings.server_override = Some(url.into());
            assert!(settings.library_config().is_err(), "{url}");
        }
    }

    #[test]
    fn transition_defaults_follow_config() {
        let settings = settings(
            r#"
version = 1
[transition]
duration = "2s"
[floor]
default_tint = [0.5, 0.4, 0.3, 1.0]
[menu]
exposure = 0.8
"#,
        );
        let defaults = settings.transition_defaults();
        assert_eq!(defaults.duration, Duration::from_secs(2));
        assert_eq!(defaults.floor_tint, Rgba::new(0.5, 0.4, 0.3, 1.0));
        assert_eq!(defaults.menu.exposure(), Some(0.8));
    }

    #[test]
    fn server_override_wins() {
        let mut settings = settings("version = 1");
        settings.server_override = Some("http://override.local:9000".into());
        let client = settings.build_client().expect("client");
        assert_eq!(
            client.config().base_url.as_str(),
            "http://override.local:9000/"
        );
    }
}
