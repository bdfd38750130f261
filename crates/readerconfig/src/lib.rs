use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    pub version: u32,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub transition: TransitionSection,
    #[serde(default)]
    pub floor: FloorSection,
    #[serde(default)]
    pub menu: MenuSection,
    #[serde(default)]
    pub playback: PlaybackSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Book server root; parsed and checked when the client is built.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionSection {
    #[serde(
        default = "default_transition",
        deserialize_with = "deserialize_duration"
    )]
    pub duration: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FloorSection {
    #[serde(default = "default_floor_tint")]
    pub default_tint: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuSection {
    /// Panorama shown while browsing books; a flat dome when unset.
    pub skybox: Option<PathBuf>,
    pub exposure: Option<f32>,
    #[serde(default = "default_menu_color")]
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSection {
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// How long the reader lingers on a settled scene before paging on.
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub scene_hold: Duration,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_transition() -> Duration {
    Duration::from_millis(750)
}

fn default_floor_tint() -> [f32; 4] {
    [0.25, 0.25, 0.25, 1.0]
}

fn default_menu_color() -> [f32; 4] {
    [0.05, 0.05, 0.08, 1.0]
}

fn default_fps() -> f32 {
    60.0
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for TransitionSection {
    fn default() -> Self {
        Self {
            duration: default_transition(),
        }
    }
}

impl Default for FloorSection {
    fn default() -> Self {
        Self {
            default_tint: default_floor_tint(),
        }
    }
}

impl Default for MenuSection {
    fn default() -> Self {
        Self {
            skybox: None,
            exposure: None,
            color: default_menu_color(),
        }
    }
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            scene_hold: Duration::ZERO,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            transition: TransitionSection::default(),
            floor: FloorSection::default(),
            menu: MenuSection::default(),
            playback: PlaybackSection::default(),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v.trim())
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl ReaderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ReaderConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Menu panorama path, resolved against `base` when relative.
    pub fn menu_skybox(&self, base: &Path) -> Option<PathBuf> {
        self.menu.skybox.as_ref().map(|path| {
            if path.is_relative() {
                base.join(path)
            } else {
                path.clone()
            }
        })
    }

    /// Fixed frame step derived from `playback.fps`.
    pub fn frame_step(&self) -> Result<Duration, ConfigError> {
        step_for_fps(self.playback.fps).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "playback.fps {} does not give a usable frame step",
                self.playback.fps
            ))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.base_url must not be empty".into(),
            ));
        }

        if self.server.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "server.timeout must be greater than zero".into(),
            ));
        }

        if self.transition.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "transition.duration must be greater than zero".into(),
            ));
        }

        validate_color("floor.default_tint", &self.floor.default_tint)?;
        validate_color("menu.color", &self.menu.color)?;

        if let Some(exposure) = self.menu.exposure {
            if !exposure.is_finite() || exposure < 0.0 {
                return Err(ConfigError::Invalid(
                    "menu.exposure must be a finite value >= 0".into(),
                ));
            }
        }

        if let Some(skybox) = &self.menu.skybox {
            if skybox.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "menu.skybox may not be an empty path".into(),
                ));
            }
        }

        self.frame_step()?;

        Ok(())
    }
}

/// Frame step for a rate of `fps` frames per second.
///
/// `None` unless the rate is positive and `1 / fps` is a representable,
/// non-zero duration.
pub fn step_for_fps(fps: f32) -> Option<Duration> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(1.0 / fps)
        .ok()
        .filter(|step| !step.is_zero())
}

fn validate_color(field: &str, color: &[f32; 4]) -> Result<(), ConfigError> {
    if color
        .iter()
        .all(|channel| channel.is_finite() && (0.0..=1.0).contains(channel))
    {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} channels must lie in [0, 1]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[server]
base_url = "http://books.local:8000"
timeout = "5s"

[transition]
duration = "1s 500ms"

[floor]
default_tint = [0.1, 0.2, 0.3, 1.0]

[menu]
skybox = "skies/menu.png"
exposure = 1.2

[playback]
fps = 90
scene_hold = 2
"#;

    #[test]
    fn parses_sample_config() {
        let config = ReaderConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.server.base_url, "http://books.local:8000");
        assert_eq!(config.server.timeout, Duration::from_secs(5));
        assert_eq!(config.transition.duration, Duration::from_millis(1500));
        assert_eq!(config.floor.default_tint, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.menu.exposure, Some(1.2));
        assert_eq!(config.playback.fps, 90.0);
        assert_eq!(config.playback.scene_hold, Duration::from_secs(2));
        assert_eq!(
            config.menu_skybox(Path::new("/etc/genie")),
            Some(PathBuf::from("/etc/genie/skies/menu.png"))
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ReaderConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.transition.duration, Duration::from_millis(750));
        assert_eq!(config.playback.fps, 60.0);
        assert!(config.menu.skybox.is_none());
        assert!(config.menu_skybox(Path::new("/tmp")).is_none());
    }

    #[test]
    fn accepts_fractional_seconds() {
        let config = ReaderConfig::from_toml_str(
            r#"
version = 1
[transition]
duration = 0.25
"#,
        )
        .unwrap();
        assert_eq!(config.transition.duration, Duration::from_millis(250));
    }

    #[test]
    fn rejects_zero_transition() {
        let err = ReaderConfig::from_toml_str(
            r#"
version = 1
[transition]
duration = "0s"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_tint() {
        let err = ReaderConfig::from_toml_str(
            r#"
version = 1
[floor]
default_tint = [1.5, 0.0, 0.0, 1.0]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_server_url_and_version() {
        let err = ReaderConfig::from_toml_str(
            r#"
version = 1
[server]
base_url = "  "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ReaderConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_duration() {
        let err = ReaderConfig::from_toml_str(
            r#"
version = 1
[server]
timeout = -3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReaderConfig::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.floor.default_tint, [0.25, 0.25, 0.25, 1.0]);

        let path = dir.path().join("written.toml");
        fs::write(&path, "version = 1\n[playback]\nfps = 30\n").unwrap();
        let config = ReaderConfig::load_or_default(&path).unwrap();
        assert_eq!(config.playback.fps, 30.0);
        assert_eq!(
            config.frame_step().unwrap(),
            Duration::from_secs_f32(1.0 / 30.0)
        );
    }

    #[test]
    fn rejects_durations_too_large_to_represent() {
        let err = ReaderConfig::from_toml_str(
            r#"
version = 1
[transition]
duration = 1e30
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn rejects_frame_rates_without_a_usable_step() {
        for fps in ["1e-45", "1e-30", "1e30"] {
            let toml = format!("version = 1\n[playback]\nfps = {fps}\n");
            let err = ReaderConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{fps}: {err}");
        }
    }

    #[test]
    fn step_for_fps_covers_edge_rates() {
        assert_eq!(step_for_fps(50.0), Some(Duration::from_secs_f32(1.0 / 50.0)));
        assert_eq!(step_for_fps(0.0), None);
        assert_eq!(step_for_fps(-5.0), None);
        assert_eq!(step_for_fps(f32::NAN), None);
        assert_eq!(step_for_fps(1e-45), None);
    }
}
