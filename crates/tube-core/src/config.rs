use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;
use crate::player::{MountPoint, PlayerOptions};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub mount_point: MountPoint,
    #[serde(flatten)]
    pub options: PlayerOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    /// Explicit mpv binary.  Empty means search MPV_PATH, beside the exe, PATH.
    #[serde(default)]
    pub binary: PathBuf,
    /// Extra command-line arguments appended when spawning mpv.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// How long to wait for the IPC socket after spawning.
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_show_keys_bar")]
    pub show_keys_bar: bool,
    /// Typed into the URL field at start-up.
    #[serde(default)]
    pub initial_url: String,
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::new(),
            extra_args: Vec::new(),
            socket_timeout_ms: default_socket_timeout_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_keys_bar: default_show_keys_bar(),
            initial_url: String::new(),
        }
    }
}

fn default_socket_timeout_ms() -> u64 {
    5000
}

fn default_show_keys_bar() -> bool {
    true
}

impl MpvConfig {
    pub fn configured_binary(&self) -> Option<&Path> {
        if self.binary.as_os_str().is_empty() {
            None
        } else {
            Some(&self.binary)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config encode: {0}")]
    Encode(#[from] toml::ser::Error),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing defaults there first if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.mount_point.as_str(), "youtube-player");
        assert_eq!(config.player.options.height, 480);
        assert_eq!(config.player.options.width, "100%");
        assert!(!config.player.options.autoplay);
        assert!(config.player.options.controls);
        assert!(config.mpv.configured_binary().is_none());
        assert_eq!(config.mpv.socket_timeout_ms, 5000);
        assert!(config.ui.show_keys_bar);
        assert!(Config::config_path().ends_with("searchtube/config.toml"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.player.options.height, 480);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[player]\nmount_point = \"side-pane\"\nautoplay = true\n\n[ui]\ninitial_url = \"https://youtu.be/dQw4w9WgXcQ\"\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.player.mount_point.as_str(), "side-pane");
        assert!(config.player.options.autoplay);
        assert_eq!(config.player.options.height, 480);
        assert_eq!(config.ui.initial_url, "https://youtu.be/dQw4w9WgXcQ");
        assert!(config.ui.show_keys_bar);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.mpv.extra_args = vec!["--mute=yes".to_string()];
        config.player.options.height = 720;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.mpv.extra_args, vec!["--mute=yes".to_string()]);
        assert_eq!(loaded.player.options.height, 720);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[player\nheight = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
