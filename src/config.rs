use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use windowtree_cache::DEFAULT_CACHE_KEY;

/// Geometry and chrome requested for every child window.
///
/// `top` is left unset by default and rendered as `top=undefined`, which
/// hosts parse as not-a-number and ignore.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowFeatures {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: Option<i32>,
    pub resizable: bool,
    pub scrollbars: bool,
}

impl Default for WindowFeatures {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
            left: 0,
            top: None,
            resizable: true,
            scrollbars: true,
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl fmt::Display for WindowFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "width={},height={},left={},",
            self.width, self.height, self.left
        )?;
        match self.top {
            Some(top) => write!(f, "top={},", top)?,
            None => write!(f, "top=undefined,")?,
        }
        write!(
            f,
            "resizable={},scrollbars={}",
            yes_no(self.resizable),
            yes_no(self.scrollbars)
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    pub window: WindowFeatures,
    /// Store key the name cache is persisted under.
    pub cache_key: String,
    /// Name given to a window that loads without one.
    pub root_window_name: String,
    /// Profile directory used by the file-backed store.
    pub store_profile: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            window: WindowFeatures::default(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            root_window_name: "main".to_string(),
            store_profile: "default".to_string(),
        }
    }
}

impl TreeConfig {
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("windowtree").join("settings.toml"))
    }

    /// Load settings from the user config dir, or defaults if absent.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`. A missing or invalid file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring invalid settings {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("cannot read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_feature_string() {
        assert_eq!(
            WindowFeatures::default().to_string(),
            "width=900,height=600,left=0,top=undefined,resizable=yes,scrollbars=yes"
        );
    }

    #[test]
    fn test_explicit_top() {
        let features = WindowFeatures {
            top: Some(40),
            scrollbars: false,
            ..WindowFeatures::default()
        };
        assert_eq!(
            features.to_string(),
            "width=900,height=600,left=0,top=40,resizable=yes,scrollbars=no"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TreeConfig::from_toml_str(
            r#"
            root_window_name = "console"

            [window]
            width = 1200
            "#,
        )
        .unwrap();
        assert_eq!(config.root_window_name, "console");
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(&path, "window = 12").unwrap();
        assert_eq!(TreeConfig::load_from(&path), TreeConfig::default());
        assert_eq!(
            TreeConfig::load_from(&temp.path().join("missing.toml")),
            TreeConfig::default()
        );
    }
}
