use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "pictor";
const APP_CONFIG_FILE: &str = "config.json";

/// Editor settings from `config.json`. Every field falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomConfig,
    pub text: TextDefaults,
    pub pan: PanConfig,
    pub crop: CropConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub step_factor: f64,
    pub manual_step: f64,
    pub min_percent: u32,
    pub max_percent: u32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            step_factor: 1.05,
            manual_step: 0.05,
            min_percent: 25,
            max_percent: 500,
        }
    }
}

impl ZoomConfig {
    pub fn min_scale(&self) -> f64 {
        f64::from(self.min_percent) / 100.0
    }

    pub fn max_scale(&self) -> f64 {
        f64::from(self.max_percent.max(self.min_percent)) / 100.0
    }

    pub fn allows_percent(&self, percent: u32) -> bool {
        (self.min_percent..=self.max_percent).contains(&percent)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextDefaults {
    pub default_content: String,
    pub font_size: f64,
    pub font_family: String,
    pub fill: String,
    /// Padding added around the measured text on every side.
    pub padding: f64,
    pub line_height: f64,
    /// Margin kept between a freshly created node and the viewport edge.
    pub reveal_margin: f64,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            default_content: "Text".to_string(),
            font_size: 32.0,
            font_family: "Arial".to_string(),
            fill: "#000000".to_string(),
            padding: 5.0,
            line_height: 1.0,
            reveal_margin: 20.0,
        }
    }
}

impl TextDefaults {
    pub fn fill_color(&self) -> Color {
        Color::from_hex(&self.fill).unwrap_or(Color::BLACK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    pub duration_ms: u64,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self { duration_ms: 300 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub min_selector_size: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            min_selector_size: 16.0,
        }
    }
}

pub fn load_editor_config() -> EditorConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_editor_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_editor_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EditorConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EditorConfig::default(),
    };
    if !path.exists() {
        return EditorConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_editor_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EditorConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EditorConfig::default()
        }
    }
}

pub fn parse_editor_config(contents: &str) -> serde_json::Result<EditorConfig> {
    serde_json::from_str(contents)
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "pictor",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/pictor/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("pictor", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/pictor/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("pictor", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigError::MissingHomeDirectory);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw = r#"{ "zoom": { "max_percent": 800 }, "text": { "font_size": 18 } }"#;
        let config = parse_editor_config(raw).expect("partial config should parse");
        assert_eq!(config.zoom.max_percent, 800);
        assert_eq!(config.zoom.min_percent, 25);
        assert_eq!(config.zoom.step_factor, 1.05);
        assert_eq!(config.text.font_size, 18.0);
        assert_eq!(config.text.default_content, "Text");
        assert_eq!(config.crop.min_selector_size, 16.0);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_editor_config_with(
            Some(Path::new("/nonexistent/pictor-config-root")),
            None,
        );
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn invalid_fill_falls_back_to_black() {
        let defaults = TextDefaults {
            fill: "not-a-color".to_string(),
            ..TextDefaults::default()
        };
        assert_eq!(defaults.fill_color(), Color::BLACK);
    }
}
