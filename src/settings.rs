use anyhow::Context;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pdf::RenderOptions;
use crate::viewport::ScrollConfig;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfroll";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_true")]
    pub dark_mode: bool,

    #[serde(default = "default_brightness")]
    pub brightness: f32,

    /// Pixels per line scroll
    #[serde(default = "default_scroll_step")]
    pub scroll_step: usize,

    #[serde(default = "default_response_time_ms")]
    pub response_time_ms: u64,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Share of the viewport height moved by page down/up
    #[serde(default = "default_page_step_ratio")]
    pub page_step_ratio: f32,

    /// Pages around the viewport rendered while idle
    #[serde(default = "default_prefetch_radius")]
    pub prefetch_radius: usize,

    #[serde(default = "default_window_width")]
    pub window_width: usize,

    #[serde(default = "default_window_height")]
    pub window_height: usize,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_brightness() -> f32 {
    RenderOptions::DEFAULT_BRIGHTNESS
}

fn default_scroll_step() -> usize {
    100
}

fn default_response_time_ms() -> u64 {
    130
}

fn default_fps() -> u32 {
    60
}

fn default_page_step_ratio() -> f32 {
    0.9
}

fn default_prefetch_radius() -> usize {
    2
}

fn default_window_width() -> usize {
    640
}

fn default_window_height() -> usize {
    480
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            dark_mode: true,
            brightness: default_brightness(),
            scroll_step: default_scroll_step(),
            response_time_ms: default_response_time_ms(),
            fps: default_fps(),
            page_step_ratio: default_page_step_ratio(),
            prefetch_radius: default_prefetch_radius(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Settings {
    /// Animation tunables handed to the scroll controller
    pub fn scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            fps: self.fps,
            response_time: Duration::from_millis(self.response_time_ms),
            scroll_step: self.scroll_step,
            page_step_ratio: self.page_step_ratio,
        }
    }

    /// Replace out-of-range values with usable ones
    fn sanitize(&mut self) {
        let brightness = RenderOptions::clamp_brightness(self.brightness);
        if brightness != self.brightness {
            warn!("brightness {} out of range, using {brightness}", self.brightness);
            self.brightness = brightness;
        }
        if self.fps == 0 {
            warn!("fps must be positive, using {}", default_fps());
            self.fps = default_fps();
        }
        if !(self.page_step_ratio > 0.0 && self.page_step_ratio <= 1.0) {
            warn!(
                "page_step_ratio {} out of range, using {}",
                self.page_step_ratio,
                default_page_step_ratio()
            );
            self.page_step_ratio = default_page_step_ratio();
        }
    }
}

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the user's config directory, falling back to defaults
pub fn load_settings() -> Settings {
    match preferred_config_path() {
        Some(path) if path.exists() => load_settings_from_path(&path),
        Some(path) => {
            info!("Settings file not found, using defaults ({path:?})");
            Settings::default()
        }
        None => {
            warn!("Could not determine config directory, using default settings");
            Settings::default()
        }
    }
}

pub fn load_settings_from_path(path: &Path) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    };
    if settings.version < CURRENT_VERSION {
        info!(
            "Migrating settings from v{} to v{}",
            settings.version, CURRENT_VERSION
        );
        settings.version = CURRENT_VERSION;
    }
    settings.sanitize();
    settings
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {parent:?}"))?;
    }
    let yaml = serde_yaml::to_string(settings)?;
    fs::write(path, yaml).with_context(|| format!("Failed to write settings file {path:?}"))?;
    debug!("Saved settings to {path:?}");
    Ok(())
}
