use crate::dimensions::PixelLimits;
use crate::effects;
use crate::scheduler::Pacing;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub active_fps: f64,
    pub idle_fps: f64,
    pub idle_timeout_ms: u64,
    pub key_queue_capacity: usize,
    pub long_press_ms: u64,
    /// Terminals without key-release reporting: a key that has started
    /// auto-repeating is released this long after its last repeat.
    pub key_release_ms: u64,
    /// Same terminals: a single press stays held this long. Must exceed the
    /// OS delay before auto-repeat starts.
    pub key_repeat_delay_ms: u64,
    pub min_pixel: u32,
    pub max_pixel: u32,
    /// 0 seeds from entropy.
    pub seed: u64,
    pub start_effect: Option<String>,
    /// Effect module paths, loaded in this order.
    pub effects: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_fps: 30.0,
            idle_fps: 1.0,
            idle_timeout_ms: 5_000,
            key_queue_capacity: crate::input::DEFAULT_KEY_CAPACITY,
            long_press_ms: crate::input::DEFAULT_LONG_PRESS_MS,
            key_release_ms: 250,
            key_repeat_delay_ms: 700,
            min_pixel: 8,
            max_pixel: 24,
            seed: 0,
            start_effect: None,
            effects: effects::DEFAULT_LOAD_ORDER
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            active_fps: self.active_fps.clamp(1.0, 240.0),
            idle_fps: self.idle_fps.clamp(0.1, 240.0),
            idle_timeout_ms: self.idle_timeout_ms,
        }
    }

    pub fn pixel_limits(&self) -> PixelLimits {
        let min = self.min_pixel.max(1);
        PixelLimits {
            min,
            max: self.max_pixel.max(min),
        }
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "ledwall", "Ledwall")
        .context("could not resolve project directories")?;
    let data = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&data).ok();
    Ok(Paths {
        settings_path: proj.config_dir().join("settings.json"),
        log_path: data.join("ledwall.log"),
    })
}

/// Reads an explicitly requested settings file. Missing or malformed files are errors.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing settings in {}", path.display()))
}

/// Reads the default settings file if there is a usable one.
pub fn load_settings_or_default(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}
