//! Configuration file management.
//!
//! Handles loading and saving user preferences to `~/.blob-viz.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::engine::{ColorPair, ModulationState, CYAN, LIME, MAGENTA};

const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 3;

const CONFIG_TEMPLATE: &str = r#"# blob-viz configuration file

# Timeout in seconds when switching audio devices (default: 3)
# device_timeout_secs = 3

# Last selected audio device (auto-saved)
# last_device = "Device Name"
# last_device_is_input = false

# =============================================================================
# Analysis
# =============================================================================

# FFT size: power of two, 64-2048 (default: 1024, spectrum is fft_size/2 bins)
# fft_size = 1024

# Input gain multiplier (default: 1.0)
# gain = 1.0

# How strongly audio energy drives the visuals (default: 1.0)
# reactivity = 1.0

# =============================================================================
# Visuals
# =============================================================================

# Deformation time multiplier (default: 1.0)
# deform_speed = 1.0

# Glow base strength / radius (defaults: 0.45 / 0.6)
# bloom_strength = 0.45
# bloom_radius = 0.6

# Color pairs as 0xRRGGBB
# artifact_color_a = 0xbaff00
# artifact_color_b = 0x80e0ff
# cage_color_a = 0xff00ff
# cage_color_b = 0x00ffff
"#;

#[derive(Serialize, Deserialize, Default)]
pub struct Config {
    pub last_device: Option<String>,
    pub last_device_is_input: Option<bool>,
    pub device_timeout_secs: Option<u64>,

    // Analysis
    pub fft_size: Option<usize>,
    pub gain: Option<f32>,
    pub reactivity: Option<f32>,

    // Visuals
    pub deform_speed: Option<f32>,
    pub bloom_strength: Option<f32>,
    pub bloom_radius: Option<f32>,
    pub artifact_color_a: Option<u32>,
    pub artifact_color_b: Option<u32>,
    pub cage_color_a: Option<u32>,
    pub cage_color_b: Option<u32>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".blob-viz.toml"))
    }

    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        // Create template file if it doesn't exist
        if !path.exists() {
            let _ = fs::write(&path, CONFIG_TEMPLATE);
            println!("Created config template at {:?}", path);
        }

        fs::read_to_string(&path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Ok(content) = toml::to_string(self) {
                let _ = fs::write(&path, &content);
            }
        }
    }

    pub fn device_timeout_secs(&self) -> u64 {
        self.device_timeout_secs
            .unwrap_or(DEFAULT_DEVICE_TIMEOUT_SECS)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size.unwrap_or(crate::audio::DEFAULT_FFT_SIZE)
    }

    pub fn set_device(&mut self, name: &str, is_input: bool) {
        self.last_device = Some(name.to_string());
        self.last_device_is_input = Some(is_input);
        self.save();
    }

    /// Initial modulation state, defaults filled in for unset fields.
    pub fn modulation_state(&self) -> ModulationState {
        let defaults = ModulationState::default();
        ModulationState {
            gain: self.gain.unwrap_or(defaults.gain).max(0.0),
            reactivity: self.reactivity.unwrap_or(defaults.reactivity).max(0.0),
            deform_speed: self.deform_speed.unwrap_or(defaults.deform_speed),
            bloom_strength: self.bloom_strength.unwrap_or(defaults.bloom_strength),
            bloom_radius: self.bloom_radius.unwrap_or(defaults.bloom_radius),
            artifact_colors: ColorPair {
                a: self.artifact_color_a.unwrap_or(LIME),
                b: self.artifact_color_b.unwrap_or(0x80e0ff),
            },
            cage_colors: ColorPair {
                a: self.cage_color_a.unwrap_or(MAGENTA),
                b: self.cage_color_b.unwrap_or(CYAN),
            },
        }
    }

    /// Write the current modulation state back for the next run.
    pub fn remember_state(&mut self, state: &ModulationState, fft_size: usize) {
        self.gain = Some(state.gain);
        self.reactivity = Some(state.reactivity);
        self.deform_speed = Some(state.deform_speed);
        self.bloom_strength = Some(state.bloom_strength);
        self.bloom_radius = Some(state.bloom_radius);
        self.artifact_color_a = Some(state.artifact_colors.a);
        self.artifact_color_b = Some(state.artifact_colors.b);
        self.cage_color_a = Some(state.cage_colors.a);
        self.cage_color_b = Some(state.cage_colors.b);
        self.fft_size = Some(fft_size);
        self.save();
    }
}
