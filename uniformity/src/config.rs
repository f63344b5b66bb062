use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use winit::event::VirtualKeyCode;

use crate::condition::BlockType;
use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "UNIFORMITY_CONFIG";

/// Format version written by this build.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(with = "crate::serde_seconds")]
    pub inter_trial: Duration,
    #[serde(with = "crate::serde_seconds")]
    pub stimulus: Duration,
    /// Stimulus duration of latency catch trials.
    #[serde(with = "crate::serde_seconds")]
    pub latency_catch: Duration,
    #[serde(with = "crate::serde_seconds")]
    pub mask: Duration,
    /// How long the changed centre stays up in blocks without a click response.
    #[serde(with = "crate::serde_seconds")]
    pub centre_change_wait: Duration,
    #[serde(with = "crate::serde_seconds")]
    pub inter_stimulus: Duration,
    /// Ends a reaction-time centre change that gets no click. `None` waits forever.
    #[serde(with = "crate::serde_seconds::option")]
    pub response_timeout: Option<Duration>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_trial: Duration::from_millis(1500),
            stimulus: Duration::from_secs(8),
            latency_catch: Duration::from_secs(2),
            mask: Duration::from_millis(100),
            centre_change_wait: Duration::from_millis(1700),
            inter_stimulus: Duration::from_secs(1),
            response_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StimulusConfig {
    pub small_size: f32,
    pub big_size: f32,
    /// Centre size of the size trials that are too far apart to fill in.
    pub no_illusion_size: f32,
    pub colour_size: f32,
    pub size_tolerance: f32,
    pub size_step: f32,
    pub opacity_step: f32,
    pub demo_opacity_step: f32,
    /// Width multiplier applied to every element so dots stay round on a wide display.
    pub aspect_scale: f32,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            small_size: 0.06,
            big_size: 0.09,
            no_illusion_size: 0.03,
            colour_size: 0.1,
            size_tolerance: 0.005,
            size_step: 0.002,
            opacity_step: 0.02,
            demo_opacity_step: 0.05,
            aspect_scale: 0.563,
        }
    }
}

impl StimulusConfig {
    pub fn reproduction_size(&self) -> f32 {
        (self.small_size + self.big_size) / 2.0
    }

    pub fn size_bounds(&self) -> (f32, f32) {
        (
            self.small_size - self.size_tolerance,
            self.big_size + self.size_tolerance,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyConfig {
    pub advance: String,
    pub quit: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            advance: "space".to_owned(),
            quit: "q".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub advance: VirtualKeyCode,
    pub quit: VirtualKeyCode,
}

impl KeyConfig {
    pub fn resolve(&self) -> Result<KeyBindings, ConfigError> {
        let advance = parse_key(&self.advance)?;
        let quit = parse_key(&self.quit)?;
        if advance == quit {
            return Err(ConfigError::KeyClash(self.quit.clone()));
        }
        Ok(KeyBindings { advance, quit })
    }
}

pub fn parse_key(name: &str) -> Result<VirtualKeyCode, ConfigError> {
    use VirtualKeyCode as K;
    let lower = name.trim().to_ascii_lowercase();
    let key = match lower.as_str() {
        "space" => K::Space,
        "return" | "enter" => K::Return,
        "escape" | "esc" => K::Escape,
        "tab" => K::Tab,
        "backspace" => K::Back,
        single if single.len() == 1 => {
            let letters = [
                K::A, K::B, K::C, K::D, K::E, K::F, K::G, K::H, K::I, K::J, K::K, K::L, K::M,
                K::N, K::O, K::P, K::Q, K::R, K::S, K::T, K::U, K::V, K::W, K::X, K::Y, K::Z,
            ];
            let ch = single.as_bytes()[0];
            if !ch.is_ascii_lowercase() {
                return Err(ConfigError::UnknownKey(name.to_owned()));
            }
            letters[(ch - b'a') as usize]
        }
        _ => return Err(ConfigError::UnknownKey(name.to_owned())),
    };
    Ok(key)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    #[serde(default = "default_practice_repetitions")]
    pub practice_repetitions: u32,
    #[serde(default = "default_blocks")]
    pub blocks: Vec<BlockType>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub stimulus: StimulusConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            experiment_name: default_experiment_name(),
            repetitions: default_repetitions(),
            practice_repetitions: default_practice_repetitions(),
            blocks: default_blocks(),
            timing: TimingConfig::default(),
            stimulus: StimulusConfig::default(),
            keys: KeyConfig::default(),
            seed: None,
            data_dir: None,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_experiment_name() -> String {
    "Uniformity_illusion".to_owned()
}

fn default_repetitions() -> u32 {
    9
}

fn default_practice_repetitions() -> u32 {
    2
}

fn default_blocks() -> Vec<BlockType> {
    vec![
        BlockType::CentreFillReaction,
        BlockType::CentreFillReproduction,
        BlockType::BlackOut,
    ]
}

impl ExperimentConfig {
    /// Reads the config at `explicit`, else at `$UNIFORMITY_CONFIG`, else returns the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.migrated()
    }

    /// Brings a config read from disk up to [`CONFIG_VERSION`].
    ///
    /// Files from a newer build are refused rather than half-understood.
    pub fn migrated(mut self) -> Result<Self, ConfigError> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_VERSION,
            });
        }
        // Version 0 predates the field; its layout is the current one.
        self.version = CONFIG_VERSION;
        Ok(self)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("uniformity_data"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetitions == 0 || self.repetitions % 3 != 0 {
            return Err(ConfigError::Repetitions(self.repetitions));
        }
        if self.blocks.is_empty() {
            return Err(ConfigError::NoBlocks);
        }

        let t = &self.timing;
        for (name, value) in [
            ("timing.stimulus", t.stimulus),
            ("timing.latency_catch", t.latency_catch),
            ("timing.centre_change_wait", t.centre_change_wait),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { name });
            }
        }
        if t.response_timeout.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration {
                name: "timing.response_timeout",
            });
        }
        if t.latency_catch >= t.stimulus {
            return Err(ConfigError::CatchNotShorter {
                catch: t.latency_catch,
                stimulus: t.stimulus,
            });
        }

        let s = &self.stimulus;
        for (name, value) in [
            ("stimulus.no_illusion_size", s.no_illusion_size),
            ("stimulus.colour_size", s.colour_size),
            ("stimulus.size_step", s.size_step),
            ("stimulus.opacity_step", s.opacity_step),
            ("stimulus.demo_opacity_step", s.demo_opacity_step),
            ("stimulus.aspect_scale", s.aspect_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if !(s.small_size > 0.0 && s.small_size < s.big_size && s.big_size.is_finite()) {
            return Err(ConfigError::SizeOrder {
                small: s.small_size,
                big: s.big_size,
            });
        }
        if !(s.size_tolerance.is_finite() && s.size_tolerance >= 0.0) {
            return Err(ConfigError::NotPositive {
                name: "stimulus.size_tolerance",
                value: s.size_tolerance,
            });
        }

        self.keys.resolve()?;
        Ok(())
    }
}
