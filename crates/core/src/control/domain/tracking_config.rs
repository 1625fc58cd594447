use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_APPROACH_SPEED, DEFAULT_AREA_BAND, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_GAIN_D, DEFAULT_GAIN_P,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame size must be non-zero, got {width}x{height}")]
    ZeroFrameSize { width: u32, height: u32 },
    #[error("area band low ({low}) must be below high ({high})")]
    EmptyAreaBand { low: i64, high: i64 },
    #[error("gain {name} must be finite, got {value}")]
    NonFiniteGain { name: &'static str, value: f64 },
    #[error("approach speed must be between 0 and 100, got {0}")]
    ApproachSpeedOutOfRange(i32),
}

/// What forward/back does on a tick with no face.
///
/// `Approach` evaluates the area band against the sentinel's area of 0,
/// which lands in the "too far" branch and keeps creeping forward.
/// `Hold` special-cases the sentinel and hovers in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoTargetPolicy {
    #[default]
    Approach,
    Hold,
}

/// How the clamped floating-point yaw becomes an integer speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingPolicy {
    /// Toward zero, like an integer cast.
    #[default]
    Truncate,
    /// Nearest integer, ties away from zero.
    Nearest,
}

impl RoundingPolicy {
    pub fn apply(self, value: f64) -> i32 {
        match self {
            RoundingPolicy::Truncate => value.trunc() as i32,
            RoundingPolicy::Nearest => value.round() as i32,
        }
    }
}

impl std::str::FromStr for NoTargetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approach" => Ok(NoTargetPolicy::Approach),
            "hold" => Ok(NoTargetPolicy::Hold),
            other => Err(format!(
                "no-target policy must be 'approach' or 'hold', got '{other}'"
            )),
        }
    }
}

impl std::str::FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "truncate" => Ok(RoundingPolicy::Truncate),
            "nearest" => Ok(RoundingPolicy::Nearest),
            other => Err(format!(
                "rounding must be 'truncate' or 'nearest', got '{other}'"
            )),
        }
    }
}

/// Tuning for one camera/subject combination. Fixed for the lifetime of a
/// flight; loaded from JSON with every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub area_band_low: i64,
    pub area_band_high: i64,
    pub gain_p: f64,
    pub gain_d: f64,
    pub approach_speed: i32,
    pub no_target_policy: NoTargetPolicy,
    pub rounding: RoundingPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            area_band_low: DEFAULT_AREA_BAND.0,
            area_band_high: DEFAULT_AREA_BAND.1,
            gain_p: DEFAULT_GAIN_P,
            gain_d: DEFAULT_GAIN_D,
            approach_speed: DEFAULT_APPROACH_SPEED,
            no_target_policy: NoTargetPolicy::default(),
            rounding: RoundingPolicy::default(),
        }
    }
}

impl TrackingConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::ZeroFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if self.area_band_low >= self.area_band_high {
            return Err(ConfigError::EmptyAreaBand {
                low: self.area_band_low,
                high: self.area_band_high,
            });
        }
        if !self.gain_p.is_finite() {
            return Err(ConfigError::NonFiniteGain {
                name: "gain_p",
                value: self.gain_p,
            });
        }
        if !self.gain_d.is_finite() {
            return Err(ConfigError::NonFiniteGain {
                name: "gain_d",
                value: self.gain_d,
            });
        }
        if !(0..=100).contains(&self.approach_speed) {
            return Err(ConfigError::ApproachSpeedOutOfRange(self.approach_speed));
        }
        Ok(())
    }
}
