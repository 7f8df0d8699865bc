// ============================================================================
// Equalizer configuration
// ============================================================================
//
// Bounds and modelling constants are carried by one immutable value that is
// passed to every control and to the curve engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env_utils;
use crate::numeric;

/// Errors raised while loading or validating an [`EqualizerConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("AQUA_CONFIG points to a non-existent file: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Bounds and display precision of one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub min: f64,
    pub max: f64,
    /// Number of decimals kept on commit (0 = integer field)
    #[serde(default)]
    pub precision: u32,
    /// Snap the last kept decimal to a multiple of 5 on commit
    #[serde(default)]
    pub round_to_half: bool,
}

impl FieldSpec {
    pub const fn new(min: f64, max: f64, precision: u32) -> Self {
        Self {
            min,
            max,
            precision,
            round_to_half: false,
        }
    }

    pub fn with_round_to_half(mut self, round_to_half: bool) -> Self {
        self.round_to_half = round_to_half;
        self
    }

    pub fn clamp(&self, value: f64) -> f64 {
        numeric::clamp(value, self.min, self.max)
    }

    pub fn is_float(&self) -> bool {
        self.precision > 0
    }

    pub fn allows_negative(&self) -> bool {
        self.min < 0.0
    }

    /// One unit of the last kept decimal.
    pub fn increment(&self) -> f64 {
        10.0_f64.powi(-(self.precision as i32))
    }

    /// Longest draft accepted by the text input, decimal point excluded.
    pub fn max_draft_len(&self) -> usize {
        let widest = self.min.abs().max(self.max.abs());
        numeric::digit_count(widest)
            + self.precision as usize
            + usize::from(self.allows_negative())
            + usize::from(self.is_float())
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::Invalid(format!("{} bounds must be finite", name)));
        }
        if self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "{} min {} is above max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Logarithmic sweep used to draw the response curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// First sampled frequency (Hz)
    pub start: f64,
    /// Last sampled frequency (Hz)
    pub end: f64,
    /// Number of log steps; the sweep has `num_steps + 1` points
    pub num_steps: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            start: 10.0,
            end: 20000.0,
            num_steps: 500,
        }
    }
}

/// Timing of pointer interactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Minimum spacing of commits during a slider drag
    pub throttle_ms: u64,
    /// Repeat period of a held arrow button
    pub repeat_ms: u64,
    /// Wheel steps are this many arrow increments
    pub wheel_multiplier: f64,
}

impl InteractionConfig {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 100,
            repeat_ms: 200,
            wheel_multiplier: 10.0,
        }
    }
}

/// Limits and defaults of the band collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSetConfig {
    pub min_count: usize,
    pub max_count: usize,
    /// Quality given to a newly inserted band
    pub default_quality: f64,
}

impl Default for FilterSetConfig {
    fn default() -> Self {
        Self {
            min_count: 1,
            max_count: 20,
            default_quality: 1.0,
        }
    }
}

/// Every bound and modelling constant of the equalizer core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerConfig {
    pub frequency: FieldSpec,
    pub gain: FieldSpec,
    pub quality: FieldSpec,
    pub preamp: FieldSpec,
    /// Sample rate of the modelled filters; not tied to any audio device
    pub sample_rate: f64,
    pub graph: GraphConfig,
    pub interaction: InteractionConfig,
    pub filters: FilterSetConfig,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            frequency: FieldSpec::new(10.0, 20000.0, 0),
            gain: FieldSpec::new(-30.0, 30.0, 2),
            quality: FieldSpec::new(0.001, 999.999, 3),
            preamp: FieldSpec::new(-30.0, 30.0, 2),
            sample_rate: 96000.0,
            graph: GraphConfig::default(),
            interaction: InteractionConfig::default(),
            filters: FilterSetConfig::default(),
        }
    }
}

impl EqualizerConfig {
    /// Parse a YAML document; missing sections keep their defaults.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: EqualizerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        log::info!("loaded equalizer config from {}", path.display());
        Ok(config)
    }

    /// Load the file named by `AQUA_CONFIG`, or the defaults when it is unset.
    pub fn from_env() -> ConfigResult<Self> {
        match env_utils::config_path_from_env()? {
            Some(path) => Self::load(path),
            None => {
                log::debug!("{} not set, using default config", env_utils::CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.frequency.validate("frequency")?;
        self.gain.validate("gain")?;
        self.quality.validate("quality")?;
        self.preamp.validate("preamp")?;

        if self.quality.min <= 0.0 {
            return Err(ConfigError::Invalid("quality min must be positive".to_string()));
        }
        if self.frequency.min <= 0.0 {
            return Err(ConfigError::Invalid("frequency min must be positive".to_string()));
        }
        if !(self.sample_rate > 0.0) {
            return Err(ConfigError::Invalid("sample_rate must be positive".to_string()));
        }
        if !(self.graph.start > 0.0 && self.graph.start < self.graph.end) {
            return Err(ConfigError::Invalid(format!(
                "graph range {}..{} is empty",
                self.graph.start, self.graph.end
            )));
        }
        if self.graph.num_steps == 0 {
            return Err(ConfigError::Invalid("graph num_steps must be at least 1".to_string()));
        }
        if self.filters.min_count > self.filters.max_count {
            return Err(ConfigError::Invalid(format!(
                "filters min_count {} is above max_count {}",
                self.filters.min_count, self.filters.max_count
            )));
        }
        if !(self.filters.default_quality > 0.0) {
            return Err(ConfigError::Invalid(
                "filters default_quality must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
