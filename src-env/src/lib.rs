//! Shared foundation of the aqua crates: the equalizer configuration object,
//! numeric helpers and environment lookup.

pub mod config;
pub mod env_utils;
pub mod numeric;

pub use config::{
    ConfigError, ConfigResult, EqualizerConfig, FieldSpec, FilterSetConfig, GraphConfig,
    InteractionConfig,
};
pub use numeric::{clamp, digit_count, format_number, round_to_precision};
