//! Environment variable utilities for aqua
//!
//! The only variable read by the core is `AQUA_CONFIG`, the path of an
//! optional YAML file overriding the default equalizer bounds.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{ConfigError, ConfigResult};

/// Name of the variable holding the config file path
pub const CONFIG_ENV_VAR: &str = "AQUA_CONFIG";

/// Resolve the config file path from `AQUA_CONFIG`.
///
/// # Returns
///
/// `Ok(None)` when the variable is unset or empty, the path otherwise.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if the variable names a missing file.
///
/// # Example
///
/// ```no_run
/// use aqua_env::env_utils::config_path_from_env;
///
/// if let Some(path) = config_path_from_env()? {
///     println!("config file: {}", path.display());
/// }
/// # Ok::<(), aqua_env::ConfigError>(())
/// ```
pub fn config_path_from_env() -> ConfigResult<Option<PathBuf>> {
    config_path_from(std::env::var_os(CONFIG_ENV_VAR))
}

fn config_path_from(value: Option<OsString>) -> ConfigResult<Option<PathBuf>> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_not_set() {
        assert!(matches!(config_path_from(None), Ok(None)));
        assert!(matches!(config_path_from(Some(OsString::new())), Ok(None)));
    }

    #[test]
    fn test_config_path_nonexistent() {
        let result = config_path_from(Some(OsString::from("/this/path/should/not/exist")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_path_exists() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = config_path_from(Some(file.path().as_os_str().to_owned())).unwrap();
        assert_eq!(result.as_deref(), Some(file.path()));
    }
}
