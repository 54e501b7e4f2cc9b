//! Configuration file location and asset folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the asset folder
pub const ASSET_DIR_ENV: &str = "HUSH_ASSET_DIR";

/// Asset folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Value from the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_asset_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        debug!("Asset folder from command line: {}", path.display());
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            debug!("Asset folder from {}: {}", env_var_name, path);
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        debug!("Asset folder from config file: {}", path.display());
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_asset_folder()
}

/// Default configuration file path for the platform
///
/// Returns `<config dir>/hush/config.toml` (for example
/// `~/.config/hush/config.toml` on Linux).
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("hush").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Locate the config file to load, if any
///
/// An explicit path must exist. Without one, the platform default is used
/// only when present; a missing default file is not an error.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    match default_config_path() {
        Ok(path) if path.exists() => Ok(Some(path)),
        Ok(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(None)
        }
        Err(e) => {
            debug!("{}, using defaults", e);
            Ok(None)
        }
    }
}

/// Get OS-dependent default asset folder path
fn default_asset_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\hush\sounds
        dirs::data_local_dir()
            .map(|d| d.join("hush").join("sounds"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\hush\\sounds"))
    } else {
        // ~/.local/share/hush/sounds, ~/Library/Application Support/hush/sounds
        dirs::data_dir()
            .map(|d| d.join("hush").join("sounds"))
            .unwrap_or_else(|| PathBuf::from("./hush_data/sounds"))
    }
}
