//! Home-relative path resolution.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Environment variable name for user home directory.
const HOME_ENV: &str = "HOME";
/// Location of the tunnels configuration below `$HOME`.
pub const DEFAULT_CONFIG_RELATIVE: &[&str] = &["code", "tunnels", "config.yaml"];

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// Resolve `$HOME/code/tunnels/config.yaml`.
pub fn default_config_path() -> Result<PathBuf, &'static str> {
    default_config_path_from(env::var_os(HOME_ENV))
}

pub fn default_config_path_from(home: Option<OsString>) -> Result<PathBuf, &'static str> {
    let home = home
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or("HOME is unset")?;
    if !is_nonempty_absolute(&home) {
        return Err("HOME must be an absolute path");
    }
    Ok(DEFAULT_CONFIG_RELATIVE
        .iter()
        .fold(home, |path, segment| path.join(segment)))
}
