//! Default locations for generated images.

use std::path::{Path, PathBuf};

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Where images go when the config names no output directory: the user's
/// Desktop, or an `images/` folder next to the executable when there is none.
pub fn default_output_directory() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.desktop_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| exe_directory().join("images"))
}
