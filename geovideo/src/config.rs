//! Settings coming from outside of the program: environment and project layout.

use std::path::{Path, PathBuf};

/// Environment variable which switches providers into offline mode.
pub const OFFLINE_ENV: &str = "GEOVIDEO_OFFLINE";

/// Whether `value` means "enabled". Accepts `1`, `true`, `yes` and `on`, in any case.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Read [`OFFLINE_ENV`]. Unset or unparsable means online.
pub fn offline_from_env() -> bool {
    std::env::var(OFFLINE_ENV)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

/// Where a project keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tile_cache_dir: PathBuf,
}

impl ProjectPaths {
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            root: root.to_path_buf(),
            assets_dir: root.join("geovideo").join("assets"),
            output_dir: root.join("output"),
            tile_cache_dir: root.join("geovideo").join("cache").join("tiles"),
        }
    }
}
