//! Where study-kit keeps its settings and writes exported kits.
//!
//! | Purpose        | Linux                        | macOS / Windows                         |
//! |----------------|------------------------------|-----------------------------------------|
//! | `settings.toml`| `~/.config/study-kit/`       | Application Support / `%APPDATA%`       |
//! | exported kits  | `~/Downloads/study-kit/`     | `~/Downloads/study-kit/` / `%USERPROFILE%\Downloads` |
//!
//! Both fall back to `./study-kit` when the platform has no such directory.

use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "study-kit";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    /// Rendered guides and text summaries land here unless `--out` is given.
    pub output_dir: PathBuf,
}

impl AppPaths {
    /// Platform directories from the `dirs` crate.
    pub fn new() -> Self {
        let under = |base: Option<PathBuf>| base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR);
        let config_dir = under(dirs::config_dir());
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            config_dir,
            output_dir: under(dirs::download_dir()),
        }
    }

    /// Create the output directory if needed and return it.
    pub fn ensure_output_dir(&self) -> io::Result<&Path> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(&self.output_dir)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
