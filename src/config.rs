//! Configuration handling for steptool
//!
//! Settings live in `.steptool/config.toml` under the project root. Every
//! field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StepToolError;

/// Name of the per-project settings directory.
pub const CONFIG_DIR: &str = ".steptool";

/// Steptool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Dotted name of the decorator that marks step implementations
    #[serde(default = "default_decorator")]
    pub decorator: String,

    /// Directories scanned when no directory is given on the command line
    #[serde(default = "default_step_impl_dirs")]
    pub step_impl_dirs: Vec<String>,

    /// File extensions (without the dot) treated as step files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped during a walk
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_decorator() -> String {
    crate::scan::DEFAULT_DECORATOR.to_string()
}

fn default_step_impl_dirs() -> Vec<String> {
    vec!["step_impl".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_exclude() -> Vec<String> {
    [".git", "__pycache__", "venv", ".venv", "node_modules"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decorator: default_decorator(),
            step_impl_dirs: default_step_impl_dirs(),
            extensions: default_extensions(),
            exclude: default_exclude(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, StepToolError> {
        let content = fs::read_to_string(path)
            .map_err(|e| StepToolError::Config(format!("failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, StepToolError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| StepToolError::Config(format!("failed to parse config file: {}", e)))?;
        if config.decorator.is_empty() {
            return Err(StepToolError::Config(
                "decorator name must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from .steptool/config.toml in the given project root
    pub fn load_from_project(project_root: &Path) -> Result<Self, StepToolError> {
        let config_path = project_root.join(CONFIG_DIR).join("config.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// True if `path` has one of the configured extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// True if a directory entry with this file name is skipped.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }

    /// The configured step directories, resolved against `project_root`.
    pub fn step_impl_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        self.step_impl_dirs
            .iter()
            .map(|dir| project_root.join(dir))
            .collect()
    }
}

/// Find the project root by searching upward for a `.steptool/` directory
pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}
