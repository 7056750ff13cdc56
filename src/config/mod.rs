mod loader;
mod schema;

pub use loader::{config_from_env, load_config};
pub use schema::*;

use anyhow::Result;
use std::path::Path;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_config(path)
    }

    pub fn from_env() -> Result<Self> {
        loader::config_from_env()
    }

    pub fn default_path() -> std::path::PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".chatrelay")
            .join("config.yaml")
    }
}
