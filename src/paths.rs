use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Overrides the data directory when set.
pub const HOME_ENV: &str = "GROCERY_LIST_HOME";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub storage_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let data_dir = match env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home = dirs::home_dir().context("Unable to determine home directory")?;
                home.join(".local/grocery-list")
            }
        };
        Self::at(data_dir)
    }

    pub fn at(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Unable to create {}", data_dir.display()))?;
        Ok(Self {
            storage_file: data_dir.join("storage.json"),
            log_file: data_dir.join("grocery-list.log"),
            data_dir,
        })
    }
}
