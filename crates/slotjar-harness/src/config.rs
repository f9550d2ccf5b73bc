use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slotjar_store::FsSlotStore;

use crate::error::{HarnessError, HarnessResult};

/// Name of the data directory placed next to the executable.
pub const DATA_DIR_NAME: &str = "data";

/// Configuration for a harness run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Data directory. `None` means `data/` beside the running executable.
    pub data_dir: Option<PathBuf>,
    /// Create the data directory when missing instead of failing.
    pub create_data_dir: bool,
    /// Compare each reloaded value with the value that was written.
    pub verify: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            create_data_dir: false,
            verify: true,
        }
    }
}

impl HarnessConfig {
    /// Load a TOML config file. A relative `data_dir` is taken relative to
    /// the directory holding the file.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        if let Some(base) = path.parent() {
            config.data_dir = config
                .data_dir
                .take()
                .map(|dir| if dir.is_relative() { base.join(dir) } else { dir });
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The data directory this run will use.
    pub fn resolve_data_dir(&self) -> HarnessResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe()
            .map_err(|e| HarnessError::Config(format!("cannot locate executable: {e}")))?;
        let parent = exe
            .parent()
            .ok_or_else(|| HarnessError::Config("executable has no parent directory".into()))?;
        Ok(parent.join(DATA_DIR_NAME))
    }

    /// Open the filesystem store for the resolved data directory.
    pub fn open_store(&self) -> HarnessResult<FsSlotStore> {
        let dir = self.resolve_data_dir()?;
        let store = if self.create_data_dir {
            FsSlotStore::create(&dir)?
        } else {
            FsSlotStore::open(&dir)?
        };
        Ok(store)
    }
}
