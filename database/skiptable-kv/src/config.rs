//! Memtable configuration.

use std::path::{Path, PathBuf};

use crate::{error::ConfigError, level::LevelGenerator};

pub const DEFAULT_MAX_LEVEL: usize = 16;
pub const DEFAULT_SNAPSHOT_PATH: &str = "store/dumpFile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Ceiling for entry levels. Must be at least 1.
    pub max_level: usize,
    /// Where `dump` writes and `load` reads by default.
    pub snapshot_path: PathBuf,
    /// Fixed seed for level assignment; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_level: DEFAULT_MAX_LEVEL,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            seed: None,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn max_level(mut self, max_level: usize) -> Config {
        self.max_level = max_level;
        self
    }

    pub fn snapshot_path(mut self, path: impl AsRef<Path>) -> Config {
        self.snapshot_path = path.as_ref().to_path_buf();
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Config {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_level == 0 {
            return Err(ConfigError::MaxLevel(self.max_level));
        }
        Ok(())
    }

    pub(crate) fn level_generator(&self) -> Result<LevelGenerator, ConfigError> {
        self.validate()?;
        Ok(match self.seed {
            Some(seed) => LevelGenerator::with_seed(self.max_level, seed),
            None => LevelGenerator::new(self.max_level),
        })
    }
}
