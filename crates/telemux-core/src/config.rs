use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::channels::Channel;
use crate::error::ConfigError;

/// Batch settings. Every field has a default so a partial TOML file is enough.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of input logs, without the dot.
    pub extension: String,
    pub channels: Vec<Channel>,
    /// Number of input files processed at once by the concurrent driver.
    pub jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("out"),
            extension: "csv".to_string(),
            channels: Channel::ALL.to_vec(),
            jobs: 1,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validated()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks invariants and removes duplicate channels, keeping first occurrence order.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let extension = self.extension.trim().trim_start_matches('.').to_string();
        if extension.is_empty() || extension.contains(&['/', '\\', '*', '?', '[', ']'][..]) {
            return Err(ConfigError::Invalid(format!(
                "extension '{}' must be a plain file extension",
                self.extension
            )));
        }
        self.extension = extension;

        if self.jobs == 0 {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }

        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in self.channels {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        if channels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one channel must be selected".to_string(),
            ));
        }
        self.channels = channels;

        Ok(self)
    }
}
