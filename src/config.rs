use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TutorError;

/// Length caps for the heuristic block extraction. These are tuning knobs,
/// not part of the response format.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HeuristicLimits {
    pub correction_excerpt_chars: usize,
    pub section_excerpt_chars: usize,
}

impl Default for HeuristicLimits {
    fn default() -> Self {
        Self {
            correction_excerpt_chars: 300,
            section_excerpt_chars: 500,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sessions_dir: PathBuf,
    pub heuristics: HeuristicLimits,
    pub provider: ProviderDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions_dir: PathBuf::from("sessions"),
            heuristics: HeuristicLimits::default(),
            provider: ProviderDefaults::default(),
        }
    }
}

impl Config {
    /// Like [`load_config_from_file`], but a missing file yields the defaults.
    pub fn load_or_default(file_path: &Path) -> Result<Config, TutorError> {
        if !file_path.exists() {
            tracing::debug!("No config at {}, using defaults", file_path.display());
            return Ok(Config::default());
        }
        load_config_from_file(file_path)
    }

    fn validate(&self, file_path: &Path) -> Result<(), TutorError> {
        if self.heuristics.correction_excerpt_chars == 0 || self.heuristics.section_excerpt_chars == 0 {
            return Err(TutorError::Config(format!(
                "heuristics excerpt lengths in {} must be greater than zero",
                file_path.display()
            )));
        }
        if !(0.0..=1.0).contains(&self.provider.temperature) {
            return Err(TutorError::Config(format!(
                "provider.temperature in {} must be between 0 and 1, got {}",
                file_path.display(),
                self.provider.temperature
            )));
        }
        if self.sessions_dir.exists() && !self.sessions_dir.is_dir() {
            return Err(TutorError::Config(format!(
                "sessions_dir specified in {} ('{}') is not a directory",
                file_path.display(),
                self.sessions_dir.display()
            )));
        }
        Ok(())
    }
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config, TutorError> {
    let contents = fs::read_to_string(file_path).map_err(|e| TutorError::io(file_path, e))?;
    let config: Config = toml::from_str(&contents)?;
    config.validate(file_path)?;
    Ok(config)
}
