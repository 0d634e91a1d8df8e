use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that relative output paths are resolved against
    pub dir: PathBuf,
    pub table: PathBuf,
    pub delimiter: String,
    pub aggregates: PathBuf,
    pub chart: PathBuf,
    pub chart_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub on_record_error: RecordErrorPolicy,
}

/// What to do when a derivation fails for a single appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordErrorPolicy {
    /// First failing record aborts the run
    #[default]
    Abort,
    /// Skip the failing derivation, log it and keep going
    Skip,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_INPUT_FILE),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            table: PathBuf::from(constants::DEFAULT_TABLE_FILE),
            delimiter: constants::DEFAULT_DELIMITER.to_string(),
            aggregates: PathBuf::from(constants::DEFAULT_AGGREGATES_FILE),
            chart: PathBuf::from(constants::DEFAULT_CHART_FILE),
            chart_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration. An explicitly requested file must exist; the
    /// default `config.toml` is optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(constants::CONFIG_ENV_VAR).ok().map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path),
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.output.delimiter_char()?;
        Ok(config)
    }
}

impl OutputConfig {
    /// The table separator as a single character.
    pub fn delimiter_char(&self) -> Result<char> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !matches!(c, '"' | '\r' | '\n') => Ok(c),
            _ => Err(PipelineError::Config(format!(
                "delimiter must be a single character other than a quote or line break, got {:?}",
                self.delimiter
            ))),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn table_path(&self) -> PathBuf {
        self.resolve(&self.table)
    }

    pub fn aggregates_path(&self) -> PathBuf {
        self.resolve(&self.aggregates)
    }

    pub fn chart_path(&self) -> Option<PathBuf> {
        self.chart_enabled.then(|| self.resolve(&self.chart))
    }
}
