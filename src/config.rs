//! Run configuration, read from the `data_frame_config.yaml` file.

use crate::error::{Error, Result};
use crate::schema::{Columns, Schema};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Ordered `{column: type}` layout of every source row
    #[serde(rename = "HEADER_DATI", alias = "columns")]
    pub columns: Columns,

    #[serde(default = "default_longitude_column")]
    pub longitude_column: String,

    #[serde(default = "default_latitude_column")]
    pub latitude_column: String,

    /// Field separator of the source files, a single ASCII character
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Lines per fragment
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Workers are `cpus / worker_divisor`, at least one
    #[serde(default = "default_worker_divisor")]
    pub worker_divisor: usize,

    /// Explicit worker count, takes precedence over `worker_divisor`
    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fail a run when any fragment fails instead of keeping the others
    #[serde(default)]
    pub strict: bool,
}

fn default_longitude_column() -> String {
    "Long".to_string()
}

fn default_latitude_column() -> String {
    "Lat".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_chunk_size() -> usize {
    1_000_000
}

fn default_worker_divisor() -> usize {
    4
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("splitted_input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output_data")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)
            .map_err(|e| Error::Config(format!("could not read {:?}: {}", path, e)))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.0.is_empty() {
            return Err(Error::Config("HEADER_DATI declares no columns".into()));
        }
        if !self.delimiter.is_ascii() {
            return Err(Error::Config(format!(
                "delimiter {:?} is not ascii",
                self.delimiter
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".into()));
        }
        if self.worker_divisor == 0 || self.workers == Some(0) {
            return Err(Error::Config("worker count must be positive".into()));
        }
        Ok(())
    }

    pub fn schema(&self) -> Result<Schema> {
        Schema::new(
            self.columns.0.clone(),
            &self.longitude_column,
            &self.latitude_column,
            self.delimiter as u8,
        )
        .map_err(Error::Config)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| (num_cpus::get() / self.worker_divisor).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "
HEADER_DATI:
  ID: str
  Lat: float64
  Long: float64
  Timestamp: datetime
";

    #[test]
    fn applies_defaults() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.columns.0.len(), 4);
        assert_eq!(config.chunk_size, 1_000_000);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.scratch_dir, PathBuf::from("splitted_input"));
        assert!(!config.strict);
        assert!(config.worker_count() >= 1);
        let schema = config.schema().unwrap();
        assert_eq!((schema.longitude, schema.latitude), (2, 1));
    }

    #[test]
    fn explicit_workers_win() {
        let yaml = format!("{}workers: 3\nchunk_size: 10\ndelimiter: ';'\n", YAML);
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.schema().unwrap().delimiter, b';');
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let yaml = format!("{}chunk_size: 0\n", YAML);
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_missing_coordinate_column() {
        let yaml = format!("{}longitude_column: Lon\n", YAML);
        let config = Config::from_yaml(&yaml).unwrap();
        assert!(config.schema().is_err());
    }
}
