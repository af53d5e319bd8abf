//! Configuration for the distance pipeline.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values, and
//! command-line flags take precedence over both.

use crate::distance::PairErrorPolicy;
use crate::error::{DistanceError, Result};
use crate::persistence::DEFAULT_RESULTS_FILENAME;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Qrels-style label file (section path, iteration, paragraph id, relevance).
    pub qrels_path: Option<PathBuf>,

    /// Directory of paragraph corpus shards.
    pub corpus_dir: Option<PathBuf>,

    /// Where distance results are written.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("data").join(DEFAULT_RESULTS_FILENAME)
}

fn default_progress_every() -> usize {
    1000
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            qrels_path: None,
            corpus_dir: None,
            output: default_output(),
        }
    }
}

/// Batch computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// What to do with a page when one of its pairs fails.
    #[serde(default)]
    pub on_pair_error: PairErrorPolicy,

    /// Log a progress event every this many pages (0 disables).
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            on_pair_error: PairErrorPolicy::default(),
            progress_every: default_progress_every(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data locations
    pub data: DataConfig,
    /// Batch settings
    pub batch: BatchConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    data: Option<DataFileSection>,
    batch: Option<BatchFileSection>,
}

#[derive(Debug, Deserialize)]
struct DataFileSection {
    qrels_path: Option<PathBuf>,
    corpus_dir: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct BatchFileSection {
    on_pair_error: Option<PairErrorPolicy>,
    progress_every: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (SECDIST_QRELS, SECDIST_CORPUS_DIR, SECDIST_OUTPUT, ...)
    /// 2. Config file (~/.config/section-distance/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(qrels) = env::var("SECDIST_QRELS") {
            self.data.qrels_path = Some(PathBuf::from(qrels));
        }

        if let Ok(corpus_dir) = env::var("SECDIST_CORPUS_DIR") {
            self.data.corpus_dir = Some(PathBuf::from(corpus_dir));
        }

        if let Ok(output) = env::var("SECDIST_OUTPUT") {
            self.data.output = PathBuf::from(output);
        }

        if let Ok(policy) = env::var("SECDIST_ON_PAIR_ERROR") {
            self.batch.on_pair_error = policy.parse()?;
        }

        if let Ok(every) = env::var("SECDIST_PROGRESS_EVERY") {
            self.batch.progress_every = every.trim().parse().map_err(|_| {
                DistanceError::Config(format!(
                    "SECDIST_PROGRESS_EVERY must be a page count, got '{}'",
                    every
                ))
            })?;
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DistanceError::io(path, e))?;
        Self::from_yaml(&content)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| DistanceError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(data) = file_config.data {
            if data.qrels_path.is_some() {
                config.data.qrels_path = data.qrels_path;
            }
            if data.corpus_dir.is_some() {
                config.data.corpus_dir = data.corpus_dir;
            }
            if let Some(output) = data.output {
                config.data.output = output;
            }
        }

        if let Some(batch) = file_config.batch {
            if let Some(policy) = batch.on_pair_error {
                config.batch.on_pair_error = policy;
            }
            if let Some(every) = batch.progress_every {
                config.batch.progress_every = every;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "section-distance")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// The qrels path, or an error explaining how to set it.
    pub fn require_qrels(&self) -> Result<&Path> {
        self.data.qrels_path.as_deref().ok_or_else(|| {
            DistanceError::Config(
                "Qrels path is required. Pass --qrels, set SECDIST_QRELS or add data.qrels_path to the config file.".to_string(),
            )
        })
    }

    /// The corpus directory, or an error explaining how to set it.
    pub fn require_corpus_dir(&self) -> Result<&Path> {
        self.data.corpus_dir.as_deref().ok_or_else(|| {
            DistanceError::Config(
                "Corpus directory is required. Pass --corpus-dir, set SECDIST_CORPUS_DIR or add data.corpus_dir to the config file.".to_string(),
            )
        })
    }

    /// Validate that configured inputs exist.
    pub fn validate(&self) -> Result<()> {
        let qrels = self.require_qrels()?;
        if !qrels.is_file() {
            return Err(DistanceError::Config(format!(
                "Qrels file '{}' does not exist",
                qrels.display()
            )));
        }

        if let Some(corpus_dir) = &self.data.corpus_dir {
            if !corpus_dir.is_dir() {
                return Err(DistanceError::InvalidCorpusPath(corpus_dir.clone()));
            }
        }

        if self.data.output.as_os_str().is_empty() {
            return Err(DistanceError::Config("Output path must not be empty".to_string()));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_qrels(qrels_path: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig {
                qrels_path: Some(qrels_path.into()),
                output: output.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.qrels_path.is_none());
        assert!(config.data.corpus_dir.is_none());
        assert_eq!(config.data.output, PathBuf::from("data/para_distances.json"));
        assert_eq!(config.batch.on_pair_error, PairErrorPolicy::Skip);
        assert_eq!(config.batch.progress_every, 1000);
    }

    #[test]
    fn test_validate_fails_without_qrels() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(DistanceError::Config(_))));
    }

    #[test]
    fn test_validate_checks_paths() {
        let qrels = NamedTempFile::new().unwrap();
        let dir = TempDir::new().unwrap();

        let mut config = Config::with_qrels(qrels.path(), dir.path().join("out.json"));
        assert!(config.validate().is_ok());

        config.data.corpus_dir = Some(dir.path().join("missing"));
        assert!(matches!(
            config.validate(),
            Err(DistanceError::InvalidCorpusPath(_))
        ));

        let config = Config::with_qrels("/nonexistent/train.qrels", "out.json");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "\
data:
  qrels_path: /data/train.pages.cbor-hierarchical.qrels
  output: out/distances.bin
batch:
  on_pair_error: abort
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(
            config.data.qrels_path,
            Some(PathBuf::from("/data/train.pages.cbor-hierarchical.qrels"))
        );
        assert!(config.data.corpus_dir.is_none());
        assert_eq!(config.data.output, PathBuf::from("out/distances.bin"));
        assert_eq!(config.batch.on_pair_error, PairErrorPolicy::Abort);
        assert_eq!(config.batch.progress_every, 1000);
    }

    #[test]
    fn test_from_yaml_rejects_bad_policy() {
        let yaml = "batch:\n  on_pair_error: ignore\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(DistanceError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "batch:\n  progress_every: 10\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.batch.progress_every, 10);
    }

    const ENV_VARS: [&str; 5] = [
        "SECDIST_QRELS",
        "SECDIST_CORPUS_DIR",
        "SECDIST_OUTPUT",
        "SECDIST_ON_PAIR_ERROR",
        "SECDIST_PROGRESS_EVERY",
    ];

    /// Tests in this module that touch `SECDIST_*` hold this lock.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: every test that reads or writes these variables holds ENV_LOCK.
        unsafe {
            for name in ENV_VARS {
                env::remove_var(name);
            }
            for (name, value) in vars {
                env::set_var(name, value);
            }
        }
        let result = f();
        unsafe {
            for name in ENV_VARS {
                env::remove_var(name);
            }
        }
        result
    }

    #[test]
    fn test_env_overrides_file_values() {
        let yaml = "\
data:
  qrels_path: /data/from-file.qrels
  output: out/from-file.json
batch:
  on_pair_error: skip
  progress_every: 10
";
        let config = with_env(
            &[
                ("SECDIST_QRELS", "/data/from-env.qrels"),
                ("SECDIST_CORPUS_DIR", "/data/corpus"),
                ("SECDIST_OUTPUT", "out/from-env.bin"),
                ("SECDIST_ON_PAIR_ERROR", "abort"),
                ("SECDIST_PROGRESS_EVERY", "250"),
            ],
            || {
                let mut config = Config::from_yaml(yaml).unwrap();
                config.apply_env().unwrap();
                config
            },
        );

        assert_eq!(config.data.qrels_path, Some(PathBuf::from("/data/from-env.qrels")));
        assert_eq!(config.data.corpus_dir, Some(PathBuf::from("/data/corpus")));
        assert_eq!(config.data.output, PathBuf::from("out/from-env.bin"));
        assert_eq!(config.batch.on_pair_error, PairErrorPolicy::Abort);
        assert_eq!(config.batch.progress_every, 250);
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let config = with_env(&[], || {
            let mut config = Config::from_yaml("batch:\n  progress_every: 10\n").unwrap();
            config.apply_env().unwrap();
            config
        });
        assert_eq!(config.batch.progress_every, 10);
        assert_eq!(config.batch.on_pair_error, PairErrorPolicy::Skip);
    }

    #[test]
    fn test_invalid_env_policy() {
        let result = with_env(&[("SECDIST_ON_PAIR_ERROR", "ignore")], || {
            Config::default().apply_env()
        });
        assert!(matches!(result, Err(DistanceError::Config(_))));
    }

    #[test]
    fn test_invalid_env_progress_every() {
        let result = with_env(&[("SECDIST_PROGRESS_EVERY", "often")], || {
            Config::default().apply_env()
        });
        assert!(matches!(result, Err(DistanceError::Config(_))));
    }

    #[test]
    fn test_require_helpers() {
        let config = Config::with_qrels("labels.qrels", "out.json");
        assert_eq!(config.require_qrels().unwrap(), Path::new("labels.qrels"));
        assert!(config.require_corpus_dir().is_err());
    }
}
