use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options shared by the validators of one training run.
///
/// # Fields
/// - `model`          — base path of the model; best checkpoints are written
///                      next to it as `<model>.best-<metric>.npz`
/// - `inference`      — run the model in inference mode; validators always
///                      force this on for their own copy
/// - `keep_best`      — write a checkpoint whenever a metric improves
/// - `early_stopping` — stop once this many consecutive passes fail to
///                      improve the metric; `0` disables the check
/// - `valid_metrics`  — which validators to build, by type tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub model: PathBuf,
    #[serde(default)]
    pub inference: bool,
    #[serde(default = "default_keep_best")]
    pub keep_best: bool,
    #[serde(default = "default_early_stopping")]
    pub early_stopping: usize,
    #[serde(default = "default_valid_metrics")]
    pub valid_metrics: Vec<String>,
}

fn default_keep_best() -> bool {
    true
}

fn default_early_stopping() -> usize {
    10
}

fn default_valid_metrics() -> Vec<String> {
    vec!["accuracy".to_owned()]
}

impl ValidatorConfig {
    /// Creates a config with defaults for everything but the model path.
    pub fn new(model: impl Into<PathBuf>) -> Self {
        ValidatorConfig {
            model: model.into(),
            inference: false,
            keep_best: default_keep_best(),
            early_stopping: default_early_stopping(),
            valid_metrics: default_valid_metrics(),
        }
    }

    /// `<model>.best-<tag>.npz`, alongside the model file.
    pub fn best_checkpoint_path(&self, tag: &str) -> PathBuf {
        let mut name = self.model.clone().into_os_string();
        name.push(format!(".best-{}.npz", tag));
        PathBuf::from(name)
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a config from a JSON file; missing keys take their defaults.
    pub fn load_json(path: &Path) -> Result<ValidatorConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
