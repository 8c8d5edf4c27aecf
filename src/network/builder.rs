use std::path::Path;

use crate::data::batch::Batch;
use crate::error::{Result, ValidError};
use crate::network::model::Model;
use crate::valid::valid_config::ValidatorConfig;

/// Binds a set of options to the way a model is run and saved.
///
/// The builder does not own the model; each call borrows it.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    options: ValidatorConfig,
}

impl ModelBuilder {
    pub fn from_options(options: &ValidatorConfig) -> Self {
        ModelBuilder { options: options.clone() }
    }

    pub fn options(&self) -> &ValidatorConfig {
        &self.options
    }

    /// Runs one forward pass over `batch` and returns the flat score vector,
    /// `batch.size() × num_classes` values in sample order.
    pub fn build<M: Model + ?Sized>(&self, model: &mut M, batch: &Batch) -> Result<Vec<f64>> {
        let scores = model.forward(batch.inputs(), self.options.inference)?;
        if scores.rows != batch.size() {
            return Err(ValidError::Dimension {
                op: "build",
                left: (scores.rows, scores.cols),
                right: (batch.size(), scores.cols),
            });
        }
        Ok(scores.into_vec())
    }

    /// Saves `model` to `path`. With `include_metadata` the builder's options
    /// are embedded as JSON so the checkpoint records how it was produced.
    pub fn save<M: Model + ?Sized>(&self, model: &M, path: &Path, include_metadata: bool) -> Result<()> {
        let metadata = if include_metadata {
            Some(serde_json::to_string(&self.options)?)
        } else {
            None
        };
        model.save(path, metadata.as_deref())
    }
}
