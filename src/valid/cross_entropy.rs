use std::path::PathBuf;

use log::debug;

use crate::data::generator::BatchSource;
use crate::error::{Result, ValidError};
use crate::network::builder::ModelBuilder;
use crate::network::model::Model;
use crate::valid::strategy::{classes_per_sample, ValidatorStrategy};
use crate::valid::valid_config::ValidatorConfig;

pub const CROSS_ENTROPY_TAG: &str = "cross-entropy";

/// Small epsilon added inside ln() to keep a zero probability finite.
const EPS: f64 = 1e-12;

/// Mean per-sample cross-entropy against the label, `-ln(p[label] + eps)`.
/// Lower is better.
///
/// Scores are read as class probabilities, so the model should end in a
/// Softmax layer.
#[derive(Debug, Clone)]
pub struct CrossEntropyValidator {
    builder: ModelBuilder,
}

impl CrossEntropyValidator {
    pub fn new(options: &ValidatorConfig) -> Self {
        let mut options = options.clone();
        options.inference = true;
        CrossEntropyValidator { builder: ModelBuilder::from_options(&options) }
    }

    /// `<model>.best-cross-entropy.npz`
    pub fn checkpoint_path(&self) -> PathBuf {
        self.builder.options().best_checkpoint_path(CROSS_ENTROPY_TAG)
    }
}

impl<M: Model + ?Sized> ValidatorStrategy<M> for CrossEntropyValidator {
    fn type_tag(&self) -> &'static str {
        CROSS_ENTROPY_TAG
    }

    fn lower_is_better(&self) -> bool {
        true
    }

    fn compute_metric(&self, model: &mut M, batches: &mut dyn BatchSource) -> Result<f64> {
        let mut total = 0.0;
        let mut samples = 0usize;

        while let Some(batch) = batches.next_batch() {
            let scores = self.builder.build(model, &batch)?;
            let loss = sum_cross_entropy(&scores, batch.labels())?;
            debug!("cross-entropy batch: {:.6} over {} samples", loss, batch.size());

            total += loss;
            samples += batch.size();
        }

        if samples == 0 {
            return Err(ValidError::EmptyDataset);
        }
        Ok(total / samples as f64)
    }

    fn save_best(&self, model: &M) -> Result<()> {
        self.builder.save(model, &self.checkpoint_path(), true)
    }
}

/// Summed `-ln(p_i[label_i] + eps)` over the samples of one batch.
pub fn sum_cross_entropy(scores: &[f64], labels: &[usize]) -> Result<f64> {
    let num_classes = classes_per_sample(scores.len(), labels.len())?;
    if num_classes == 0 {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for (probs, &label) in scores.chunks_exact(num_classes).zip(labels) {
        if label >= num_classes {
            return Err(ValidError::LabelOutOfRange { label, num_classes });
        }
        total += -(probs[label] + EPS).ln();
    }
    Ok(total)
}
