use std::path::PathBuf;

use log::debug;

use crate::data::generator::BatchSource;
use crate::error::{Result, ValidError};
use crate::network::builder::ModelBuilder;
use crate::network::model::Model;
use crate::valid::strategy::{classes_per_sample, ValidatorStrategy};
use crate::valid::valid_config::ValidatorConfig;

pub const ACCURACY_TAG: &str = "accuracy";

/// Classification accuracy over the validation set: the fraction of samples
/// whose highest-scoring class equals the label. Higher is better.
#[derive(Debug, Clone)]
pub struct AccuracyValidator {
    builder: ModelBuilder,
}

impl AccuracyValidator {
    /// Builds the validator's own model builder from `options` with the
    /// inference flag forced on.
    pub fn new(options: &ValidatorConfig) -> Self {
        let mut options = options.clone();
        options.inference = true;
        AccuracyValidator { builder: ModelBuilder::from_options(&options) }
    }

    /// `<model>.best-accuracy.npz`
    pub fn checkpoint_path(&self) -> PathBuf {
        self.builder.options().best_checkpoint_path(ACCURACY_TAG)
    }
}

impl<M: Model + ?Sized> ValidatorStrategy<M> for AccuracyValidator {
    fn type_tag(&self) -> &'static str {
        ACCURACY_TAG
    }

    fn lower_is_better(&self) -> bool {
        false
    }

    fn compute_metric(&self, model: &mut M, batches: &mut dyn BatchSource) -> Result<f64> {
        let mut correct = 0usize;
        let mut samples = 0usize;

        while let Some(batch) = batches.next_batch() {
            let scores = self.builder.build(model, &batch)?;
            let hits = count_correct(&scores, batch.labels())?;
            debug!("accuracy batch: {}/{} correct", hits, batch.size());

            correct += hits;
            samples += batch.size();
        }

        if samples == 0 {
            return Err(ValidError::EmptyDataset);
        }
        Ok(correct as f64 / samples as f64)
    }

    fn save_best(&self, model: &M) -> Result<()> {
        self.builder.save(model, &self.checkpoint_path(), true)
    }
}

/// Index of the first maximum in `scores`. A NaN never displaces the current
/// maximum. Returns `0` for an empty slice.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in scores.iter().enumerate().skip(1) {
        if v > scores[best] {
            best = i;
        }
    }
    best
}

/// Counts the samples whose argmax over their slice of `scores` equals their
/// label. `scores` holds `labels.len() × num_classes` values in sample order.
/// A label outside `0..num_classes` can never match.
pub fn count_correct(scores: &[f64], labels: &[usize]) -> Result<usize> {
    let num_classes = classes_per_sample(scores.len(), labels.len())?;
    if num_classes == 0 {
        return Ok(0);
    }

    Ok(scores
        .chunks_exact(num_classes)
        .zip(labels)
        .filter(|&(sample, &label)| argmax(sample) == label)
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_breaks_ties_to_the_left() {
        assert_eq!(argmax(&[0.5, 0.5, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[0.2, f64::NAN, 0.9]), 2);
        assert_eq!(argmax(&[f64::NAN, 0.3]), 0);
    }

    #[test]
    fn all_predictions_correct() {
        let scores = [0.1, 0.8, 0.1, 0.9, 0.05, 0.05];
        assert_eq!(count_correct(&scores, &[1, 0]).unwrap(), 2);
    }

    #[test]
    fn one_of_two_correct() {
        let scores = [0.1, 0.8, 0.1, 0.9, 0.05, 0.05];
        assert_eq!(count_correct(&scores, &[1, 2]).unwrap(), 1);
    }

    #[test]
    fn count_is_bounded_by_label_count() {
        let scores: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        for labels in [vec![0, 1, 2, 3], vec![9, 9, 9, 9], vec![4, 0, 8, 2]] {
            let n = count_correct(&scores, &labels).unwrap();
            assert!(n <= labels.len());
        }
    }

    #[test]
    fn uneven_scores_are_a_shape_mismatch() {
        let err = count_correct(&[0.1, 0.2, 0.3, 0.4, 0.5], &[0, 1]).unwrap_err();
        assert!(matches!(err, ValidError::ShapeMismatch { scores: 5, labels: 2 }));
    }

    #[test]
    fn scores_without_labels_are_a_shape_mismatch() {
        assert!(count_correct(&[0.1, 0.9], &[]).is_err());
        assert_eq!(count_correct(&[], &[]).unwrap(), 0);
    }

    #[test]
    fn out_of_range_label_never_matches() {
        assert_eq!(count_correct(&[0.1, 0.9], &[7]).unwrap(), 0);
    }

    #[test]
    fn checkpoint_path_carries_the_type_tag() {
        let validator = AccuracyValidator::new(&ValidatorConfig::new("runs/mnist"));
        assert_eq!(validator.checkpoint_path(), PathBuf::from("runs/mnist.best-accuracy.npz"));
    }
}
