use crate::data::generator::BatchSource;
use crate::error::{Result, ValidError};

/// One kind of validation metric, pluggable into a `ValidationRunner`.
///
/// `compute_metric` scores a full sweep of `batches`; the runner decides
/// whether the result improves on the best seen so far (in the direction
/// given by `lower_is_better`) and calls `save_best` when it does.
pub trait ValidatorStrategy<M: ?Sized> {
    /// Short name used in logs, config selection and checkpoint file names.
    fn type_tag(&self) -> &'static str;

    fn lower_is_better(&self) -> bool;

    /// Scores one full pass. The model is only read through inference-mode
    /// forward passes; any error aborts the pass.
    fn compute_metric(&self, model: &mut M, batches: &mut dyn BatchSource) -> Result<f64>;

    /// Writes the current model as this validator's best checkpoint.
    fn save_best(&self, model: &M) -> Result<()>;
}

impl<M: ?Sized, S: ValidatorStrategy<M> + ?Sized> ValidatorStrategy<M> for Box<S> {
    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }

    fn lower_is_better(&self) -> bool {
        (**self).lower_is_better()
    }

    fn compute_metric(&self, model: &mut M, batches: &mut dyn BatchSource) -> Result<f64> {
        (**self).compute_metric(model, batches)
    }

    fn save_best(&self, model: &M) -> Result<()> {
        (**self).save_best(model)
    }
}

/// Number of classes scored per sample, `scores / labels`.
///
/// Fails with `ShapeMismatch` unless every sample gets the same non-zero
/// number of scores. An empty batch yields `0`.
pub(crate) fn classes_per_sample(scores: usize, labels: usize) -> Result<usize> {
    if labels == 0 {
        return if scores == 0 {
            Ok(0)
        } else {
            Err(ValidError::ShapeMismatch { scores, labels })
        };
    }
    if scores == 0 || scores % labels != 0 {
        return Err(ValidError::ShapeMismatch { scores, labels });
    }
    Ok(scores / labels)
}
