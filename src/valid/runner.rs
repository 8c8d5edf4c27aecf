use std::marker::PhantomData;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::data::generator::BatchSource;
use crate::error::Result;
use crate::valid::strategy::ValidatorStrategy;
use crate::valid::valid_config::ValidatorConfig;
use crate::valid::valid_stats::{ValidationReport, ValidatorState};

/// Drives a `ValidatorStrategy`: runs passes, keeps the best metric seen so
/// far, saves a checkpoint on improvement and counts stalled passes.
pub struct ValidationRunner<M: ?Sized, S> {
    strategy: S,
    keep_best: bool,
    early_stopping: usize,
    best: f64,
    stalled: usize,
    passes: usize,
    _model: PhantomData<fn(&mut M)>,
}

impl<M: ?Sized, S: ValidatorStrategy<M>> ValidationRunner<M, S> {
    /// Starts with the worst possible best: `+inf` when lower is better,
    /// `-inf` otherwise.
    pub fn new(strategy: S, config: &ValidatorConfig) -> Self {
        let best = initial_best(strategy.lower_is_better());
        ValidationRunner {
            strategy,
            keep_best: config.keep_best,
            early_stopping: config.early_stopping,
            best,
            stalled: 0,
            passes: 0,
            _model: PhantomData,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Best metric so far, or `None` before the first improving pass.
    pub fn best(&self) -> Option<f64> {
        self.best.is_finite().then_some(self.best)
    }

    pub fn stalled(&self) -> usize {
        self.stalled
    }

    /// True once `early_stopping` consecutive passes have not improved.
    pub fn should_stop(&self) -> bool {
        self.early_stopping > 0 && self.stalled >= self.early_stopping
    }

    /// Runs one full pass over `batches` (rewound first) and applies the
    /// best-tracking policy.
    ///
    /// On improvement the checkpoint is written before the best is recorded:
    /// if the save fails the error is returned and the best stays as it was,
    /// so the next pass can still recognise the improvement.
    pub fn validate(&mut self, model: &mut M, batches: &mut dyn BatchSource) -> Result<ValidationReport> {
        let t_start = Instant::now();
        let tag = self.strategy.type_tag();

        batches.reset();
        let metric = self.strategy.compute_metric(model, batches)?;
        self.passes += 1;

        let improved = self.is_improvement(metric);
        if improved {
            if self.keep_best {
                if let Err(e) = self.strategy.save_best(model) {
                    warn!("[valid] {} : could not save best checkpoint: {}", tag, e);
                    return Err(e);
                }
            }
            self.best = metric;
            self.stalled = 0;
        } else {
            self.stalled += 1;
        }

        if improved {
            info!("[valid] pass {} : {} : {:.6} : new best", self.passes, tag, metric);
        } else {
            info!(
                "[valid] pass {} : {} : {:.6} : stalled {} times (last best: {:.6})",
                self.passes, tag, metric, self.stalled, self.best
            );
        }

        Ok(ValidationReport {
            pass: self.passes,
            type_tag: tag.to_owned(),
            metric,
            best: self.best(),
            improved,
            stalled: self.stalled,
            elapsed_ms: millis(t_start.elapsed()),
        })
    }

    /// Strict comparison in the strategy's direction; a tie is not progress.
    fn is_improvement(&self, metric: f64) -> bool {
        if self.strategy.lower_is_better() {
            metric < self.best
        } else {
            metric > self.best
        }
    }

    pub fn state(&self) -> ValidatorState {
        ValidatorState {
            type_tag: self.strategy.type_tag().to_owned(),
            last_best: self.best(),
            stalled: self.stalled,
            passes: self.passes,
        }
    }

    /// Resumes from a saved state. States recorded for another validator
    /// type are ignored and reported as `false`.
    pub fn restore(&mut self, state: &ValidatorState) -> bool {
        if state.type_tag != self.strategy.type_tag() {
            warn!(
                "[valid] ignoring saved state for '{}' in '{}' validator",
                state.type_tag,
                self.strategy.type_tag()
            );
            return false;
        }
        self.best = state
            .last_best
            .unwrap_or_else(|| initial_best(self.strategy.lower_is_better()));
        self.stalled = state.stalled;
        self.passes = state.passes;
        true
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn initial_best(lower_is_better: bool) -> f64 {
    if lower_is_better {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use crate::data::batch::Batch;
    use crate::error::ValidError;
    use crate::math::matrix::Matrix;

    /// Replays a scripted metric per pass and records save attempts.
    struct Scripted {
        metrics: RefCell<VecDeque<f64>>,
        lower_is_better: bool,
        fail_saves: Cell<usize>,
        saves: Cell<usize>,
    }

    impl Scripted {
        fn new(metrics: &[f64], lower_is_better: bool) -> Self {
            Scripted {
                metrics: RefCell::new(metrics.iter().cloned().collect()),
                lower_is_better,
                fail_saves: Cell::new(0),
                saves: Cell::new(0),
            }
        }
    }

    impl ValidatorStrategy<()> for Scripted {
        fn type_tag(&self) -> &'static str {
            "scripted"
        }

        fn lower_is_better(&self) -> bool {
            self.lower_is_better
        }

        fn compute_metric(&self, _model: &mut (), batches: &mut dyn BatchSource) -> Result<f64> {
            while batches.next_batch().is_some() {}
            Ok(self.metrics.borrow_mut().pop_front().expect("script exhausted"))
        }

        fn save_best(&self, _model: &()) -> Result<()> {
            if self.fail_saves.get() > 0 {
                self.fail_saves.set(self.fail_saves.get() - 1);
                return Err(ValidError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    /// One single-sample batch per sweep; counts rewinds.
    #[derive(Default)]
    struct OneBatch {
        served: bool,
        resets: usize,
    }

    impl BatchSource for OneBatch {
        fn next_batch(&mut self) -> Option<Batch> {
            if self.served {
                return None;
            }
            self.served = true;
            Batch::new(Matrix::zeros(1, 1), vec![0]).ok()
        }

        fn reset(&mut self) {
            self.served = false;
            self.resets += 1;
        }
    }

    fn config(early_stopping: usize) -> ValidatorConfig {
        let mut config = ValidatorConfig::new("model");
        config.early_stopping = early_stopping;
        config
    }

    #[test]
    fn best_starts_at_the_worst_sentinel() {
        let higher = ValidationRunner::<(), _>::new(Scripted::new(&[], false), &config(0));
        let lower = ValidationRunner::<(), _>::new(Scripted::new(&[], true), &config(0));

        assert_eq!(higher.best, f64::NEG_INFINITY);
        assert_eq!(lower.best, f64::INFINITY);
        assert_eq!(higher.best(), None);
    }

    #[test]
    fn improvement_triggers_a_save_and_regression_does_not() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.80, 0.82, 0.78], false), &config(0));
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        let up = runner.validate(&mut (), &mut source).unwrap();
        assert!(up.improved);
        assert_eq!(runner.strategy().saves.get(), 2);

        let down = runner.validate(&mut (), &mut source).unwrap();
        assert!(!down.improved);
        assert_eq!(down.stalled, 1);
        assert_eq!(down.best, Some(0.82));
        assert_eq!(runner.strategy().saves.get(), 2);
    }

    #[test]
    fn equal_metric_counts_as_stalled() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.5, 0.5], false), &config(0));
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        let tie = runner.validate(&mut (), &mut source).unwrap();

        assert!(!tie.improved);
        assert_eq!(runner.stalled(), 1);
        assert_eq!(runner.strategy().saves.get(), 1);
    }

    #[test]
    fn lower_is_better_flips_the_comparison() {
        let mut runner = ValidationRunner::new(Scripted::new(&[2.0, 1.5, 1.7], true), &config(0));
        let mut source = OneBatch::default();

        let reports: Vec<_> = (0..3)
            .map(|_| runner.validate(&mut (), &mut source).unwrap().improved)
            .collect();

        assert_eq!(reports, vec![true, true, false]);
        assert_eq!(runner.best(), Some(1.5));
    }

    #[test]
    fn failed_save_keeps_the_old_best_and_retries_next_pass() {
        let strategy = Scripted::new(&[0.6, 0.7, 0.7], false);
        let mut runner = ValidationRunner::new(strategy, &config(0));
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        runner.strategy().fail_saves.set(1);

        assert!(runner.validate(&mut (), &mut source).is_err());
        assert_eq!(runner.best(), Some(0.6));
        assert_eq!(runner.stalled(), 0);

        let retry = runner.validate(&mut (), &mut source).unwrap();
        assert!(retry.improved);
        assert_eq!(runner.best(), Some(0.7));
    }

    #[test]
    fn keep_best_disabled_tracks_without_saving() {
        let mut config = config(0);
        config.keep_best = false;
        let mut runner = ValidationRunner::new(Scripted::new(&[0.3, 0.4], false), &config);
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        runner.validate(&mut (), &mut source).unwrap();

        assert_eq!(runner.best(), Some(0.4));
        assert_eq!(runner.strategy().saves.get(), 0);
    }

    #[test]
    fn should_stop_after_patience_is_exhausted() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.9, 0.8, 0.85, 0.95, 0.1], false), &config(2));
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        runner.validate(&mut (), &mut source).unwrap();
        assert!(!runner.should_stop());
        runner.validate(&mut (), &mut source).unwrap();
        assert!(runner.should_stop());

        runner.validate(&mut (), &mut source).unwrap();
        assert!(!runner.should_stop());
    }

    #[test]
    fn zero_patience_never_stops() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.5, 0.4, 0.3], false), &config(0));
        let mut source = OneBatch::default();
        for _ in 0..3 {
            runner.validate(&mut (), &mut source).unwrap();
        }
        assert_eq!(runner.stalled(), 2);
        assert!(!runner.should_stop());
    }

    #[test]
    fn each_pass_rewinds_the_batch_source() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.1, 0.2], false), &config(0));
        let mut source = OneBatch::default();

        runner.validate(&mut (), &mut source).unwrap();
        runner.validate(&mut (), &mut source).unwrap();

        assert_eq!(source.resets, 2);
    }

    #[test]
    fn state_restores_into_a_fresh_runner() {
        let mut runner = ValidationRunner::new(Scripted::new(&[0.7, 0.6], false), &config(0));
        let mut source = OneBatch::default();
        runner.validate(&mut (), &mut source).unwrap();
        runner.validate(&mut (), &mut source).unwrap();

        let saved = serde_json::to_string(&runner.state()).unwrap();
        let state: ValidatorState = serde_json::from_str(&saved).unwrap();

        let mut resumed = ValidationRunner::new(Scripted::new(&[0.65], false), &config(0));
        assert!(resumed.restore(&state));
        let report = resumed.validate(&mut (), &mut source).unwrap();

        assert!(!report.improved);
        assert_eq!(report.pass, 3);
        assert_eq!(report.stalled, 2);
    }

    #[test]
    fn restore_ignores_state_of_another_validator() {
        let mut runner = ValidationRunner::<(), _>::new(Scripted::new(&[], false), &config(0));
        let foreign = ValidatorState {
            type_tag: "accuracy".into(),
            last_best: Some(0.99),
            stalled: 4,
            passes: 9,
        };

        assert!(!runner.restore(&foreign));
        assert_eq!(runner.best(), None);
    }

    #[test]
    fn elapsed_time_saturates_instead_of_wrapping() {
        assert_eq!(millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(millis(Duration::from_secs(u64::MAX)), u64::MAX);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
