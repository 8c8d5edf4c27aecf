use serde::{Deserialize, Serialize};

/// Outcome of one validation pass, returned by `ValidationRunner::validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// 1-based count of completed passes for this validator.
    pub pass: usize,
    pub type_tag: String,
    pub metric: f64,
    /// Best metric after this pass; `None` until a pass has improved.
    pub best: Option<f64>,
    /// Whether this pass strictly improved on the previous best.
    pub improved: bool,
    /// Consecutive passes without improvement, including this one.
    pub stalled: usize,
    /// Wall-clock duration of the pass in milliseconds.
    pub elapsed_ms: u64,
}

/// Best-tracking state of one validator, kept with a training checkpoint so
/// that a resumed run keeps comparing against the same best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorState {
    pub type_tag: String,
    pub last_best: Option<f64>,
    pub stalled: usize,
    pub passes: usize,
}
