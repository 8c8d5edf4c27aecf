use std::path::Path;

use crate::error::Result;
use crate::math::matrix::Matrix;

/// The forward-computation engine a validator drives.
///
/// The validator borrows the model mutably for one pass at a time, so two
/// passes can never run against the same model concurrently.
pub trait Model {
    /// Runs one forward pass over a batch (one sample per row) and returns the
    /// per-class scores, one row per sample. In inference mode the model must
    /// not keep any state for a later backward pass.
    fn forward(&mut self, inputs: &Matrix, inference: bool) -> Result<Matrix>;

    /// Persists the parameters to `path`, replacing any existing file.
    /// `metadata`, when present, is a JSON document stored with them.
    fn save(&self, path: &Path, metadata: Option<&str>) -> Result<()>;
}
