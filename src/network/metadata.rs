use serde::{Deserialize, Serialize};

/// Optional annotations stored alongside a network's architecture.
/// All fields are optional so older checkpoints without them still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class labels for the output layer (e.g. ["0","1",...,"9"]).
    pub output_labels: Option<Vec<String>>,
}
