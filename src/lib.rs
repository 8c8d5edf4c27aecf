pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod valid;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Model, ModelBuilder, Network};
pub use data::{Batch, BatchGenerator, BatchSource, InMemoryDataset};
pub use valid::{
    AccuracyValidator, CrossEntropyValidator, ValidationReport, ValidationRunner,
    ValidatorConfig, ValidatorStrategy,
};
pub use error::{Result, ValidError};
