pub mod accuracy;
pub mod cross_entropy;
pub mod registry;
pub mod runner;
pub mod strategy;
pub mod valid_config;
pub mod valid_stats;

pub use accuracy::{argmax, count_correct, AccuracyValidator};
pub use cross_entropy::CrossEntropyValidator;
pub use registry::{runners_from_config, validators_from_config};
pub use runner::ValidationRunner;
pub use strategy::ValidatorStrategy;
pub use valid_config::ValidatorConfig;
pub use valid_stats::{ValidationReport, ValidatorState};
