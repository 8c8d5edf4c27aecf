pub mod batch;
pub mod dataset;
pub mod generator;

pub use batch::Batch;
pub use dataset::InMemoryDataset;
pub use generator::{BatchGenerator, BatchSource};
