pub mod builder;
pub mod metadata;
pub mod model;
pub mod network;
pub mod npz;
pub mod spec;

pub use builder::ModelBuilder;
pub use metadata::ModelMetadata;
pub use model::Model;
pub use network::Network;
pub use spec::{LayerSpec, NetworkSpec};
