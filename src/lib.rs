pub mod error;
pub mod math;
pub mod layers;
pub mod network;
pub mod loss;
pub mod metrics;
pub mod data;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use layers::{InitScheme, Layer, Linear, Relu};
pub use network::{NetworkSpec, Sequential};
pub use loss::cross_entropy::CrossEntropyLoss;
pub use metrics::accuracy::accuracy;
pub use data::idx::Dataset;
