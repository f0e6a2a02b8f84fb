pub mod init;
pub mod layer;
pub mod linear;
pub mod relu;

pub use init::InitScheme;
pub use layer::{Layer, Parameter, ParameterVisitor};
pub use linear::{Linear, LinearGrads};
pub use relu::Relu;
