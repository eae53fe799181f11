pub mod incident;
pub mod pod;

pub use incident::*;
pub use pod::*;
