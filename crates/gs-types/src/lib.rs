pub mod errors;
pub mod grid;

pub use errors::*;
pub use grid::*;
