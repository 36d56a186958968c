pub mod memory;
pub mod provision;
pub mod traits;

pub use memory::*;
pub use provision::*;
pub use traits::*;
