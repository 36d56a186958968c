pub mod budget;
pub mod deps;
pub mod error;
pub mod ids;
pub mod idset;
pub mod model;
pub mod ops;
pub mod snapshot;
pub mod timefmt;
pub mod types;

pub use budget::PollBudget;
pub use deps::*;
pub use error::*;
pub use ids::*;
pub use idset::*;
pub use model::*;
pub use ops::*;
pub use snapshot::*;
pub use timefmt::*;
pub use types::*;
