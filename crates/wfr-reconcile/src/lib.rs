pub mod config;
pub mod dependencies;
pub mod error;
pub mod ops;
pub mod poller;
pub mod race;
pub mod reconciler;
pub mod scenario;
pub mod session;
pub mod walker;

pub use config::*;
pub use dependencies::*;
pub use error::*;
pub use ops::*;
pub use poller::*;
pub use race::*;
pub use reconciler::*;
pub use session::*;
pub use walker::*;
