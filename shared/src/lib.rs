//! TaskTrack Shared Library
//!
//! Wire types shared between the backend and its clients.

pub mod tasks;
pub mod types;

// Re-export commonly used items
pub use tasks::*;
pub use types::*;
