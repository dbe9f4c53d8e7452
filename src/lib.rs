//! Courier Library
//!
//! Resumable, manifest-driven file courier: enumerates an
//! intermittently-connected device volume into a durable manifest,
//! reconciles it against the local destination, and transfers the
//! remainder across as many mount sessions as it takes.

pub mod config;
pub mod device;
pub mod manifest;
pub mod phase;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::CourierError;
pub type Result<T> = std::result::Result<T, CourierError>;
